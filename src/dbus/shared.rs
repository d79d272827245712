use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use zbus::Connection;
use zbus::zvariant::OwnedObjectPath;

/// Value cache shared between the poll loop and the bus handlers
///
/// `serde_json::Value::Null` is the Venus "invalid" value.
pub struct DbusSharedState {
    pub(crate) paths: HashMap<String, serde_json::Value>,
    pub(crate) writable: HashSet<String>,
    pub(crate) connection: Option<Connection>,
    pub(crate) root_path: OwnedObjectPath,
}

impl DbusSharedState {
    pub fn new(root_path: OwnedObjectPath) -> Self {
        Self {
            paths: HashMap::new(),
            writable: HashSet::new(),
            connection: None,
            root_path,
        }
    }
}

/// Lock the cache; a panic while holding it leaves plain data behind, so keep going
pub(crate) fn lock(shared: &Mutex<DbusSharedState>) -> MutexGuard<'_, DbusSharedState> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
