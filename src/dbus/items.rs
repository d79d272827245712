use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use zbus::Connection;
use zbus::object_server::SignalEmitter;
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

use super::shared::{DbusSharedState, lock};
use super::util::format_text_value;
use crate::logging::get_logger;

/// VeDbus-style BusItem implementing com.victronenergy.BusItem
pub struct BusItem {
    pub(crate) path: String,
    pub(crate) shared: Arc<Mutex<DbusSharedState>>,
}

impl BusItem {
    pub fn new(path: String, shared: Arc<Mutex<DbusSharedState>>) -> Self {
        Self { path, shared }
    }

    /// Venus encodes "no value" as an empty array
    pub(crate) fn invalid_value() -> OwnedValue {
        OwnedValue::try_from(Value::from(Vec::<i32>::new()))
            .unwrap_or_else(|_| OwnedValue::from(0i64))
    }

    pub(crate) fn serde_to_owned_value(v: &serde_json::Value) -> OwnedValue {
        match v {
            serde_json::Value::Null => Self::invalid_value(),
            serde_json::Value::Bool(b) => OwnedValue::from(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    OwnedValue::from(i)
                } else if let Some(u) = n.as_u64() {
                    OwnedValue::from(u)
                } else {
                    OwnedValue::from(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => OwnedValue::try_from(Value::from(s.as_str()))
                .unwrap_or_else(|_| Self::invalid_value()),
            _ => Self::invalid_value(),
        }
    }

    pub(crate) fn owned_value_to_serde(v: &OwnedValue) -> serde_json::Value {
        if let Value::Array(a) = &**v
            && a.is_empty()
        {
            return serde_json::Value::Null;
        }
        if let Ok(b) = <bool as TryFrom<&OwnedValue>>::try_from(v) {
            return serde_json::json!(b);
        }
        if let Ok(i) = <i32 as TryFrom<&OwnedValue>>::try_from(v) {
            return serde_json::json!(i);
        }
        if let Ok(i) = <i64 as TryFrom<&OwnedValue>>::try_from(v) {
            return serde_json::json!(i);
        }
        if let Ok(u) = <u64 as TryFrom<&OwnedValue>>::try_from(v) {
            return serde_json::json!(u);
        }
        if let Ok(f) = <f64 as TryFrom<&OwnedValue>>::try_from(v) {
            return serde_json::json!(f);
        }
        if let Ok(s) = <&str as TryFrom<&OwnedValue>>::try_from(v) {
            return serde_json::json!(s.to_string());
        }
        serde_json::json!(v.to_string())
    }

    /// `{"Value": .., "Text": ..}` as carried by PropertiesChanged and ItemsChanged
    pub(crate) fn change_entry(
        path: &str,
        value: &serde_json::Value,
    ) -> HashMap<&'static str, OwnedValue> {
        let mut entry: HashMap<&'static str, OwnedValue> = HashMap::new();
        entry.insert("Value", Self::serde_to_owned_value(value));
        let text = format_text_value(path, value);
        if let Ok(text_ov) = OwnedValue::try_from(Value::from(text.as_str())) {
            entry.insert("Text", text_ov);
        }
        entry
    }
}

/// Announce a changed value on the item itself and on the root
pub(crate) async fn emit_value_changed(
    conn: &Connection,
    root_path: &OwnedObjectPath,
    path: &str,
    value: &serde_json::Value,
) -> zbus::Result<()> {
    let obj_path = OwnedObjectPath::try_from(path)?;
    let item_ctx = SignalEmitter::new(conn, obj_path)?;
    BusItem::properties_changed(&item_ctx, BusItem::change_entry(path, value)).await?;

    let root_ctx = SignalEmitter::new(conn, root_path.clone())?;
    let mut outer: HashMap<&str, HashMap<&str, OwnedValue>> = HashMap::new();
    outer.insert(path, BusItem::change_entry(path, value));
    super::root::RootBus::items_changed(&root_ctx, outer).await
}

#[zbus::interface(name = "com.victronenergy.BusItem")]
impl BusItem {
    #[zbus(name = "GetValue")]
    async fn get_value(&self) -> OwnedValue {
        let val = lock(&self.shared)
            .paths
            .get(&self.path)
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        Self::serde_to_owned_value(&val)
    }

    #[zbus(name = "SetValue")]
    async fn set_value(&self, value: OwnedValue) -> i32 {
        let (conn_opt, root_path, new_value) = {
            let mut shared = lock(&self.shared);
            if !shared.writable.contains(&self.path) {
                return 1;
            }
            let new_value = Self::owned_value_to_serde(&value);
            shared.paths.insert(self.path.clone(), new_value.clone());
            (shared.connection.clone(), shared.root_path.clone(), new_value)
        };

        get_logger("dbus").info(&format!(
            "someone else updated {} to {}",
            self.path, new_value
        ));

        if let Some(conn) = conn_opt {
            let _ = emit_value_changed(&conn, &root_path, &self.path, &new_value).await;
        }
        0
    }

    #[zbus(name = "GetText")]
    async fn get_text(&self) -> String {
        let val = lock(&self.shared)
            .paths
            .get(&self.path)
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        format_text_value(&self.path, &val)
    }

    #[zbus(signal)]
    pub async fn properties_changed(
        ctxt: &SignalEmitter<'_>,
        changes: HashMap<&str, OwnedValue>,
    ) -> zbus::Result<()>;
}
