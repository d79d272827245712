use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use zbus::zvariant::OwnedObjectPath;
use zbus::{Connection, Result as ZbusResult, names::WellKnownName};

use crate::config::Config;
use crate::error::{Result, ShellyPvError};
use crate::logging::{LogContext, get_logger_with_context};
use crate::shelly::DeviceIdentity;

use super::Publisher;
use super::items::{BusItem, emit_value_changed};
use super::paths;
use super::root::{RootBus, TreeNode};
use super::shared::{DbusSharedState, lock};

/// Read access to the values a [`DbusService`] publishes
#[derive(Clone)]
pub struct ServiceView {
    shared: Arc<Mutex<DbusSharedState>>,
}

impl ServiceView {
    pub fn value(&self, path: &str) -> Option<serde_json::Value> {
        lock(&self.shared).paths.get(path).cloned()
    }
}

/// The pvinverter service: value cache plus, once started, its bus objects
pub struct DbusService {
    logger: crate::logging::StructuredLogger,
    service_name: String,
    connection: Option<Connection>,
    pub(crate) shared: Arc<Mutex<DbusSharedState>>,
    registered_paths: HashSet<String>,
    root_path: OwnedObjectPath,
}

impl DbusService {
    /// Create the service; nothing touches the bus until [`DbusService::start`]
    pub fn new(config: &Config) -> Result<Self> {
        let logger =
            get_logger_with_context(LogContext::new("dbus").with_device_instance(config.device_instance));
        let root_path = OwnedObjectPath::try_from("/")
            .map_err(|e| ShellyPvError::dbus(format!("Invalid object path: {}", e)))?;
        Ok(Self {
            logger,
            service_name: config.service_name(),
            connection: None,
            shared: Arc::new(Mutex::new(DbusSharedState::new(root_path.clone()))),
            registered_paths: HashSet::new(),
            root_path,
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Whether the service is attached to a bus
    pub fn is_attached(&self) -> bool {
        self.connection.is_some()
    }

    /// Current cached value of a path
    pub fn value(&self, path: &str) -> Option<serde_json::Value> {
        lock(&self.shared).paths.get(path).cloned()
    }

    /// Read-only handle on the value cache that outlives moving the service
    pub fn view(&self) -> ServiceView {
        ServiceView {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Connect (system bus, then session bus), claim the name and export every known path
    pub async fn start(&mut self) -> Result<()> {
        let connection = match Connection::system().await {
            Ok(c) => {
                self.logger.info("Connected to D-Bus: system bus");
                c
            }
            Err(e_sys) => match Connection::session().await {
                Ok(c) => {
                    self.logger.warn(&format!(
                        "System bus unavailable ({}); using session bus",
                        e_sys
                    ));
                    c
                }
                Err(e_sess) => {
                    return Err(ShellyPvError::dbus(format!(
                        "DBus connect failed: system={} session={}",
                        e_sys, e_sess
                    )));
                }
            },
        };

        let root = RootBus {
            shared: Arc::clone(&self.shared),
        };
        connection
            .object_server()
            .at(&self.root_path, root)
            .await
            .map_err(|e| ShellyPvError::dbus(format!("Register root BusItem failed: {}", e)))?;

        self.connection = Some(connection.clone());
        lock(&self.shared).connection = Some(connection.clone());

        // Paths cached while detached get their objects now
        let known: Vec<String> = lock(&self.shared).paths.keys().cloned().collect();
        for path in known {
            self.register_objects(&path).await?;
        }

        self.request_name(&connection)
            .await
            .map_err(|e| ShellyPvError::dbus(format!("RequestName failed: {}", e)))?;
        self.logger
            .info(&format!("D-Bus service started: {}", self.service_name));
        Ok(())
    }

    /// Export the object for `path` and any missing parent nodes
    async fn register_objects(&mut self, path: &str) -> Result<()> {
        let Some(conn) = self.connection.clone() else {
            return Ok(());
        };
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        for i in 1..=segments.len() {
            let subpath = format!("/{}", segments[..i].join("/"));
            if self.registered_paths.contains(&subpath) {
                continue;
            }
            let obj_path = OwnedObjectPath::try_from(subpath.as_str()).map_err(|e| {
                ShellyPvError::dbus(format!("Invalid object path '{}': {}", subpath, e))
            })?;
            if i == segments.len() {
                let item = BusItem::new(subpath.clone(), Arc::clone(&self.shared));
                conn.object_server().at(&obj_path, item).await.map_err(|e| {
                    ShellyPvError::dbus(format!("Register BusItem failed for {}: {}", subpath, e))
                })?;
            } else {
                let node = TreeNode::new(subpath.clone(), Arc::clone(&self.shared));
                conn.object_server().at(&obj_path, node).await.map_err(|e| {
                    ShellyPvError::dbus(format!("Register TreeNode failed for {}: {}", subpath, e))
                })?;
            }
            self.registered_paths.insert(subpath);
        }
        Ok(())
    }

    /// Add a path with an initial value; an existing value is kept
    pub async fn ensure_item(
        &mut self,
        path: &str,
        initial_value: serde_json::Value,
        writable: bool,
    ) -> Result<()> {
        self.register_objects(path).await?;
        let mut shared = lock(&self.shared);
        shared
            .paths
            .entry(path.to_string())
            .or_insert(initial_value);
        if writable {
            shared.writable.insert(path.to_string());
        }
        Ok(())
    }

    /// Set a path and announce the change; equal values are not re-sent
    pub async fn update_path(&mut self, path: &str, value: serde_json::Value) -> Result<()> {
        {
            let shared = lock(&self.shared);
            if shared.paths.get(path) == Some(&value) {
                return Ok(());
            }
        }
        self.ensure_item(path, value.clone(), false).await?;
        lock(&self.shared)
            .paths
            .insert(path.to_string(), value.clone());

        if let Some(conn) = &self.connection
            && let Err(e) = emit_value_changed(conn, &self.root_path, path, &value).await
        {
            self.logger
                .debug(&format!("Change signal for {} failed: {}", path, e));
        }
        Ok(())
    }

    /// Create every path of the service with its startup value
    pub async fn register_static_metadata(
        &mut self,
        identity: &DeviceIdentity,
        config: &Config,
    ) -> Result<()> {
        use serde_json::{Value, json};

        let statics: [(&str, Value); 15] = [
            (paths::MGMT_PROCESS_NAME, json!(env!("CARGO_PKG_NAME"))),
            (paths::MGMT_PROCESS_VERSION, json!(env!("APP_VERSION"))),
            (
                paths::MGMT_CONNECTION,
                json!(format!("Shelly Pro3EM HTTP JSON at {}", config.shelly.host)),
            ),
            (paths::DEVICE_INSTANCE, json!(config.device_instance)),
            (paths::PRODUCT_ID, json!(paths::PVINVERTER_PRODUCT_ID)),
            (paths::PRODUCT_NAME, json!(paths::PRODUCT_NAME_VALUE)),
            (paths::CUSTOM_NAME, json!(config.custom_name)),
            (paths::LATENCY, Value::Null),
            (paths::FIRMWARE_VERSION, json!(identity.firmware_id)),
            (paths::HARDWARE_VERSION, json!(identity.firmware_id)),
            (paths::SERIAL, json!(identity.serial_number)),
            (paths::POSITION, json!(config.pvinverter.position)),
            (paths::MAX_POWER, json!(config.pvinverter.max_power_w)),
            (paths::UPDATE_INDEX, json!(0)),
            (paths::STATUS_CODE, json!(8)),
        ];
        for (path, value) in statics {
            self.ensure_item(path, value, false).await?;
        }

        for path in [paths::STATUS, paths::MODE] {
            self.ensure_item(path, Value::Null, false).await?;
        }
        self.ensure_item(paths::CONNECTED, json!(0), true).await?;

        for path in paths::measurement_paths() {
            let initial = if path == paths::AC_POWER {
                json!(0)
            } else {
                Value::Null
            };
            self.ensure_item(&path, initial, true).await?;
        }

        self.logger.info(&format!(
            "Registered {} paths for serial {}",
            lock(&self.shared).paths.len(),
            identity.serial_number
        ));
        Ok(())
    }

    async fn request_name(&self, connection: &Connection) -> ZbusResult<()> {
        use zbus::fdo::{DBusProxy, RequestNameFlags};
        let proxy = DBusProxy::new(connection).await?;
        let name = WellKnownName::try_from(self.service_name.as_str())?;
        let _ = proxy
            .request_name(name, RequestNameFlags::ReplaceExisting.into())
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Publisher for DbusService {
    async fn set_value(&mut self, path: &str, value: Option<f64>) -> Result<()> {
        let value = match value {
            Some(v) => serde_json::json!(v),
            None => serde_json::Value::Null,
        };
        self.update_path(path, value).await
    }

    async fn set_integer(&mut self, path: &str, value: i64) -> Result<()> {
        self.update_path(path, serde_json::json!(value)).await
    }

    async fn set_connected(&mut self, connected: bool) -> Result<()> {
        self.update_path(paths::CONNECTED, serde_json::json!(u8::from(connected)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{
        Aggregate, OutputFrame, PhaseOutput, PhaseValues, StatusCode,
    };

    fn identity() -> DeviceIdentity {
        DeviceIdentity {
            serial_number: "34987A12AB01".to_string(),
            firmware_id: "20240819-074343/1.4.2".to_string(),
        }
    }

    #[tokio::test]
    async fn static_metadata_populates_service_paths() {
        let mut config = Config::default();
        config.device_instance = 41;
        config.pvinverter.position = 1;
        let mut svc = DbusService::new(&config).unwrap();
        svc.register_static_metadata(&identity(), &config)
            .await
            .unwrap();

        assert_eq!(svc.service_name(), "com.victronenergy.pvinverter.http_41");
        assert!(!svc.is_attached());
        assert_eq!(svc.value("/ProductId"), Some(serde_json::json!(41281)));
        assert_eq!(svc.value("/DeviceInstance"), Some(serde_json::json!(41)));
        assert_eq!(svc.value("/Serial"), Some(serde_json::json!("34987A12AB01")));
        assert_eq!(svc.value("/Position"), Some(serde_json::json!(1)));
        assert_eq!(svc.value("/StatusCode"), Some(serde_json::json!(8)));
        assert_eq!(svc.value("/Ac/Power"), Some(serde_json::json!(0)));
        assert_eq!(svc.value("/Ac/L2/Voltage"), Some(serde_json::Value::Null));
        assert_eq!(svc.value("/Mode"), Some(serde_json::Value::Null));

        let shared = lock(&svc.shared);
        assert!(shared.writable.contains("/Ac/L1/Power"));
        assert!(shared.writable.contains("/Connected"));
        assert!(!shared.writable.contains("/Serial"));
    }

    #[tokio::test]
    async fn publish_frame_writes_live_blank_and_skips_unchanged() {
        let config = Config::default();
        let mut svc = DbusService::new(&config).unwrap();
        svc.register_static_metadata(&identity(), &config)
            .await
            .unwrap();
        svc.set_value("/Ac/L3/Power", Some(77.0)).await.unwrap();

        let frame = OutputFrame {
            l1: PhaseOutput::Live(PhaseValues {
                voltage: 230.0,
                current: -4.3,
                power: -1000.0,
                energy_forward: 12.0,
                energy_reverse: 5.0,
            }),
            l2: PhaseOutput::Blank,
            l3: PhaseOutput::Unchanged,
            aggregate: Aggregate {
                power: Some(-1000.0),
                energy_forward: Some(12.0),
                energy_reverse: None,
            },
            status_code: StatusCode::Running,
            update_index: 3,
        };
        svc.set_value("/Ac/Energy/Reverse", Some(4.0)).await.unwrap();
        svc.publish_frame(&frame).await.unwrap();

        assert_eq!(svc.value("/Ac/L1/Power"), Some(serde_json::json!(-1000.0)));
        assert_eq!(svc.value("/Ac/L1/Energy/Forward"), Some(serde_json::json!(12.0)));
        assert_eq!(svc.value("/Ac/L2/Current"), Some(serde_json::Value::Null));
        assert_eq!(svc.value("/Ac/L3/Power"), Some(serde_json::json!(77.0)));
        assert_eq!(svc.value("/Ac/Power"), Some(serde_json::json!(-1000.0)));
        assert_eq!(svc.value("/Ac/Energy/Reverse"), Some(serde_json::json!(4.0)));
        assert_eq!(svc.value("/StatusCode"), Some(serde_json::json!(7)));
        assert_eq!(svc.value("/UpdateIndex"), Some(serde_json::json!(3)));
    }

    #[tokio::test]
    async fn connected_flag_is_numeric() {
        let mut svc = DbusService::new(&Config::default()).unwrap();
        svc.set_connected(true).await.unwrap();
        assert_eq!(svc.value("/Connected"), Some(serde_json::json!(1)));
        svc.set_connected(false).await.unwrap();
        assert_eq!(svc.value("/Connected"), Some(serde_json::json!(0)));
    }

    #[tokio::test]
    async fn ensure_item_keeps_existing_value() {
        let mut svc = DbusService::new(&Config::default()).unwrap();
        svc.update_path("/Ac/Power", serde_json::json!(12.5))
            .await
            .unwrap();
        svc.ensure_item("/Ac/Power", serde_json::json!(0), true)
            .await
            .unwrap();
        assert_eq!(svc.value("/Ac/Power"), Some(serde_json::json!(12.5)));
    }
}
