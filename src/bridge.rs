//! Hue bridge HTTP client.
//!
//! Talks to the bridge's REST API and flattens each light and sensor into
//! a flat [`DeviceRecord`], which is all the extraction engine ever sees.

use crate::error::{ExporterError, Result};
use crate::metrics::data::DeviceRecord;
use crate::metrics::traits::RecordSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Device kind tag for light records.
pub const KIND_LIGHT: &str = "light";
/// Device kind tag for sensor records.
pub const KIND_SENSOR: &str = "sensor";

/// Request timeout for bridge calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Light state fields carried into records, with their record field names.
///
/// Lights expose a fixed state shape, so only the documented fields are
/// taken; sensors get the generic prefix flattening instead.
const LIGHT_STATE_FIELDS: &[(&str, &str)] = &[
    ("on", "state_on"),
    ("alert", "state_alert"),
    ("bri", "state_bri"),
    ("colormode", "state_color_mode"),
    ("ct", "state_ct"),
    ("reachable", "state_reachable"),
    ("sat", "state_saturation"),
];

/// Raw per-device payload as returned by the bridge API.
///
/// Lights and sensors share this shape; unused parts deserialize empty.
#[derive(Debug, Deserialize)]
struct DevicePayload {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    device_type: String,
    #[serde(default)]
    modelid: String,
    #[serde(default)]
    manufacturername: String,
    #[serde(default)]
    swversion: String,
    #[serde(default)]
    swconfigid: String,
    #[serde(default)]
    uniqueid: String,
    #[serde(default)]
    state: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    config: BTreeMap<String, serde_json::Value>,
}

impl DevicePayload {
    /// Insert the identity fields common to lights and sensors.
    fn insert_common(&self, id: &str, record: &mut DeviceRecord) {
        match id.parse::<i64>() {
            Ok(n) => record.insert("id", n),
            Err(_) => record.insert("id", id),
        }
        record.insert("name", self.name.clone());
        record.insert("type", self.device_type.clone());
        record.insert("model_id", self.modelid.clone());
        record.insert("manufacturer_name", self.manufacturername.clone());
        record.insert("sw_version", self.swversion.clone());
        record.insert("unique_id", self.uniqueid.clone());
    }
}

/// Flatten one light payload into a record.
fn flatten_light(id: &str, payload: &DevicePayload) -> DeviceRecord {
    let mut record = DeviceRecord::new(KIND_LIGHT);
    payload.insert_common(id, &mut record);
    record.insert("sw_config_id", payload.swconfigid.clone());

    for (api_key, field) in LIGHT_STATE_FIELDS {
        if let Some(value) = payload.state.get(*api_key) {
            record.insert_json(*field, value.clone());
        }
    }
    record
}

/// Flatten one sensor payload into a record.
///
/// Sensor state and config shapes vary per sensor model, so every entry
/// is carried with a `state_` / `config_` prefix.
fn flatten_sensor(id: &str, payload: &DevicePayload) -> DeviceRecord {
    let mut record = DeviceRecord::new(KIND_SENSOR);
    payload.insert_common(id, &mut record);

    for (key, value) in &payload.state {
        record.insert_json(format!("state_{}", key), value.clone());
    }
    for (key, value) in &payload.config {
        record.insert_json(format!("config_{}", key), value.clone());
    }
    record
}

/// HTTP client for one Hue bridge.
pub struct HueBridge {
    base_url: String,
    username: String,
    client: reqwest::Client,
}

impl HueBridge {
    /// Create a client for the bridge at `base_url`, authenticating with
    /// the given API username token.
    pub fn new(base_url: impl Into<String>, username: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExporterError::bridge_error(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            client,
        })
    }

    /// Fetch one API resource (`lights` or `sensors`) keyed by device id.
    async fn fetch_resource(&self, resource: &str) -> Result<BTreeMap<String, DevicePayload>> {
        let url = format!("{}/api/{}/{}", self.base_url, self.username, resource);
        debug!(%url, "fetching bridge resource");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ExporterError::bridge_error(format!("GET {} failed: {}", resource, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::bridge_error(format!(
                "GET {} returned status {}",
                resource, status
            )));
        }

        response.json().await.map_err(|e| {
            ExporterError::bridge_error(format!("decoding {} response failed: {}", resource, e))
        })
    }
}

#[async_trait]
impl RecordSource for HueBridge {
    async fn fetch_records(&self) -> Result<Vec<DeviceRecord>> {
        let sensors = self.fetch_resource("sensors").await?;
        let lights = self.fetch_resource("lights").await?;

        let mut records = Vec::with_capacity(sensors.len() + lights.len());
        for (id, payload) in &sensors {
            records.push(flatten_sensor(id, payload));
        }
        for (id, payload) in &lights {
            records.push(flatten_light(id, payload));
        }

        debug!(
            sensors = sensors.len(),
            lights = lights.len(),
            "flattened bridge devices"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::data::FieldValue;
    use serde_json::json;

    fn light_payload() -> DevicePayload {
        serde_json::from_value(json!({
            "name": "Hue color lamp 1",
            "type": "Extended color light",
            "modelid": "LCT007",
            "manufacturername": "Philips",
            "swversion": "5.105.0.21169",
            "swconfigid": "F921C859",
            "uniqueid": "00:17:88:01:10:33:41:ee-0b",
            "state": {
                "on": true,
                "bri": 254,
                "hue": 8418,
                "sat": 140,
                "ct": 366,
                "alert": "none",
                "colormode": "ct",
                "reachable": true,
                "xy": [0.4573, 0.41]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_flatten_light_fields() {
        let record = flatten_light("3", &light_payload());

        assert_eq!(record.kind, "light");
        assert_eq!(record.get("id"), Some(&FieldValue::Int(3)));
        assert_eq!(
            record.get("name"),
            Some(&FieldValue::Str("Hue color lamp 1".to_string()))
        );
        assert_eq!(record.get("model_id"), Some(&FieldValue::Str("LCT007".to_string())));
        assert_eq!(
            record.get("sw_config_id"),
            Some(&FieldValue::Str("F921C859".to_string()))
        );
        assert_eq!(record.get("state_on"), Some(&FieldValue::Bool(true)));
        assert_eq!(record.get("state_bri"), Some(&FieldValue::Int(254)));
        assert_eq!(record.get("state_saturation"), Some(&FieldValue::Int(140)));
        assert_eq!(
            record.get("state_color_mode"),
            Some(&FieldValue::Str("ct".to_string()))
        );
        // undocumented state fields stay behind
        assert_eq!(record.get("state_hue"), None);
        assert_eq!(record.get("state_xy"), None);
    }

    #[test]
    fn test_flatten_sensor_prefixes_state_and_config() {
        let payload: DevicePayload = serde_json::from_value(json!({
            "name": "Hue temperature sensor 1",
            "type": "ZLLTemperature",
            "modelid": "SML001",
            "manufacturername": "Philips",
            "swversion": "6.1.0.18912",
            "uniqueid": "00:17:88:01:02:00:af:28-02-0402",
            "state": {
                "temperature": 2358,
                "lastupdated": "2020-03-02T18:32:43"
            },
            "config": {
                "on": true,
                "battery": 100,
                "reachable": true
            }
        }))
        .unwrap();

        let record = flatten_sensor("7", &payload);

        assert_eq!(record.kind, "sensor");
        assert_eq!(record.get("state_temperature"), Some(&FieldValue::Int(2358)));
        assert_eq!(
            record.get("state_lastupdated"),
            Some(&FieldValue::Str("2020-03-02T18:32:43".to_string()))
        );
        assert_eq!(record.get("config_battery"), Some(&FieldValue::Int(100)));
        assert_eq!(record.get("config_on"), Some(&FieldValue::Bool(true)));
        assert_eq!(record.get("sw_config_id"), None);
    }

    #[test]
    fn test_non_numeric_device_id_kept_as_string() {
        let record = flatten_sensor("bridge", &light_payload());
        assert_eq!(record.get("id"), Some(&FieldValue::Str("bridge".to_string())));
    }
}
