use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A reading as published on the queue by the collector.
///
/// Absent and `null` fields both decode to the zero value.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct WeatherReading {
    #[serde(deserialize_with = "null_as_default")]
    pub latitude: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub longitude: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub temperature: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub humidity: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub wind_speed: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub condition_code: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
}

impl WeatherReading {
    /// Decodes a message body.
    ///
    /// A `null` body is an all-zero reading. Keys match case-insensitively;
    /// when several spellings of one key are present the lowercase one wins.
    /// A key repeated verbatim keeps its last value.
    pub fn decode(body: &[u8]) -> crate::Result<Self> {
        match serde_json::from_slice::<Value>(body)? {
            Value::Null => Ok(Self::default()),
            Value::Object(fields) => Ok(serde_json::from_value(Value::Object(fold_keys(fields)))?),
            other => Err(crate::Error::Decode(de::Error::custom(format!(
                "expected a JSON object, found {other}"
            )))),
        }
    }
}

fn fold_keys(fields: Map<String, Value>) -> Map<String, Value> {
    let mut folded = Map::new();
    let mut exact = Vec::new();
    for (key, value) in fields {
        let lower = key.to_lowercase();
        if lower == key {
            exact.push((lower, value));
        } else {
            folded.insert(lower, value);
        }
    }
    // exact spellings override case variants
    folded.extend(exact);
    folded
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The payload accepted by the storage API. Coordinates are not forwarded.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub condition_code: i64,
    pub timestamp: String,
}

impl From<&WeatherReading> for WeatherRecord {
    fn from(reading: &WeatherReading) -> Self {
        Self {
            temperature: reading.temperature,
            humidity: reading.humidity,
            wind_speed: reading.wind_speed,
            condition_code: reading.condition_code,
            timestamp: reading.timestamp.clone(),
        }
    }
}
