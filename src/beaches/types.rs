//! Beach data type definitions
//!
//! Raw types mirror the badevand.dk API responses; enriched and scored types
//! form the structured content returned to MCP callers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One monitored bathing location as returned by the upstream API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBeachRecord {
    /// Upstream identity number
    pub id: u64,

    /// Municipality name
    pub municipality: String,

    /// Municipality home page
    #[serde(
        rename = "municipalityUrl",
        default,
        deserialize_with = "loose_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub municipality_url: String,

    /// Display name
    pub name: String,

    /// Free-text description
    #[serde(default, deserialize_with = "loose_string")]
    pub description: String,

    /// Latitude (WGS84)
    pub latitude: f64,

    /// Longitude (WGS84)
    pub longitude: f64,

    /// Free-text comments, may carry notices such as bathing bans
    #[serde(default, deserialize_with = "loose_string")]
    pub comments: String,

    /// Free-text facilities list
    #[serde(default, deserialize_with = "loose_string")]
    pub facilities: String,

    /// Reference links
    #[serde(default, deserialize_with = "nullable")]
    pub links: Vec<String>,

    /// Daily observations, most recent first
    #[serde(default, deserialize_with = "nullable")]
    pub data: Vec<DailyObservation>,
}

/// A single day's measurements and forecast for a beach
///
/// Numeric values arrive string-encoded and are kept verbatim; parsing
/// happens during enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    #[serde(default, deserialize_with = "loose_string")]
    pub date: String,

    /// Water quality class code ("1" poor, "2" good)
    #[serde(default, deserialize_with = "loose_string")]
    pub water_quality: String,

    #[serde(default, deserialize_with = "loose_string")]
    pub water_quality_original_value: String,

    #[serde(default, deserialize_with = "loose_string")]
    pub water_temperature: String,

    #[serde(default, deserialize_with = "loose_string")]
    pub current_speed: String,

    #[serde(default, deserialize_with = "loose_string")]
    pub current_direction: String,

    #[serde(default, deserialize_with = "loose_string")]
    pub air_temperature: String,

    #[serde(default, deserialize_with = "loose_string")]
    pub wind_speed: String,

    #[serde(default, deserialize_with = "loose_string")]
    pub wind_direction: String,

    #[serde(default, deserialize_with = "loose_string")]
    pub wind_direction_display: String,

    #[serde(default)]
    pub weather_type: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub precipitation: String,
}

impl DailyObservation {
    /// Stand-in used when a beach has no observations at all
    pub fn unknown() -> Self {
        Self {
            water_quality: "2".to_string(),
            water_temperature: "12".to_string(),
            air_temperature: "15".to_string(),
            wind_speed: "5".to_string(),
            ..Default::default()
        }
    }
}

/// Water quality class as assigned by the monitoring authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaterQuality {
    Poor,
    Good,
    Unknown,
}

impl WaterQuality {
    /// Map a numeric class; anything but 1 and 2 is `Unknown`
    pub fn from_class(class: i64) -> Self {
        match class {
            1 => WaterQuality::Poor,
            2 => WaterQuality::Good,
            _ => WaterQuality::Unknown,
        }
    }

    /// Parse the string-encoded class code used by the upstream API
    pub fn from_code(code: &str) -> Self {
        code.trim()
            .parse::<i64>()
            .map(Self::from_class)
            .unwrap_or(WaterQuality::Unknown)
    }

    pub fn class(&self) -> Option<u8> {
        match self {
            WaterQuality::Poor => Some(1),
            WaterQuality::Good => Some(2),
            WaterQuality::Unknown => None,
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, WaterQuality::Good)
    }
}

impl Serialize for WaterQuality {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.class() {
            Some(class) => serializer.serialize_u8(class),
            None => serializer.serialize_none(),
        }
    }
}

/// A beach record with parsed current conditions and derived fields
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedBeach {
    pub id: String,
    pub name: String,
    pub municipality: String,
    pub description: String,

    /// `[longitude, latitude]`, the order map widgets expect
    pub coords: [f64; 2],

    pub water_quality: WaterQuality,
    pub water_temperature: f64,
    pub air_temperature: f64,
    pub wind_speed: f64,
    pub comments: String,
    pub facilities: String,
    pub links: Vec<String>,

    /// Full observation history, most recent first
    pub forecast: Vec<DailyObservation>,

    pub thumbnail: String,
}

/// An enriched beach with its score and position in a ranking
#[derive(Debug, Clone, Serialize)]
pub struct ScoredBeach {
    #[serde(flatten)]
    pub beach: EnrichedBeach,

    pub score: f64,

    /// 1-based position after sorting
    pub rank: usize,
}

/// Accepts a string, a number or null and yields a string
fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(text)) => text,
        Some(Loose::Number(number)) => number.to_string(),
        None => String::new(),
    })
}

/// Treats an explicit null like a missing field
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
