//! Click entity representing a single resolved visit.

use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Device category derived from the visitor's user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceType {
    Mobile,
    Tablet,
    #[default]
    Desktop,
    SmartTv,
    Wearable,
    Console,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Desktop => "desktop",
            DeviceType::SmartTv => "smarttv",
            DeviceType::Wearable => "wearable",
            DeviceType::Console => "console",
        }
    }

    /// Human-readable label used in the analytics breakdown.
    pub fn display_name(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "Mobile",
            DeviceType::Tablet => "Tablet",
            DeviceType::Desktop => "Desktop",
            DeviceType::SmartTv => "Smart TV",
            DeviceType::Wearable => "Wearable",
            DeviceType::Console => "Console",
        }
    }

    /// Lenient parse used for stored values: empty or unknown labels become desktop.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobile" => Ok(DeviceType::Mobile),
            "tablet" => Ok(DeviceType::Tablet),
            "desktop" => Ok(DeviceType::Desktop),
            "smarttv" => Ok(DeviceType::SmartTv),
            "wearable" => Ok(DeviceType::Wearable),
            "console" => Ok(DeviceType::Console),
            other => Err(format!("unknown device type '{other}'")),
        }
    }
}

/// A click appended to a link's log.
#[derive(Debug, Clone)]
pub struct Click {
    pub id: i64,
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    /// Stored label; kept as text so legacy or empty values survive a round trip.
    pub device_type: String,
    pub country_code: String,
    pub visitor_hash: String,
}

/// Input data for recording a click.
///
/// The timestamp is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewClick {
    pub link_id: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub device_type: DeviceType,
    pub country_code: String,
    pub visitor_hash: String,
}
