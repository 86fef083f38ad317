use crate::error::ProbeError;
use serde::{Deserialize, Serialize};

/// Placeholder for a field the status command did not report
pub const UNKNOWN: &str = "Unknown";

/// Link quality of the current wireless connection
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WifiStatus {
    /// Negotiated rate with its unit, e.g. "150 Mbps"
    pub bit_rate: String,
    /// Signal strength with its unit, e.g. "-45 dBm" or "80%"
    pub signal_level: String,
}

impl WifiStatus {
    pub fn new(bit_rate: Option<String>, signal_level: Option<String>) -> Self {
        Self {
            bit_rate: bit_rate.unwrap_or_else(|| UNKNOWN.to_string()),
            signal_level: signal_level.unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

pub type WifiReport = Result<WifiStatus, ProbeError>;
