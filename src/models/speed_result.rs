use crate::error::SpeedProbeError;
use serde::{Deserialize, Serialize};

/// Internet throughput measured against the selected server
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SpeedResult {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ping_ms: f64,
}

impl SpeedResult {
    /// Builds a result from raw bits/sec throughput and a latency in ms,
    /// converting to Mbps and rounding every field to 2 decimals.
    pub fn from_raw(download_bps: f64, upload_bps: f64, ping_ms: f64) -> Self {
        Self {
            download_mbps: round2(download_bps / 1_000_000.0),
            upload_mbps: round2(upload_bps / 1_000_000.0),
            ping_ms: round2(ping_ms),
        }
    }
}

pub type SpeedReport = Result<SpeedResult, SpeedProbeError>;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_bits_to_megabits() {
        let result = SpeedResult::from_raw(52_000_000.0, 10_500_000.0, 12.0);
        assert_eq!(result.download_mbps, 52.0);
        assert_eq!(result.upload_mbps, 10.5);
        assert_eq!(result.ping_ms, 12.0);
    }

    #[test]
    fn test_rounds_to_two_decimals() {
        let result = SpeedResult::from_raw(93_456_789.0, 1_234.0, 17.3456);
        assert_eq!(result.download_mbps, 93.46);
        assert_eq!(result.upload_mbps, 0.0);
        assert_eq!(result.ping_ms, 17.35);
    }
}
