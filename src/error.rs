/// Typed errors for the three pipeline stages
use thiserror::Error;

/// Errors raised while installing the executable. Always fatal.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),

    #[error("failed to run `{program}`: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with status {code}")]
    CommandFailed { program: String, code: i32 },
}

/// Errors raised while probing the wireless interface
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("No wireless extensions found. Please check your Wi-Fi interface.")]
    NoWirelessExtensions,

    #[error("Error getting Wi-Fi details: failed to run `{program}`: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error getting Wi-Fi details: `{program}` exited with status {code}")]
    CommandFailed { program: String, code: i32 },

    #[error("Error getting Wi-Fi details: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

/// Errors raised by a measurement client
#[derive(Error, Debug)]
pub enum MeasurementError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server list is empty")]
    NoServers,

    #[error("none of the {0} candidate servers answered the latency probe")]
    NoReachableServer(usize),

    #[error("no server selected")]
    NoServerSelected,

    #[error("server returned status {0}")]
    Status(u16),

    #[error("transfer worker failed: {0}")]
    Worker(String),
}

/// Whole-stage failure of the speed probe, as shown to the user
#[derive(Error, Debug)]
#[error("Error running speed test: {0}")]
pub struct SpeedProbeError(#[from] pub MeasurementError);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_wireless_message() {
        assert_eq!(
            ProbeError::NoWirelessExtensions.to_string(),
            "No wireless extensions found. Please check your Wi-Fi interface."
        );
    }

    #[test]
    fn test_speed_probe_error_is_prefixed() {
        let err = SpeedProbeError::from(MeasurementError::NoServers);
        assert_eq!(err.to_string(), "Error running speed test: server list is empty");
    }

    #[test]
    fn test_command_failed_message() {
        let err = ProbeError::CommandFailed {
            program: "iwconfig".to_string(),
            code: 1,
        };
        assert_eq!(
            err.to_string(),
            "Error getting Wi-Fi details: `iwconfig` exited with status 1"
        );
    }
}
