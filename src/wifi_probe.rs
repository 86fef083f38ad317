//! Wi-Fi Probe Module
//!
//! Reads link quality from the operating system's wireless status command.
//! Each platform is a [`WifiStatusProvider`]: the command to run plus the
//! grammar used to pull the bit rate and signal level out of its output.
//!
//! # Example
//!
//! ```no_run
//! use wifi_probe::{platform_provider, probe};
//!
//! match probe(platform_provider().as_ref()) {
//!     Ok(status) => println!("{} / {}", status.bit_rate, status.signal_level),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

use crate::error::ProbeError;
use crate::models::{WifiReport, WifiStatus};
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::{Command, Stdio};

const MODULE: &str = "wifi_probe";

/// Marker `iwconfig` prints for interfaces without wireless support
const NO_WIRELESS_MARKER: &str = "no wireless extensions";

static IW_BIT_RATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Bit Rate[:=]\s*(\d+(?:\.\d+)? \S+)").unwrap());
static IW_SIGNAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Signal level[:=]\s*(-?\d+ dBm)").unwrap());

static NETSH_LINK_SPEED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Link Speed\s*:\s*(\d+(?:\.\d+)? \S+)").unwrap());
static NETSH_RECEIVE_RATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Receive rate \(Mbps\)\s*:\s*(\d+(?:\.\d+)?)").unwrap());
static NETSH_SIGNAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"Signal\s*:\s*(\d+)").unwrap());

/// A platform's wireless status command and its output grammar
pub trait WifiStatusProvider {
    /// Program to execute
    fn program(&self) -> &'static str;

    /// Arguments passed verbatim, without a shell
    fn args(&self) -> &'static [&'static str];

    /// Extracts the link fields from the command output
    ///
    /// A missing field becomes "Unknown"; only a whole-output condition
    /// (such as no wireless interface) is an error.
    fn parse(&self, output: &str) -> WifiReport;
}

/// Linux and other Unix-likes, via `iwconfig`
pub struct IwconfigProvider;

impl WifiStatusProvider for IwconfigProvider {
    fn program(&self) -> &'static str {
        "iwconfig"
    }

    fn args(&self) -> &'static [&'static str] {
        &[]
    }

    fn parse(&self, output: &str) -> WifiReport {
        if output.contains(NO_WIRELESS_MARKER) {
            return Err(ProbeError::NoWirelessExtensions);
        }

        Ok(WifiStatus::new(
            first_capture(&IW_BIT_RATE, output),
            first_capture(&IW_SIGNAL, output),
        ))
    }
}

/// Windows, via `netsh wlan show interfaces`
pub struct NetshProvider;

impl WifiStatusProvider for NetshProvider {
    fn program(&self) -> &'static str {
        "netsh"
    }

    fn args(&self) -> &'static [&'static str] {
        &["wlan", "show", "interfaces"]
    }

    fn parse(&self, output: &str) -> WifiReport {
        // Newer builds report "Receive rate (Mbps)" instead of "Link Speed"
        let bit_rate = first_capture(&NETSH_LINK_SPEED, output).or_else(|| {
            first_capture(&NETSH_RECEIVE_RATE, output).map(|rate| format!("{} Mbps", rate))
        });
        let signal_level = first_capture(&NETSH_SIGNAL, output).map(|s| format!("{}%", s));

        Ok(WifiStatus::new(bit_rate, signal_level))
    }
}

/// Picks the provider for the operating system this binary was built for
pub fn platform_provider() -> Box<dyn WifiStatusProvider> {
    if cfg!(windows) {
        Box::new(NetshProvider)
    } else {
        Box::new(IwconfigProvider)
    }
}

/// Runs the provider's status command and parses its output
///
/// Every failure is returned as an error value; nothing here panics or
/// aborts the run.
pub fn probe(provider: &dyn WifiStatusProvider) -> WifiReport {
    let program = provider.program();
    crate::log_debug!(MODULE, "Running {} {:?}", program, provider.args());

    let output = Command::new(program)
        .args(provider.args())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| ProbeError::CommandSpawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ProbeError::CommandFailed {
            program: program.to_string(),
            code: output.status.code().unwrap_or(-1),
        });
    }

    let text = decode_selected(output.stdout, output.stderr)?;

    let report = provider.parse(&text);
    match &report {
        Ok(status) => crate::log_info!(
            MODULE,
            "Bit rate {}, signal {}",
            status.bit_rate,
            status.signal_level
        ),
        Err(e) => crate::log_warning!(MODULE, "{}", e),
    }
    report
}

/// Decodes the stream to parse: stdout, unless it is blank
///
/// `iwconfig` reports interfaces without wireless support on stderr only.
/// The other stream is never decoded.
fn decode_selected(stdout: Vec<u8>, stderr: Vec<u8>) -> Result<String, ProbeError> {
    let selected = if stdout.iter().all(u8::is_ascii_whitespace) {
        stderr
    } else {
        stdout
    };
    Ok(String::from_utf8(selected)?)
}

fn first_capture(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::wifi_status::UNKNOWN;

    const IWCONFIG_FULL: &str = "\
wlan0     IEEE 802.11  ESSID:\"home\"
          Mode:Managed  Frequency:5.18 GHz  Access Point: AA:BB:CC:DD:EE:FF
          Bit Rate=866.7 Mb/s   Tx-Power=22 dBm
          Link Quality=60/70  Signal level=-50 dBm
";

    const NETSH_FULL: &str = "\
There is 1 interface on the system:

    Name                   : Wi-Fi
    State                  : connected
    SSID                   : home
    Radio type             : 802.11ac
    Link Speed             : 150 Mbps
    Signal                 : 80%
";

    #[test]
    fn test_iwconfig_bit_rate_only() {
        let status = IwconfigProvider.parse("wlan0  Bit Rate: 54 Mb/s").unwrap();
        assert_eq!(status.bit_rate, "54 Mb/s");
        assert_eq!(status.signal_level, UNKNOWN);
    }

    #[test]
    fn test_iwconfig_signal_only() {
        let status = IwconfigProvider.parse("wlan0  Signal level=-62 dBm").unwrap();
        assert_eq!(status.signal_level, "-62 dBm");
        assert_eq!(status.bit_rate, UNKNOWN);
    }

    #[test]
    fn test_iwconfig_full_output() {
        let status = IwconfigProvider.parse(IWCONFIG_FULL).unwrap();
        assert_eq!(status.bit_rate, "866.7 Mb/s");
        assert_eq!(status.signal_level, "-50 dBm");
    }

    #[test]
    fn test_iwconfig_no_fields_is_not_an_error() {
        let status = IwconfigProvider.parse("wlan0  unassociated").unwrap();
        assert_eq!(status, WifiStatus::new(None, None));
    }

    #[test]
    fn test_iwconfig_marker_is_an_error() {
        let output = format!("lo        no wireless extensions.\n\n{}", IWCONFIG_FULL);
        let result = IwconfigProvider.parse(&output);
        assert!(matches!(result, Err(ProbeError::NoWirelessExtensions)));
    }

    #[test]
    fn test_netsh_link_speed_and_signal() {
        let status = NetshProvider
            .parse("Link Speed : 150 Mbps\nSignal : 80")
            .unwrap();
        assert_eq!(status.bit_rate, "150 Mbps");
        assert_eq!(status.signal_level, "80%");
    }

    #[test]
    fn test_netsh_full_output() {
        let status = NetshProvider.parse(NETSH_FULL).unwrap();
        assert_eq!(status.bit_rate, "150 Mbps");
        assert_eq!(status.signal_level, "80%");
    }

    #[test]
    fn test_netsh_receive_rate_fallback() {
        let output = "    Receive rate (Mbps)    : 144.4\n    Transmit rate (Mbps)   : 130\n";
        let status = NetshProvider.parse(output).unwrap();
        assert_eq!(status.bit_rate, "144.4 Mbps");
        assert_eq!(status.signal_level, UNKNOWN);
    }

    #[test]
    fn test_decode_prefers_stdout() {
        let text = decode_selected(b"wlan0 ...".to_vec(), b"lo no wireless extensions.".to_vec());
        assert_eq!(text.unwrap(), "wlan0 ...");

        let text = decode_selected(b"\n".to_vec(), b"lo no wireless extensions.".to_vec());
        assert_eq!(text.unwrap(), "lo no wireless extensions.");
    }

    #[test]
    fn test_invalid_stderr_is_ignored_when_stdout_is_parsed() {
        let text = decode_selected(b"Bit Rate=54 Mb/s".to_vec(), vec![0xff, 0xfe]);
        assert_eq!(text.unwrap(), "Bit Rate=54 Mb/s");
    }

    #[test]
    fn test_invalid_selected_stream_is_a_decode_error() {
        let result = decode_selected(vec![0xff, b'\n'], Vec::new());
        assert!(matches!(result, Err(ProbeError::Decode(_))));
    }

    #[test]
    fn test_missing_command_is_an_error() {
        struct Missing;
        impl WifiStatusProvider for Missing {
            fn program(&self) -> &'static str {
                "wsniet-definitely-not-a-command"
            }
            fn args(&self) -> &'static [&'static str] {
                &[]
            }
            fn parse(&self, _output: &str) -> WifiReport {
                Ok(WifiStatus::new(None, None))
            }
        }

        let result = probe(&Missing);
        assert!(matches!(result, Err(ProbeError::CommandSpawn { .. })));
    }

    struct Scripted {
        program: &'static str,
        args: &'static [&'static str],
    }

    impl WifiStatusProvider for Scripted {
        fn program(&self) -> &'static str {
            self.program
        }
        fn args(&self) -> &'static [&'static str] {
            self.args
        }
        fn parse(&self, output: &str) -> WifiReport {
            IwconfigProvider.parse(output)
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_an_error() {
        let result = probe(&Scripted {
            program: "false",
            args: &[],
        });
        assert!(matches!(
            result,
            Err(ProbeError::CommandFailed { ref program, code: 1 }) if program == "false"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_output_is_parsed() {
        let status = probe(&Scripted {
            program: "echo",
            args: &["wlan0  Bit Rate=54 Mb/s  Signal level=-60 dBm"],
        })
        .unwrap();
        assert_eq!(status.bit_rate, "54 Mb/s");
        assert_eq!(status.signal_level, "-60 dBm");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_output_is_a_decode_error() {
        let result = probe(&Scripted {
            program: "printf",
            args: &["\\377\\n"],
        });
        assert!(matches!(result, Err(ProbeError::Decode(_))));
    }
}
