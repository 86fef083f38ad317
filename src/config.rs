use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub install: InstallConfig,
    pub speed: SpeedConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    pub target_dir: PathBuf,
    pub binary_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedConfig {
    pub server_list_url: String,
    pub candidate_servers: usize,
    pub latency_samples: u32,
    pub download_sizes: Vec<u32>, // square image edge, in pixels
    pub upload_sizes: Vec<usize>, // payload bytes
    pub download_threads: usize,
    /// Workers stop taking new transfers once a phase has run this long
    pub transfer_time_limit_seconds: u64,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub progress_steps: u32,
    pub progress_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub level: String, // "debug", "info", "warning", "error"
    pub console_output: bool,
    pub file_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            install: InstallConfig {
                target_dir: PathBuf::from("/usr/local/bin"),
                binary_name: "wsniet".to_string(),
            },
            speed: SpeedConfig {
                server_list_url: "https://www.speedtest.net/api/js/servers?engine=js&limit=10"
                    .to_string(),
                candidate_servers: 5,
                latency_samples: 3,
                download_sizes: vec![350, 500, 750, 1000, 1500, 2000, 2500, 3000, 3500, 4000],
                upload_sizes: vec![250_000, 500_000, 1_000_000, 2_000_000],
                download_threads: 4,
                transfer_time_limit_seconds: 10,
                timeout_seconds: 30,
                user_agent: format!("wsniet/{}", env!("CARGO_PKG_VERSION")),
                progress_steps: 100,
                progress_interval_ms: 20,
            },
            logging: LoggingConfig {
                enabled: true,
                level: "warning".to_string(),
                console_output: true,
                file_path: None,
            },
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self.logging.level.as_str() {
            "debug" | "info" | "warning" | "error" => {}
            _ => return Err("Invalid logging level".into()),
        }

        if self.install.binary_name.is_empty() {
            return Err("Binary name must not be empty".into());
        }

        let speed = &self.speed;
        if speed.progress_steps == 0 {
            return Err("Progress needs at least one step".into());
        }
        if speed.candidate_servers == 0 || speed.latency_samples == 0 {
            return Err("Server selection needs at least one candidate and one sample".into());
        }
        if speed.download_threads == 0 {
            return Err("Transfer tests need at least one worker thread".into());
        }
        if speed.download_sizes.is_empty() || speed.upload_sizes.is_empty() {
            return Err("Transfer size lists must not be empty".into());
        }

        Ok(())
    }

    /// Full path the tool is installed to on Unix-like systems
    pub fn install_target(&self) -> PathBuf {
        self.install.target_dir.join(&self.install.binary_name)
    }
}

impl SpeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn transfer_time_limit(&self) -> Duration {
        Duration::from_secs(self.transfer_time_limit_seconds)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}
