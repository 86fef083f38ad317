//! Network Tools Module
//!
//! Speed measurement against the public speedtest.net server network:
//! - Server catalogue lookup and best-server selection by latency
//! - Multi-connection download and upload throughput tests
//!
//! # Examples
//!
//! ```no_run
//! use network_tools::SpeedtestClient;
//! use speed_probe::MeasurementClient;
//!
//! let mut client = SpeedtestClient::new(&AppConfig::default().speed)?;
//! client.select_best_server()?;
//! println!("Download: {} bit/s", client.download()?);
//! ```

use crate::config::SpeedConfig;
use crate::error::MeasurementError;
use crate::speed_probe::MeasurementClient;
use humansize::{format_size, DECIMAL};
use rand::Rng;
use serde::{Deserialize, Deserializer};
use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

const MODULE: &str = "network_tools";

/// A measurement server as listed by the catalogue
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Server {
    /// Upload endpoint; the other endpoints live next to it
    pub url: String,
    /// Catalogue id; sent as a string by the JS API, as a number elsewhere
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub sponsor: String,
    #[serde(default)]
    pub host: String,
    /// Distance from the client in km, as estimated by the catalogue
    #[serde(default)]
    pub distance: f64,
}

impl Server {
    /// Directory holding `latency.txt` and the `random*.jpg` images
    pub fn base_url(&self) -> &str {
        match self.url.rfind('/') {
            Some(idx) => &self.url[..=idx],
            None => &self.url,
        }
    }

    fn latency_url(&self) -> String {
        format!("{}latency.txt", self.base_url())
    }

    fn download_url(&self, size: u32) -> String {
        format!("{}random{}x{}.jpg", self.base_url(), size, size)
    }
}

/// The server picked for the transfer tests
#[derive(Debug, Clone)]
pub struct SelectedServer {
    pub server: Server,
    pub latency_ms: f64,
}

/// Measurement client speaking the speedtest.net HTTP protocol
pub struct SpeedtestClient {
    http: reqwest::blocking::Client,
    config: SpeedConfig,
    best: Option<SelectedServer>,
}

impl SpeedtestClient {
    pub fn new(config: &SpeedConfig) -> Result<Self, MeasurementError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            config: config.clone(),
            best: None,
        })
    }

    /// Fetches the catalogue, nearest servers first
    pub fn fetch_servers(&self) -> Result<Vec<Server>, MeasurementError> {
        let response = self.http.get(&self.config.server_list_url).send()?;
        if !response.status().is_success() {
            return Err(MeasurementError::Status(response.status().as_u16()));
        }

        let mut servers: Vec<Server> = response.json()?;
        servers.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        crate::log_debug!(MODULE, "Catalogue returned {} servers", servers.len());
        Ok(servers)
    }

    /// Average round-trip time over the samples that succeeded
    ///
    /// Returns `None` only when every sample fails, which disqualifies the
    /// server.
    fn latency_ms(&self, server: &Server) -> Option<f64> {
        let url = server.latency_url();
        let samples: Vec<Option<f64>> = (0..self.config.latency_samples)
            .map(|_| self.sample_latency(&url))
            .collect();

        let dropped = samples.iter().filter(|sample| sample.is_none()).count();
        if dropped > 0 {
            crate::log_debug!(
                MODULE,
                "{}: {} of {} latency samples failed",
                server.host,
                dropped,
                samples.len()
            );
        }
        average_latency(&samples)
    }

    fn sample_latency(&self, url: &str) -> Option<f64> {
        let start = Instant::now();
        let response = self.http.get(url).send().ok()?;
        if !response.status().is_success() {
            return None;
        }
        // Include the body in the round trip
        response.bytes().ok()?;
        Some(start.elapsed().as_secs_f64() * 1000.0)
    }

    fn selected(&self) -> Result<&SelectedServer, MeasurementError> {
        self.best.as_ref().ok_or(MeasurementError::NoServerSelected)
    }

    fn transfer<J, F>(&self, label: &str, jobs: Vec<J>, transfer: F) -> Result<f64, MeasurementError>
    where
        J: Send,
        F: Fn(J) -> Result<u64, MeasurementError> + Sync,
    {
        let stats = run_transfers(
            label,
            jobs,
            self.config.download_threads,
            self.config.transfer_time_limit(),
            transfer,
        )?;
        Ok(stats.bits_per_second())
    }
}

impl MeasurementClient for SpeedtestClient {
    fn select_best_server(&mut self) -> Result<(), MeasurementError> {
        let servers = self.fetch_servers()?;
        if servers.is_empty() {
            return Err(MeasurementError::NoServers);
        }

        let candidates: Vec<Server> = servers
            .into_iter()
            .take(self.config.candidate_servers)
            .collect();
        let probed: Vec<(Server, Option<f64>)> = candidates
            .iter()
            .map(|server| (server.clone(), self.latency_ms(server)))
            .collect();

        let best = choose_best(probed).ok_or(MeasurementError::NoReachableServer(candidates.len()))?;
        crate::log_info!(
            MODULE,
            "Selected #{} {} ({}, {}) hosted at {}, {:.0} km, {:.2} ms",
            best.server.id,
            best.server.sponsor,
            best.server.name,
            best.server.country,
            best.server.host,
            best.server.distance,
            best.latency_ms
        );
        self.best = Some(best);
        Ok(())
    }

    fn download(&mut self) -> Result<f64, MeasurementError> {
        let server = &self.selected()?.server;
        let urls: Vec<String> = self
            .config
            .download_sizes
            .iter()
            .map(|&size| server.download_url(size))
            .collect();

        self.transfer("download", urls, |url| {
            let mut response = self.http.get(&url).send()?;
            if !response.status().is_success() {
                return Err(MeasurementError::Status(response.status().as_u16()));
            }
            Ok(response.copy_to(&mut io::sink())?)
        })
    }

    fn upload(&mut self) -> Result<f64, MeasurementError> {
        let url = self.selected()?.server.url.clone();
        let payloads: Vec<Vec<u8>> = self
            .config
            .upload_sizes
            .iter()
            .map(|&size| random_payload(size))
            .collect();

        self.transfer("upload", payloads, |payload| {
            let sent = payload.len() as u64;
            let response = self
                .http
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(payload)
                .send()?;
            if !response.status().is_success() {
                return Err(MeasurementError::Status(response.status().as_u16()));
            }
            Ok(sent)
        })
    }

    fn ping_ms(&self) -> Result<f64, MeasurementError> {
        Ok(self.selected()?.latency_ms)
    }
}

/// Picks the reachable server with the lowest latency
///
/// Ties keep the earlier (closer) server.
pub fn choose_best(probed: Vec<(Server, Option<f64>)>) -> Option<SelectedServer> {
    probed
        .into_iter()
        .filter_map(|(server, latency)| latency.map(|latency_ms| SelectedServer { server, latency_ms }))
        .fold(None, |best: Option<SelectedServer>, candidate| match best {
            Some(current) if current.latency_ms <= candidate.latency_ms => Some(current),
            _ => Some(candidate),
        })
}

/// Mean of the successful latency samples, `None` if there are none
pub fn average_latency(samples: &[Option<f64>]) -> Option<f64> {
    let succeeded: Vec<f64> = samples.iter().flatten().copied().collect();
    if succeeded.is_empty() {
        return None;
    }
    Some(succeeded.iter().sum::<f64>() / succeeded.len() as f64)
}

/// Totals of one download or upload phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferStats {
    pub bytes: u64,
    pub seconds: f64,
    pub workers: usize,
}

impl TransferStats {
    pub fn bits_per_second(&self) -> f64 {
        self.bytes as f64 * 8.0 / self.seconds
    }
}

/// Runs `jobs` in order across at most `max_workers` threads
///
/// A worker stops taking new jobs once `time_limit` has passed since the
/// phase started, so every worker finishes at least one job. Failed jobs are
/// logged and skipped; the phase only fails when no bytes moved at all.
fn run_transfers<J, F>(
    label: &str,
    jobs: Vec<J>,
    max_workers: usize,
    time_limit: Duration,
    transfer: F,
) -> Result<TransferStats, MeasurementError>
where
    J: Send,
    F: Fn(J) -> Result<u64, MeasurementError> + Sync,
{
    let workers = max_workers.min(jobs.len()).max(1);
    let queue = Mutex::new(VecDeque::from(jobs));
    let first_error: Mutex<Option<MeasurementError>> = Mutex::new(None);
    let start = Instant::now();

    let (queue_ref, error_ref, transfer) = (&queue, &first_error, &transfer);

    let per_worker: Vec<u64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(move |_| {
                scope.spawn(move || {
                    let mut bytes = 0u64;
                    loop {
                        let job = match queue_ref.lock() {
                            Ok(mut pending) => pending.pop_front(),
                            Err(_) => None,
                        };
                        let Some(job) = job else { break };

                        match transfer(job) {
                            Ok(moved) => bytes += moved,
                            Err(e) => {
                                crate::log_warning!(MODULE, "{} request failed: {}", label, e);
                                if let Ok(mut slot) = error_ref.lock() {
                                    slot.get_or_insert(e);
                                }
                            }
                        }

                        if start.elapsed() >= time_limit {
                            break;
                        }
                    }
                    bytes
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    crate::log_warning!(MODULE, "{} worker panicked", label);
                    0
                })
            })
            .collect()
    });

    let seconds = start.elapsed().as_secs_f64();
    let bytes: u64 = per_worker.iter().sum();

    if bytes == 0 {
        let cause = first_error.into_inner().ok().flatten();
        return Err(cause.unwrap_or_else(|| {
            MeasurementError::Worker(format!("no data transferred during {}", label))
        }));
    }
    if seconds <= 0.0 {
        return Err(MeasurementError::Worker(format!("{} finished too fast to measure", label)));
    }

    crate::log_debug!(
        MODULE,
        "{}: {} in {:.2}s over {} connections",
        label,
        format_size(bytes, DECIMAL),
        seconds,
        workers
    );

    Ok(TransferStats {
        bytes,
        seconds,
        workers,
    })
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => id,
        serde_json::Value::Number(id) => id.to_string(),
        _ => String::new(),
    })
}

fn random_payload(size: usize) -> Vec<u8> {
    let mut payload = vec![0u8; size];
    rand::thread_rng().fill(&mut payload[..]);
    payload
}
