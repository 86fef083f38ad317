use crate::error::MeasurementError;
use crate::models::{SpeedReport, SpeedResult};
use crate::progress::{ProgressReporter, Ticker};

const MODULE: &str = "speed_probe";

/// The operations the speed probe needs from a measurement service
pub trait MeasurementClient {
    /// Picks the best server by the client's own heuristic
    fn select_best_server(&mut self) -> Result<(), MeasurementError>;

    /// Measures download throughput in bits per second
    fn download(&mut self) -> Result<f64, MeasurementError>;

    /// Measures upload throughput in bits per second
    fn upload(&mut self) -> Result<f64, MeasurementError>;

    /// Round-trip latency to the selected server, in milliseconds
    fn ping_ms(&self) -> Result<f64, MeasurementError>;
}

/// Runs server selection, download and upload in order
///
/// Each phase is accompanied by the ticker's progress indicator. The first
/// failure ends the probe; a partial result is never returned.
pub fn run<C, R>(client: &mut C, progress: &mut R, ticker: &Ticker) -> SpeedReport
where
    C: MeasurementClient + ?Sized,
    R: ProgressReporter + ?Sized,
{
    let report = measure(client, progress, ticker);
    match &report {
        Ok(result) => crate::log_info!(
            MODULE,
            "Download {} Mbps, upload {} Mbps, ping {} ms",
            result.download_mbps,
            result.upload_mbps,
            result.ping_ms
        ),
        Err(e) => crate::log_warning!(MODULE, "{}", e),
    }
    report
}

fn measure<C, R>(client: &mut C, progress: &mut R, ticker: &Ticker) -> SpeedReport
where
    C: MeasurementClient + ?Sized,
    R: ProgressReporter + ?Sized,
{
    ticker.run_phase(progress, "Finding best server", || client.select_best_server())?;
    let download_bps = ticker.run_phase(progress, "Testing download speed", || client.download())?;
    let upload_bps = ticker.run_phase(progress, "Testing upload speed", || client.upload())?;
    let ping_ms = client.ping_ms()?;

    Ok(SpeedResult::from_raw(download_bps, upload_bps, ping_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::tests::RecordingProgress;
    use std::time::Duration;

    #[derive(Clone, Copy, PartialEq)]
    enum Phase {
        Select,
        Download,
        Upload,
        Ping,
    }

    /// Scripted client that can fail at a chosen phase
    struct ScriptedClient {
        fail_at: Option<Phase>,
        calls: Vec<&'static str>,
    }

    impl ScriptedClient {
        fn new(fail_at: Option<Phase>) -> Self {
            Self {
                fail_at,
                calls: Vec::new(),
            }
        }

        fn step<T>(&self, phase: Phase, value: T) -> Result<T, MeasurementError> {
            if self.fail_at == Some(phase) {
                Err(MeasurementError::Status(503))
            } else {
                Ok(value)
            }
        }
    }

    impl MeasurementClient for ScriptedClient {
        fn select_best_server(&mut self) -> Result<(), MeasurementError> {
            self.calls.push("select");
            self.step(Phase::Select, ())
        }

        fn download(&mut self) -> Result<f64, MeasurementError> {
            self.calls.push("download");
            self.step(Phase::Download, 52_000_000.0)
        }

        fn upload(&mut self) -> Result<f64, MeasurementError> {
            self.calls.push("upload");
            self.step(Phase::Upload, 11_116_000.0)
        }

        fn ping_ms(&self) -> Result<f64, MeasurementError> {
            self.step(Phase::Ping, 23.456)
        }
    }

    fn fast_ticker() -> Ticker {
        Ticker::new(100, Duration::ZERO)
    }

    #[test]
    fn test_successful_run_converts_and_rounds() {
        let mut client = ScriptedClient::new(None);
        let mut progress = RecordingProgress::default();

        let result = run(&mut client, &mut progress, &fast_ticker()).unwrap();

        assert_eq!(result.download_mbps, 52.0);
        assert_eq!(result.upload_mbps, 11.12);
        assert_eq!(result.ping_ms, 23.46);
        assert_eq!(client.calls, vec!["select", "download", "upload"]);
        assert_eq!(
            progress.labels,
            vec![
                "Finding best server",
                "Testing download speed",
                "Testing upload speed"
            ]
        );
        assert_eq!(progress.steps.len(), 300);
        assert_eq!(progress.finished, 3);
    }

    #[test]
    fn test_failure_in_any_phase_is_a_single_error() {
        for phase in [Phase::Select, Phase::Download, Phase::Upload, Phase::Ping] {
            let mut client = ScriptedClient::new(Some(phase));
            let mut progress = RecordingProgress::default();

            let report = run(&mut client, &mut progress, &fast_ticker());

            let err = report.expect_err("probe should fail");
            assert_eq!(
                err.to_string(),
                "Error running speed test: server returned status 503"
            );
        }
    }

    #[test]
    fn test_failed_selection_skips_transfers() {
        let mut client = ScriptedClient::new(Some(Phase::Select));
        let mut progress = RecordingProgress::default();

        let _ = run(&mut client, &mut progress, &fast_ticker());

        assert_eq!(client.calls, vec!["select"]);
        assert_eq!(progress.labels.len(), 1);
    }
}
