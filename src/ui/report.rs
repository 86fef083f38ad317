use crate::models::{SpeedReport, WifiReport};
use crate::ui::common::{get_line_color, LineKind, RenderContext};
use crossterm::{
    queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor},
};
use std::io::{self, Write};

const BANNER: &str = r"
  __          _______  _   _ _____ ______ _______
  \ \        / / ____|| \ | |_   _|  ____|__   __|
   \ \  /\  / / (___  |  \| | | | | |__     | |
    \ \/  \/ / \___ \ | . ` | | | |  __|    | |
     \  /\  /  ____) || |\  |_| |_| |____   | |
      \/  \/  |_____/ |_| \_|_____|______|  |_|
";

pub const WIFI_HEADER: &str = "=== Wi-Fi Details ===";
pub const SPEED_HEADER: &str = "=== Internet Speed Test ===";
const SEPARATOR_WIDTH: usize = 30;

const MODULE: &str = "ui::report";

/// Writes styled console lines
pub struct Renderer<W: Write> {
    out: W,
    context: RenderContext,
}

impl Renderer<io::Stdout> {
    pub fn stdout(context: RenderContext) -> Self {
        Self::new(io::stdout(), context)
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, context: RenderContext) -> Self {
        Self { out, context }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn line(&mut self, kind: LineKind, text: &str) -> io::Result<()> {
        if self.context.color {
            if kind == LineKind::Banner {
                queue!(self.out, SetAttribute(Attribute::Bold))?;
            }
            queue!(
                self.out,
                SetForegroundColor(get_line_color(kind)),
                Print(text),
                ResetColor,
                SetAttribute(Attribute::Reset),
                Print("\n")
            )?;
        } else {
            writeln!(self.out, "{}", text)?;
        }
        self.out.flush()
    }

    /// Prints a one-off status line, logging a failed write instead of returning it
    ///
    /// Used on exit paths where the process outcome is already decided.
    pub fn status(&mut self, kind: LineKind, text: &str) {
        if let Err(e) = self.line(kind, text) {
            crate::log_warning!(MODULE, "Failed to print status line: {}", e);
        }
    }

    pub fn welcome(&mut self) -> io::Result<()> {
        self.line(LineKind::Banner, BANNER)?;
        self.line(
            LineKind::Success,
            "Welcome to the Wi-Fi Speed Test Tool (WSNIET)!",
        )?;
        self.line(LineKind::Notice, "Powered by Rust\n")
    }

    /// Prints both result sections between separator lines
    pub fn report(&mut self, wifi: &WifiReport, speed: &SpeedReport) -> io::Result<()> {
        let separator = "=".repeat(SEPARATOR_WIDTH);

        writeln!(self.out)?;
        self.line(LineKind::Separator, &separator)?;
        self.line(LineKind::Header, WIFI_HEADER)?;
        match wifi {
            Ok(status) => {
                self.line(LineKind::Success, &format!("Wi-Fi Bit Rate: {}", status.bit_rate))?;
                self.line(LineKind::Success, &format!("Signal Level: {}", status.signal_level))?;
            }
            Err(e) => self.line(LineKind::Error, &e.to_string())?,
        }

        self.line(LineKind::Separator, &separator)?;
        self.line(LineKind::Header, SPEED_HEADER)?;
        match speed {
            Ok(result) => {
                self.line(
                    LineKind::Success,
                    &format!("Download Speed: {} Mbps", format_measurement(result.download_mbps)),
                )?;
                self.line(
                    LineKind::Success,
                    &format!("Upload Speed: {} Mbps", format_measurement(result.upload_mbps)),
                )?;
                self.line(
                    LineKind::Success,
                    &format!("Ping (Jitter): {} ms", format_measurement(result.ping_ms)),
                )?;
            }
            Err(e) => self.line(LineKind::Error, &e.to_string())?,
        }
        self.line(LineKind::Separator, &separator)
    }
}

/// Shortest form of an already rounded value, keeping one decimal for whole numbers
fn format_measurement(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
