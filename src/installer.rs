//! Installer Module
//!
//! Makes sure the tool is available system-wide before the probes run.
//! On Unix-like systems the running binary is moved to the install target
//! and the process stops so the user can call the installed copy. On
//! Windows the binary stays where it is and the run continues.

use crate::error::InstallError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

const MODULE: &str = "installer";

/// File operations the installer needs from the system
pub trait InstallOps {
    fn is_executable(&self, path: &Path) -> bool;
    fn make_executable(&self, path: &Path) -> Result<(), InstallError>;
    fn relocate(&self, from: &Path, to: &Path) -> Result<(), InstallError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Target was already executable; nothing was touched
    AlreadyInstalled,
    /// Binary was moved into place; the process should exit
    Installed { command: String },
    /// Binary was marked executable in place; the run continues
    MarkedExecutable,
}

pub struct Installer<O: InstallOps> {
    ops: O,
    platform: Platform,
    target: PathBuf,
    current_exe: PathBuf,
}

impl<O: InstallOps> Installer<O> {
    /// `unix_target` is only used on Unix-like systems; on Windows the
    /// running executable is its own target.
    pub fn new(ops: O, platform: Platform, unix_target: PathBuf, current_exe: PathBuf) -> Self {
        let target = match platform {
            Platform::Unix => unix_target,
            Platform::Windows => current_exe.clone(),
        };

        Self {
            ops,
            platform,
            target,
            current_exe,
        }
    }

    pub fn needs_install(&self) -> bool {
        !self.ops.is_executable(&self.target)
    }

    pub fn ensure_installed(&self) -> Result<InstallOutcome, InstallError> {
        if !self.needs_install() {
            crate::log_debug!(MODULE, "{} is already executable", self.target.display());
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        self.ops.make_executable(&self.current_exe)?;

        match self.platform {
            Platform::Windows => Ok(InstallOutcome::MarkedExecutable),
            Platform::Unix => {
                self.ops.relocate(&self.current_exe, &self.target)?;
                crate::log_info!(
                    MODULE,
                    "Moved {} to {}",
                    self.current_exe.display(),
                    self.target.display()
                );
                let command = self
                    .target
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| self.target.display().to_string());
                Ok(InstallOutcome::Installed { command })
            }
        }
    }
}

/// Real file operations via `chmod` and `sudo mv`
pub struct SystemOps;

impl InstallOps for SystemOps {
    #[cfg(unix)]
    fn is_executable(&self, path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn is_executable(&self, path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("exe"))
                .unwrap_or(false)
    }

    #[cfg(unix)]
    fn make_executable(&self, path: &Path) -> Result<(), InstallError> {
        run_command("chmod", &[OsStr::new("+x"), path.as_os_str()])
    }

    #[cfg(not(unix))]
    fn make_executable(&self, path: &Path) -> Result<(), InstallError> {
        // No execute bit to set
        crate::log_info!(MODULE, "{} is ready to run", path.display());
        Ok(())
    }

    fn relocate(&self, from: &Path, to: &Path) -> Result<(), InstallError> {
        run_command("sudo", &[OsStr::new("mv"), from.as_os_str(), to.as_os_str()])
    }
}

fn run_command(program: &str, args: &[&OsStr]) -> Result<(), InstallError> {
    crate::log_debug!(MODULE, "Running {} {:?}", program, args);

    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| InstallError::CommandSpawn {
            program: program.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(InstallError::CommandFailed {
            program: program.to_string(),
            code: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}
