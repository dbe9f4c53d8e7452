//! Device gateway — the seam between the courier core and whatever
//! actually mounts the device.
//!
//! The core only needs three answers: is the device reachable, can a
//! mount be established at a given directory, and (best-effort) tear it
//! down. Everything else about the mounting mechanism stays on the other
//! side of this trait.

use crate::config::DeviceConfig;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

pub trait DeviceGateway {
    /// Whether the device is currently reachable.
    fn is_present(&self) -> bool;

    /// Mount the device at `target`, a fresh empty directory supplied by
    /// the caller. Idempotent; returns false on failure.
    fn mount(&self, target: &Path) -> bool;

    /// Unmount `target`. Best-effort; failure is logged, never raised.
    fn unmount(&self, target: &Path);
}

/// Gateway that shells out to configurable commands, modeled on the
/// libimobiledevice toolchain (`idevice_id` / `ifuse` / `fusermount -u`)
/// but usable with any mount helper that fits the argv contract.
pub struct ShellGateway {
    config: DeviceConfig,
}

impl ShellGateway {
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }
}

impl DeviceGateway for ShellGateway {
    fn is_present(&self) -> bool {
        let (program, args) = match self.config.probe_command.split_first() {
            Some(parts) => parts,
            None => return false,
        };
        match Command::new(program).args(args).output() {
            // Present iff the probe prints at least one device identifier
            Ok(output) => {
                output.status.success()
                    && !String::from_utf8_lossy(&output.stdout).trim().is_empty()
            }
            Err(e) => {
                debug!("Device probe command failed to run: {}", e);
                false
            }
        }
    }

    fn mount(&self, target: &Path) -> bool {
        let (program, args) = match self.config.mount_command.split_first() {
            Some(parts) => parts,
            None => return false,
        };
        match Command::new(program).args(args).arg(target).status() {
            Ok(status) if status.success() => true,
            Ok(status) => {
                warn!("Mount command exited with {}", status);
                false
            }
            Err(e) => {
                warn!("Mount command failed to run: {}", e);
                false
            }
        }
    }

    fn unmount(&self, target: &Path) {
        let (program, args) = match self.config.unmount_command.split_first() {
            Some(parts) => parts,
            None => return,
        };
        match Command::new(program).args(args).arg(target).status() {
            Ok(status) if status.success() => {
                debug!("Unmounted {}", target.display());
            }
            Ok(status) => warn!("Unmount of {} exited with {}", target.display(), status),
            Err(e) => warn!("Unmount command failed to run: {}", e),
        }
    }
}
