//! Supervisory session loop.
//!
//! Drives the connect/disconnect lifecycle: poll for the device, stand
//! up a fresh mount point, run one phase against it, tear down, and
//! either finish (no work left) or go back to waiting. Runs until the
//! phase reports complete or the operator interrupts.
//!
//! Interrupts are honored at loop granularity only; an in-flight phase
//! finishes its current session first. That is safe because every unit
//! of phase progress is persisted the moment it happens.

use crate::device::DeviceGateway;
use crate::phase::PhaseOutcome;
use crate::utils::errors::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct SessionLoop<G: DeviceGateway> {
    gateway: G,
    session_root: PathBuf,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl<G: DeviceGateway> SessionLoop<G> {
    pub fn new(
        gateway: G,
        session_root: impl Into<PathBuf>,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            session_root: session_root.into(),
            poll_interval,
            cancel,
        }
    }

    /// Run `phase` against freshly mounted sessions until it reports
    /// `Complete` or the operator interrupts.
    ///
    /// The phase itself is synchronous and blocking; the loop only
    /// suspends while waiting for the device to appear.
    pub async fn run<F>(&self, mut phase: F) -> Result<()>
    where
        F: FnMut(&Path) -> Result<PhaseOutcome>,
    {
        loop {
            if self.cancel.is_cancelled() {
                info!("Interrupt received; exiting with progress saved");
                return Ok(());
            }

            if !self.gateway.is_present() {
                debug!("Device not present, waiting...");
                if self.wait_or_cancelled().await {
                    return Ok(());
                }
                continue;
            }

            info!("Device connected");
            let session_dir = self.create_session_dir()?;

            if !self.gateway.mount(&session_dir) {
                // The session directory is abandoned; the next cycle
                // gets a fresh one.
                warn!(
                    "Failed to mount device at {}; retrying",
                    session_dir.display()
                );
                if self.wait_or_cancelled().await {
                    return Ok(());
                }
                continue;
            }

            let outcome = phase(&session_dir);
            self.gateway.unmount(&session_dir);

            match outcome? {
                PhaseOutcome::Complete => {
                    info!("All work complete. Exiting...");
                    return Ok(());
                }
                PhaseOutcome::Partial => {
                    info!("Session ended early; more work may remain for the next session");
                }
                PhaseOutcome::Inaccessible => {
                    warn!("Mount point was not accessible this session");
                }
            }
        }
    }

    /// Sleep one poll interval; returns true if cancelled while waiting.
    async fn wait_or_cancelled(&self) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.poll_interval) => false,
            _ = self.cancel.cancelled() => {
                info!("Interrupt received; exiting with progress saved");
                true
            }
        }
    }

    /// Create a fresh, timestamp-named mount point for this session.
    fn create_session_dir(&self) -> Result<PathBuf> {
        let name = chrono::Local::now()
            .format("session-%Y%m%d-%H%M%S")
            .to_string();
        let session_dir = self.session_root.join(name);
        std::fs::create_dir_all(&session_dir)?;
        Ok(session_dir)
    }
}
