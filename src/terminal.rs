//! Controlling-terminal state: raw mode and window size propagation.

use portable_pty::{MasterPty, PtySize};
use std::io::{self, IsTerminal};
use std::sync::{Arc, Mutex};
use std::thread;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode, size as terminal_size};
#[cfg(unix)]
use signal_hook::consts::signal::SIGWINCH;
#[cfg(unix)]
use signal_hook::iterator::Signals;

pub(crate) type SharedMaster = Arc<Mutex<Box<dyn MasterPty + Send>>>;

/// Restores the controlling terminal when dropped.
///
/// Holds the cleanup to run rather than a flag so that every exit path of a
/// run, errors included, goes through the same restore.
pub struct RawModeGuard {
    cleanup: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl RawModeGuard {
    /// Put stdin into raw mode if it is a terminal.
    ///
    /// When stdin is not a terminal there is no mode to change and the
    /// returned guard does nothing on drop.
    pub fn acquire() -> io::Result<Self> {
        if !io::stdin().is_terminal() {
            tracing::debug!("stdin is not a terminal, leaving terminal mode alone");
            return Ok(Self::inactive());
        }
        enable_raw_mode()?;
        tracing::debug!("raw mode enabled");
        Ok(Self::with_cleanup(|| {
            if let Err(e) = disable_raw_mode() {
                tracing::warn!("failed to restore terminal mode: {}", e);
            }
        }))
    }

    pub(crate) fn inactive() -> Self {
        Self { cleanup: None }
    }

    pub(crate) fn with_cleanup<F: FnOnce() + Send + 'static>(cleanup: F) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.cleanup.is_some()
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

/// Apply `cols` x `rows` to the pty so the child sees the new window size.
pub fn propagate_size(master: &dyn MasterPty, cols: u16, rows: u16) -> anyhow::Result<()> {
    master.resize(PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    })
}

fn propagate_current_size(master: &SharedMaster) {
    let (cols, rows) = match terminal_size() {
        Ok(size) => size,
        Err(e) => {
            tracing::debug!("cannot read terminal size: {}", e);
            return;
        }
    };
    if let Ok(master) = master.lock() {
        if let Err(e) = propagate_size(master.as_ref(), cols, rows) {
            tracing::warn!("error resizing pty: {}", e);
        } else {
            tracing::trace!(cols, rows, "pty resized");
        }
    }
}

/// Keeps the pty size in sync with the controlling terminal on `SIGWINCH`.
pub struct ResizeWatcher {
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
    #[cfg(unix)]
    thread: thread::JoinHandle<()>,
}

impl ResizeWatcher {
    /// Propagate the current size once, then follow resize notifications.
    pub(crate) fn start(master: SharedMaster) -> io::Result<Option<Self>> {
        propagate_current_size(&master);

        #[cfg(unix)]
        {
            let mut signals = Signals::new([SIGWINCH])?;
            let handle = signals.handle();
            let thread = thread::spawn(move || {
                for _ in signals.forever() {
                    propagate_current_size(&master);
                }
            });
            Ok(Some(Self { handle, thread }))
        }

        #[cfg(not(unix))]
        {
            let _ = master;
            Ok(None)
        }
    }

    pub fn stop(self) {
        #[cfg(unix)]
        {
            self.handle.close();
            let _ = self.thread.join();
        }
    }
}
