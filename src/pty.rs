use crate::error::{Error, Result};
use crate::terminal::{RawModeGuard, ResizeWatcher, SharedMaster};
use portable_pty::{Child, ChildKiller, CommandBuilder, PtySize};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Raw access to the master side of the pty.
pub struct PtyStreams {
    pub reader: Box<dyn Read + Send>,
    pub writer: Box<dyn Write + Send>,
}

/// A shell running inside a PTY, with the controlling terminal in raw mode.
///
/// Dropping the session tears everything down: the resize watcher stops, a
/// child that is still running is killed, the master is released and the
/// controlling terminal's previous mode is restored.
pub struct TerminalSession {
    // Field order is drop order: restore the terminal last.
    resize: Option<ResizeWatcher>,
    child: Box<dyn Child + Send + Sync>,
    master: SharedMaster,
    _raw_mode: RawModeGuard,
}

impl TerminalSession {
    /// Start `shell` in a fresh PTY and hand it `command_line`, followed by
    /// `exit` so the session ends when the command does.
    pub fn open(command_line: &str, shell: &Path) -> Result<(Self, PtyStreams)> {
        let spawn_err = |cause: anyhow::Error| Error::Spawn {
            shell: shell.display().to_string(),
            cause,
        };

        let pty_system = portable_pty::native_pty_system();
        let pair = pty_system.openpty(PtySize::default()).map_err(spawn_err)?;

        let child = pair
            .slave
            .spawn_command(CommandBuilder::new(shell))
            .map_err(spawn_err)?;
        drop(pair.slave);
        tracing::debug!(shell = %shell.display(), pid = ?child.process_id(), "shell started");

        let reader = pair.master.try_clone_reader().map_err(spawn_err)?;
        let mut writer = pair.master.take_writer().map_err(spawn_err)?;
        let master: SharedMaster = Arc::new(Mutex::new(pair.master));

        // From here on `session` owns the child, so an early return kills it.
        let mut session = TerminalSession {
            resize: None,
            child,
            master,
            _raw_mode: RawModeGuard::inactive(),
        };
        session.resize = ResizeWatcher::start(session.master.clone())?;
        session._raw_mode = RawModeGuard::acquire()?;

        writer.write_all(format!("{command_line}; exit\n").as_bytes())?;
        writer.flush()?;

        Ok((session, PtyStreams { reader, writer }))
    }

    fn shell_alive(&mut self) -> bool {
        self.child.try_wait().ok().flatten().is_none()
    }

    /// Wait for the shell to exit and return its exit code.
    pub fn wait(&mut self) -> Result<u32> {
        let status = self.child.wait()?;
        tracing::debug!(code = status.exit_code(), "shell exited");
        Ok(status.exit_code())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Some(resize) = self.resize.take() {
            resize.stop();
        }
        if self.shell_alive() {
            tracing::debug!("killing shell still attached to the pty");
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
