//! The prompt-driven feeder: answers one prompt per secret, then hands the
//! terminal to the user.
//!
//! Each call to [`Feeder::enter_secret`] runs one [`Round`]. A round watches
//! the pty output for, in priority order,
//!
//! 1. an SSH host authenticity question, answered with `yes` when allowed,
//! 2. the configured prompt, answered with the secret,
//! 3. enough output after the secret to tell success from a repeated prompt
//!    or the configured failure marker.
//!
//! Matching is plain substring search over the raw bytes read so far. The
//! round races the configured timeout; whichever finishes first decides.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::pty_writer::spawn_writer;
use std::io::{self, Read, Write};
use std::thread;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Printed by OpenSSH when it meets an unknown host key.
pub const HOST_AUTHENTICITY_MARKER: &str = "The authenticity of host ";

/// Output after the secret must be longer than this before it is judged, so a
/// partial read is not mistaken for success.
pub const MIN_REPLY_LEN: usize = 5;

/// Where a round currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    WatchingForHostIdentity,
    WatchingForPrompt,
    PromptAnswered,
}

/// What the driver has to do after a round looked at its buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing decisive yet, read more.
    Wait,
    /// Write these bytes to the pty, then read more.
    Send(Vec<u8>),
    /// The secret was accepted. Carries the bytes read past the reply.
    Ready(Vec<u8>),
}

/// Automaton state for a single secret.
///
/// `host_confirmed` is reset for every round, so a host banner showing up
/// again during a later secret is confirmed again.
#[derive(Debug)]
pub struct Round<'a> {
    config: &'a Config,
    secret: &'a str,
    buffer: Vec<u8>,
    host_confirmed: bool,
    secret_entered: bool,
}

impl<'a> Round<'a> {
    /// Start a round, seeded with the residue of the previous one.
    pub fn new(config: &'a Config, secret: &'a str, residue: Vec<u8>) -> Self {
        Self {
            config,
            secret,
            buffer: residue,
            host_confirmed: false,
            secret_entered: false,
        }
    }

    pub fn state(&self) -> RoundState {
        if self.secret_entered {
            RoundState::PromptAnswered
        } else if self.host_confirmed {
            RoundState::WatchingForPrompt
        } else {
            RoundState::WatchingForHostIdentity
        }
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Evaluate the buffer once. Call after every [`push`](Self::push).
    pub fn advance(&mut self) -> Result<Action> {
        if !self.host_confirmed && contains(&self.buffer, HOST_AUTHENTICITY_MARKER) {
            if !self.config.auto_confirm_host {
                return Err(Error::HostConfirmationRequired);
            }
            tracing::info!("confirming host authenticity");
            self.host_confirmed = true;
            self.buffer.clear();
            return Ok(Action::Send(b"yes\n".to_vec()));
        }

        if !self.secret_entered {
            if contains(&self.buffer, &self.config.expected_prompt) {
                tracing::debug!("prompt matched, entering secret");
                self.secret_entered = true;
                self.buffer.clear();
                let mut reply = Vec::with_capacity(self.secret.len() + 1);
                reply.extend_from_slice(self.secret.as_bytes());
                reply.push(b'\n');
                return Ok(Action::Send(reply));
            }
            return Ok(Action::Wait);
        }

        if self.buffer.len() <= MIN_REPLY_LEN {
            return Ok(Action::Wait);
        }
        if contains(&self.buffer, &self.config.expected_prompt)
            || contains(&self.buffer, &self.config.expected_failure)
        {
            return Err(Error::AuthenticationFailure);
        }
        tracing::debug!(residue = self.buffer.len(), "secret accepted");
        Ok(Action::Ready(std::mem::take(&mut self.buffer)))
    }
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    let needle = needle.as_bytes();
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

/// Drives rounds against a pty and owns its write side until passthrough.
pub struct Feeder {
    config: Config,
    input: UnboundedSender<Vec<u8>>,
    output: UnboundedReceiver<Vec<u8>>,
}

impl Feeder {
    /// `writer` is the pty's write side; it moves to its own thread. `output`
    /// is the pty output channel from
    /// [`spawn_reader`](crate::pty_reader::spawn_reader).
    pub fn new<W: Write + Send + 'static>(
        config: Config,
        writer: W,
        output: UnboundedReceiver<Vec<u8>>,
    ) -> Self {
        Self {
            config,
            input: spawn_writer(writer),
            output,
        }
    }

    /// Answer one prompt per secret, in order, and return the residue of the
    /// last round. Stops at the first failing round.
    pub async fn enter_secrets(&mut self, secrets: &[String]) -> Result<Vec<u8>> {
        let mut residue = Vec::new();
        for (i, secret) in secrets.iter().enumerate() {
            tracing::debug!(round = i + 1, of = secrets.len(), "waiting for prompt");
            residue = self.enter_secret(secret, residue).await?;
        }
        Ok(residue)
    }

    /// Run one round for `secret`, seeded with `residue`, and return the
    /// residue for the next round.
    pub async fn enter_secret(&mut self, secret: &str, residue: Vec<u8>) -> Result<Vec<u8>> {
        let timeout = self.config.timeout;
        let mut round = Round::new(&self.config, secret, residue);
        let drive = drive(&mut round, &self.input, &mut self.output);

        tokio::select! {
            result = drive => result,
            _ = tokio::time::sleep(timeout) => {
                tracing::debug!(?timeout, "round timed out");
                Err(Error::Timeout(timeout))
            }
        }
    }

    /// Give the terminal to the user.
    ///
    /// `residue` is written to `output` first. Then `input` is copied into
    /// the pty on a detached thread and pty output is copied to `output`
    /// until the pty closes. End of `input` only stops the input side.
    pub async fn passthrough<I, O>(self, residue: Vec<u8>, input: I, mut output: O) -> Result<()>
    where
        I: Read + Send + 'static,
        O: Write,
    {
        tracing::info!("entering passthrough");
        output.write_all(&residue)?;
        output.flush()?;

        let Feeder {
            input: pty_input,
            output: mut pty_output,
            ..
        } = self;
        forward_input(input, pty_input);

        while let Some(chunk) = pty_output.recv().await {
            if let Err(e) = output.write_all(&chunk).and_then(|_| output.flush()) {
                tracing::warn!("passthrough output closed: {}", e);
                break;
            }
        }
        tracing::debug!("pty output closed, leaving passthrough");
        Ok(())
    }
}

async fn drive(
    round: &mut Round<'_>,
    input: &UnboundedSender<Vec<u8>>,
    output: &mut UnboundedReceiver<Vec<u8>>,
) -> Result<Vec<u8>> {
    // The residue may already hold the next prompt.
    if !round.buffer().is_empty() {
        if let Some(residue) = step(round, input)? {
            return Ok(residue);
        }
    }
    while let Some(chunk) = output.recv().await {
        round.push(&chunk);
        if let Some(residue) = step(round, input)? {
            return Ok(residue);
        }
    }
    Err(Error::StreamClosed)
}

fn step(round: &mut Round<'_>, input: &UnboundedSender<Vec<u8>>) -> Result<Option<Vec<u8>>> {
    match round.advance()? {
        Action::Wait => Ok(None),
        Action::Send(bytes) => {
            input.send(bytes).map_err(|_| writer_closed())?;
            Ok(None)
        }
        Action::Ready(residue) => Ok(Some(residue)),
    }
}

fn writer_closed() -> Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "pty writer closed").into()
}

fn forward_input<I>(mut input: I, pty_input: UnboundedSender<Vec<u8>>)
where
    I: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = [0u8; 1024];
        loop {
            let n = match input.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            };
            if pty_input.send(buffer[..n].to_vec()).is_err() {
                break;
            }
        }
        tracing::debug!("input forwarding stopped");
    });
}
