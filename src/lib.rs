//! # Passtty
//!
//! Feed passwords to interactive terminal programs through a PTY.
//!
//! Passtty runs a command inside a shell attached to a pseudo-terminal, waits
//! for something that looks like a password prompt, types the secret for you
//! and then hands the terminal over for normal interactive use. It is not tied
//! to SSH: any program with a recognisable prompt works.
//!
//! ## Quick start
//!
//! ```no_run
//! use passtty::Config;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default().with_timeout(Duration::from_secs(20));
//!     let secrets = vec![std::env::var("SSHPASS")?];
//!     let code = passtty::run("ssh user@example.org", &secrets, &config).await?;
//!     std::process::exit(code as i32);
//! }
//! ```
//!
//! ## How a run works
//!
//! 1. [`TerminalSession::open`] starts the shell in a PTY, puts the real
//!    terminal into raw mode and types `<command>; exit`.
//! 2. For each secret, [`Feeder::enter_secret`] watches the output until the
//!    prompt shows up, answers it and checks the reply. Bytes read past the
//!    reply carry over into the next round.
//! 3. After the last secret, [`Feeder::passthrough`] connects stdin and stdout
//!    to the PTY until the shell exits.
//!
//! Any failure ([`Error`]) ends the run. The session is dropped on the way
//! out, which restores the terminal and kills the shell if it is still alive.
//!
//! ## Detection
//!
//! | Output contains | Reaction |
//! |-----------------|----------|
//! | `The authenticity of host ` | types `yes`, or fails when confirmation is disabled |
//! | [`Config::expected_prompt`] | types the secret |
//! | prompt or [`Config::expected_failure`] after the secret | authentication failure |
//! | anything else, more than 5 bytes, after the secret | secret accepted |

pub mod config;
pub mod error;
pub mod feeder;
pub mod pty;
pub mod pty_reader;
pub mod pty_writer;
pub mod shell;
pub mod terminal;

pub use config::Config;
pub use error::{Error, Result};
pub use feeder::Feeder;
pub use pty::TerminalSession;

use std::io;

/// Run `command_line` in a PTY, answering one prompt per entry of `secrets`,
/// then pass the terminal through to the user.
///
/// Returns the shell's exit code once it exits.
pub async fn run(command_line: &str, secrets: &[String], config: &Config) -> Result<u32> {
    let shell = shell::resolve_shell(config.shell.as_deref());
    let (mut session, streams) = TerminalSession::open(command_line, &shell)?;
    let output = pty_reader::spawn_reader(streams.reader);
    let mut feeder = Feeder::new(config.clone(), streams.writer, output);

    let residue = feeder.enter_secrets(secrets).await?;
    feeder.passthrough(residue, io::stdin(), io::stdout()).await?;
    session.wait()
}
