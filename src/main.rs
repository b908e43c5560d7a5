use anyhow::{Result, bail};
use clap::Parser;
use passtty::Config;
use passtty::config::parse_duration;
use std::path::PathBuf;
use std::time::Duration;

mod logging;

/// Environment variable read by `--env`.
const SECRET_ENV: &str = "SSHPASS";

#[derive(Parser, Debug)]
#[command(
    name = "passtty",
    about = "Enter passwords to commands non-interactively",
    long_about = "Runs a command in a pseudo-terminal and types the password when it is \
                  prompted for, then hands the terminal over. Works with any program \
                  that has an identifiable password prompt, not only ssh.",
    version
)]
struct Args {
    /// Plaintext password (not recommended); repeat for programs asking more than once
    #[arg(short, long = "password", value_name = "SECRET")]
    passwords: Vec<String>,

    /// Use the value of $SSHPASS as the password
    #[arg(short, long)]
    env: bool,

    /// How long to wait for a prompt or confirmation
    #[arg(short, long, default_value = "10s", value_parser = parse_duration)]
    timeout: Duration,

    /// Do not answer SSH host authenticity questions automatically
    #[arg(long)]
    disable_ssh_host_confirm: bool,

    /// Text that marks the password prompt
    #[arg(long, default_value = "password:")]
    prompt: String,

    /// Text that marks a rejected password
    #[arg(long, default_value = "denied")]
    failure: String,

    /// Shell to run the command in (defaults to the login shell)
    #[arg(long)]
    shell: Option<PathBuf>,

    /// Command to run
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

impl Args {
    fn secrets(&self) -> Vec<String> {
        let mut secrets = self.passwords.clone();
        if self.env {
            secrets.push(std::env::var(SECRET_ENV).unwrap_or_default());
        }
        if secrets.is_empty() {
            secrets.push(String::new());
        }
        secrets
    }

    fn config(&self) -> Config {
        let mut config = Config::default()
            .with_prompt(self.prompt.as_str())
            .with_failure(self.failure.as_str())
            .with_timeout(self.timeout)
            .with_auto_confirm_host(!self.disable_ssh_host_confirm);
        if let Some(shell) = &self.shell {
            config = config.with_shell(shell);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing();

    let command = args.command.join(" ");
    if command.trim().is_empty() {
        bail!("You must specify a command.");
    }

    let code = passtty::run(&command, &args.secrets(), &args.config()).await?;
    std::process::exit(code as i32);
}
