//! Run configuration and the duration syntax accepted for `--timeout`.

use anyhow::{Context as _, Result, anyhow};
use std::path::PathBuf;
use std::time::Duration;

/// Options for a single run. Passed by reference to [`crate::run`] and never
/// mutated afterwards.
///
/// ```
/// use passtty::Config;
/// use std::time::Duration;
///
/// let config = Config::default()
///     .with_prompt("Password for")
///     .with_timeout(Duration::from_secs(30));
/// assert_eq!(config.expected_failure, "denied");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Substring that marks a password prompt, e.g. `"password:"`.
    pub expected_prompt: String,
    /// Substring that marks a rejected secret, e.g. `"denied"`.
    pub expected_failure: String,
    /// How long a single round may wait for a decision.
    pub timeout: Duration,
    /// Answer `yes` to SSH host authenticity questions.
    pub auto_confirm_host: bool,
    /// Shell to run the command in. `None` means the user's login shell.
    pub shell: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expected_prompt: "password:".to_string(),
            expected_failure: "denied".to_string(),
            timeout: Duration::from_secs(10),
            auto_confirm_host: true,
            shell: None,
        }
    }
}

impl Config {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.expected_prompt = prompt.into();
        self
    }

    pub fn with_failure(mut self, failure: impl Into<String>) -> Self {
        self.expected_failure = failure.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auto_confirm_host(mut self, enabled: bool) -> Self {
        self.auto_confirm_host = enabled;
        self
    }

    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = Some(shell.into());
        self
    }
}

/// Parse a duration string: `500ms`, `10s`, `1.5s`, `2m`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if let Some(ms_str) = s.strip_suffix("ms") {
        let ms: u64 = ms_str
            .trim()
            .parse()
            .context("Invalid milliseconds value")?;
        Ok(Duration::from_millis(ms))
    } else if let Some(s_str) = s.strip_suffix('s') {
        let secs: f64 = s_str.trim().parse().context("Invalid seconds value")?;
        seconds(secs)
    } else if let Some(m_str) = s.strip_suffix('m') {
        let mins: f64 = m_str.trim().parse().context("Invalid minutes value")?;
        seconds(mins * 60.0)
    } else {
        Err(anyhow!("Duration must end with 'ms', 's' or 'm', got: {}", s))
    }
}

fn seconds(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| anyhow!("Invalid duration: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.expected_prompt, "password:");
        assert_eq!(config.expected_failure, "denied");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.auto_confirm_host);
        assert!(config.shell.is_none());
    }

    #[test]
    fn test_builders() {
        let config = Config::default()
            .with_prompt("Passcode:")
            .with_failure("incorrect")
            .with_timeout(Duration::from_millis(250))
            .with_auto_confirm_host(false)
            .with_shell("/bin/sh");
        assert_eq!(config.expected_prompt, "Passcode:");
        assert_eq!(config.expected_failure, "incorrect");
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert!(!config.auto_confirm_host);
        assert_eq!(config.shell, Some(PathBuf::from("/bin/sh")));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(
            parse_duration("1.5s").unwrap(),
            Duration::from_secs_f64(1.5)
        );
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("5minutes").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("-1s").is_err());
    }
}
