//! Command-line and environment configuration.

use clap::Parser;

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::dedup::{DedupMode, DedupOptions, DEFAULT_KEY_HEADER};
use crate::error::{Error, Result};
use crate::transport::Mechanism;

/// Interactive shell for searching, de-duplicating and batch-flagging IMAP mailboxes.
#[derive(Parser, Debug, Clone)]
#[command(name = "imapsh", version, about, long_about = None)]
pub struct Args {
    /// Connect to this server at startup.
    #[arg(long, env = "IMAPSH_SERVER")]
    pub server: Option<String>,

    /// Implicit-TLS port.
    #[arg(long, env = "IMAPSH_PORT", default_value_t = 993)]
    pub port: u16,

    /// Largest number of messages named in one STORE.
    #[arg(long, env = "IMAPSH_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Authentication mechanism used by `login`.
    #[arg(long = "auth", env = "IMAPSH_AUTH", value_enum, default_value_t = Mechanism::CramMd5)]
    pub mechanism: Mechanism,

    /// What `uniq` does with duplicates.
    #[arg(long, env = "IMAPSH_DEDUP_MODE", value_enum, default_value_t = DedupMode::Flag)]
    pub dedup_mode: DedupMode,

    /// Header that identifies a message for `uniq`.
    #[arg(long, env = "IMAPSH_DEDUP_HEADER", default_value = DEFAULT_KEY_HEADER)]
    pub dedup_header: String,

    /// Print the IMAP conversation to stderr.
    #[arg(long)]
    pub debug: bool,
}

/// Settings the shell runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub batch_size: usize,
    pub mechanism: Mechanism,
    pub dedup_mode: DedupMode,
    pub dedup_header: String,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 993,
            batch_size: DEFAULT_BATCH_SIZE,
            mechanism: Mechanism::CramMd5,
            dedup_mode: DedupMode::Flag,
            dedup_header: DEFAULT_KEY_HEADER.to_string(),
            debug: false,
        }
    }
}

impl Config {
    /// Rejects settings no command could run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch size must be at least 1".to_string()));
        }
        let header = self.dedup_header.trim();
        if header.is_empty() || header.contains(':') || header.contains(char::is_whitespace) {
            return Err(Error::Config(format!(
                "`{}` is not a header field name",
                self.dedup_header
            )));
        }
        Ok(())
    }

    /// Options for a `uniq` run; `report_only` overrides the configured mode.
    pub fn dedup_options(&self, report_only: bool) -> DedupOptions {
        DedupOptions {
            mode: if report_only {
                DedupMode::Report
            } else {
                self.dedup_mode
            },
            header: self.dedup_header.clone(),
            batch_size: self.batch_size,
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Config {
            port: args.port,
            batch_size: args.batch_size,
            mechanism: args.mechanism,
            dedup_mode: args.dedup_mode,
            dedup_header: args.dedup_header.clone(),
            debug: args.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["imapsh"]).unwrap();
        assert_eq!(args.server, None);
        assert_eq!(Config::from(&args), Config::default());
        Config::default().validate().unwrap();
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "imapsh",
            "--server",
            "imap.example.com",
            "--batch-size",
            "25",
            "--auth",
            "login",
            "--dedup-mode",
            "report",
            "--dedup-header",
            "X-Original-Id",
        ])
        .unwrap();
        assert_eq!(args.server.as_deref(), Some("imap.example.com"));
        let config = Config::from(&args);
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.mechanism, Mechanism::Login);
        assert_eq!(config.dedup_mode, DedupMode::Report);
        assert_eq!(config.dedup_header, "X-Original-Id");
    }

    #[test]
    fn rejects_unknown_mechanism() {
        assert!(Args::try_parse_from(["imapsh", "--auth", "plain"]).is_err());
    }

    #[test]
    fn validation() {
        let zero = Config {
            batch_size: 0,
            ..Config::default()
        };
        assert!(matches!(zero.validate(), Err(Error::Config(_))));
        for header in ["", "  ", "Message-ID:", "Message ID"] {
            let bad = Config {
                dedup_header: header.to_string(),
                ..Config::default()
            };
            assert!(bad.validate().is_err(), "{:?} accepted", header);
        }
    }

    #[test]
    fn report_only_overrides_mode() {
        let config = Config::default();
        assert_eq!(config.dedup_options(false).mode, DedupMode::Flag);
        assert_eq!(config.dedup_options(true).mode, DedupMode::Report);
        assert_eq!(config.dedup_options(true).batch_size, DEFAULT_BATCH_SIZE);
    }
}
