//! The command loop's executor.
//!
//! A [`Shell`] owns the one [`Session`] and [`SearchRegistry`] of a run and applies parsed
//! [`Command`]s to them, rendering results as text. Errors never escape [`Shell::run_line`]:
//! they are printed and the shell carries on with its state as the failing operation left it.

use std::io::{self, Write};

use log::debug;

use crate::batch::set_flags;
use crate::command::{Command, USAGE};
use crate::config::Config;
use crate::dedup::{collapse_duplicates, DedupMode, DedupReport};
use crate::error::Result;
use crate::query;
use crate::registry::{Handle, SearchRegistry};
use crate::session::{Credentials, Session};
use crate::transport::Connector;
use crate::utils::iter_join;

/// Whether the loop should read another line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<C: Connector> {
    connector: C,
    session: Session<C::Transport>,
    registry: SearchRegistry,
    config: Config,
}

impl<C: Connector> Shell<C> {
    pub fn new(connector: C, config: Config) -> Self {
        Shell {
            connector,
            session: Session::new(),
            registry: SearchRegistry::new(),
            config,
        }
    }

    /// The status prompt, `[user@]server[:mailbox]`.
    pub fn prompt(&self) -> String {
        self.session.prompt()
    }

    pub fn session(&self) -> &Session<C::Transport> {
        &self.session
    }

    pub fn registry(&self) -> &SearchRegistry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens a connection to `server` on the configured port.
    pub fn connect(&mut self, server: &str) -> Result<()> {
        self.session
            .connect(&self.connector, server, self.config.port)
    }

    /// Logs out, if connected.
    pub fn close(&mut self) {
        self.session.disconnect();
    }

    /// Parses and runs one line of input.
    ///
    /// Command failures are written to `out` as `error: ...`; only a failure to write is
    /// returned.
    pub fn run_line<P, W>(&mut self, line: &str, credentials: &mut P, out: &mut W) -> io::Result<Flow>
    where
        P: Credentials + ?Sized,
        W: Write + ?Sized,
    {
        let outcome = match Command::parse(line) {
            Ok(Some(cmd)) => self.execute(cmd, credentials, out),
            Ok(None) => Ok(Flow::Continue),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(flow) => Ok(flow),
            Err(e) => {
                debug!("command failed: {:?}", e);
                writeln!(out, "error: {}", e)?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Runs one command.
    pub fn execute<P, W>(&mut self, cmd: Command, credentials: &mut P, out: &mut W) -> Result<Flow>
    where
        P: Credentials + ?Sized,
        W: Write + ?Sized,
    {
        match cmd {
            Command::Connect(server) => {
                self.connect(&server)?;
                writeln!(out, "connected to {}", server)?;
            }
            Command::Disconnect => {
                if self.session.is_connected() {
                    self.close();
                    writeln!(out, "disconnected")?;
                }
            }
            Command::Login => {
                self.session.login(self.config.mechanism, credentials)?;
                if let Some(user) = self.session.username() {
                    writeln!(out, "logged in as {}", user)?;
                }
            }
            Command::Select(mailbox) => {
                self.session.select_mailbox(&mailbox)?;
                writeln!(out, "selected {}", mailbox)?;
            }
            Command::Capability => {
                for capability in self.session.capabilities()? {
                    writeln!(out, "{}", capability)?;
                }
            }
            Command::Search(keywords) => {
                let handle = query::search(&mut self.session, &mut self.registry, &keywords)?;
                self.print_handle(handle, out)?;
            }
            Command::Sort { keys, search } => {
                let handle = query::sort(
                    &mut self.session,
                    &mut self.registry,
                    &keys,
                    Some(&search[..]),
                )?;
                self.print_handle(handle, out)?;
            }
            Command::List(None) => {
                let summary = self.registry.list();
                if summary.is_empty() {
                    writeln!(out, "no saved searches")?;
                }
                for (handle, size) in summary {
                    writeln!(out, "{}: {} messages", handle, size)?;
                }
            }
            Command::List(Some(handle)) => {
                let seqs = self.registry.describe(handle)?;
                writeln!(out, "{}: {}", handle, iter_join(seqs, " "))?;
            }
            Command::Uniq {
                handle,
                report_only,
            } => {
                let options = self.config.dedup_options(report_only);
                let mut progress_err = None;
                let report = collapse_duplicates(
                    &mut self.session,
                    &mut self.registry,
                    handle,
                    &options,
                    &mut |percent| {
                        if progress_err.is_none() {
                            if let Err(e) = writeln!(out, "{}%", percent) {
                                progress_err = Some(e);
                            }
                        }
                    },
                )?;
                if let Some(e) = progress_err {
                    return Err(e.into());
                }
                print_report(&report, out)?;
            }
            Command::Flags { op, flags, handle } => {
                let outcome = set_flags(
                    &mut self.session,
                    &mut self.registry,
                    handle,
                    op,
                    &flags,
                    self.config.batch_size,
                )?;
                if outcome.stores > 0 {
                    writeln!(
                        out,
                        "{} on {} messages in {} batches",
                        op, outcome.messages, outcome.stores
                    )?;
                }
            }
            Command::Delete(handle) => {
                self.registry.delete(handle)?;
                writeln!(out, "deleted {}", handle)?;
            }
            Command::Expunge => {
                let removed = self.session.expunge()?;
                writeln!(out, "expunged {} messages", removed)?;
            }
            Command::Help => {
                let width = USAGE.iter().map(|(usage, _)| usage.len()).max().unwrap_or(0);
                for (usage, about) in USAGE {
                    writeln!(out, "  {:width$}  {}", usage, about, width = width)?;
                }
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn print_handle<W: Write + ?Sized>(&self, handle: Handle, out: &mut W) -> Result<()> {
        let size = self.registry.get(handle)?.len();
        writeln!(out, "{}: {} messages", handle, size)?;
        Ok(())
    }
}

fn print_report<W: Write + ?Sized>(report: &DedupReport, out: &mut W) -> io::Result<()> {
    let verb = match report.mode {
        DedupMode::Flag => "flagged as deleted",
        DedupMode::Report => "found",
    };
    writeln!(
        out,
        "{} duplicates {} ({} pairs compared)",
        report.duplicates.len(),
        verb,
        report.pairs
    )?;
    if report.mode == DedupMode::Report && !report.duplicates.is_empty() {
        writeln!(out, "duplicates: {}", iter_join(&report.duplicates, " "))?;
    }
    Ok(())
}
