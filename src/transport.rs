//! The mailbox operations the shell needs from an IMAP connection.
//!
//! The shell never speaks the protocol itself. It drives a [`Transport`], which the
//! [`client`](crate::client) module implements on top of the `imap` crate, and which tests replace
//! with a recording double.

use std::fmt;

use imap::types::Flag;

use crate::error::TransportError;
use crate::sort::SortKey;
use crate::Seq;

/// Result alias for transport calls.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Authentication mechanisms the shell can use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Mechanism {
    /// `AUTHENTICATE CRAM-MD5`; the password never crosses the wire.
    CramMd5,
    /// Plain `LOGIN` inside the TLS tunnel.
    Login,
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Mechanism::CramMd5 => write!(f, "CRAM-MD5"),
            Mechanism::Login => write!(f, "LOGIN"),
        }
    }
}

/// Whether a `STORE` adds or removes flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagOp {
    Add,
    Remove,
}

impl fmt::Display for FlagOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FlagOp::Add => write!(f, "+FLAGS"),
            FlagOp::Remove => write!(f, "-FLAGS"),
        }
    }
}

/// A live connection to one IMAP server.
///
/// All calls are blocking round-trips without a client-side timeout.
pub trait Transport {
    /// Authenticates with `user` and `password` using `mechanism`.
    fn authenticate(
        &mut self,
        mechanism: Mechanism,
        user: &str,
        password: &str,
    ) -> TransportResult<()>;

    /// Selects `mailbox` for subsequent message commands.
    fn select(&mut self, mailbox: &str) -> TransportResult<()>;

    /// Runs `SEARCH` with the given criteria text.
    fn search(&mut self, query: &str) -> TransportResult<Vec<Seq>>;

    /// Runs `SORT` with the given sort keys, charset and search criteria text.
    fn sort(&mut self, keys: &[SortKey], charset: &str, query: &str) -> TransportResult<Vec<Seq>>;

    /// Fetches the raw text of `field` from the header of message `seq`, without setting
    /// `\Seen`. `None` means the message has no such header.
    fn fetch_header(&mut self, seq: Seq, field: &str) -> TransportResult<Option<String>>;

    /// Adds or removes `flags` on every message in `seqs` with a single `STORE`.
    fn store(&mut self, seqs: &[Seq], op: FlagOp, flags: &[Flag<'static>]) -> TransportResult<()>;

    /// Permanently removes the messages marked `\Deleted`, returning how many went.
    fn expunge(&mut self) -> TransportResult<usize>;

    /// The server's advertised capabilities.
    fn capabilities(&mut self) -> TransportResult<Vec<String>>;

    /// Ends the IMAP session.
    fn logout(&mut self) -> TransportResult<()>;
}

/// Opens [`Transport`]s.
pub trait Connector {
    type Transport: Transport;

    /// Opens a secure connection to `host` on `port` and reads the greeting.
    fn connect(&self, host: &str, port: u16) -> TransportResult<Self::Transport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_ops() {
        assert_eq!(FlagOp::Add.to_string(), "+FLAGS");
        assert_eq!(FlagOp::Remove.to_string(), "-FLAGS");
    }

    #[test]
    fn mechanism_names() {
        assert_eq!(Mechanism::CramMd5.to_string(), "CRAM-MD5");
        assert_eq!(Mechanism::Login.to_string(), "LOGIN");
    }
}
