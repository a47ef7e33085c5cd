//! IMAP shell error types.

use std::io::Error as IoError;
use std::result;

use thiserror::Error;

use crate::registry::Handle;
use crate::Seq;

/// A convenience wrapper around `Result` for `imapsh::Error`.
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur while running a shell command.
///
/// None of these are fatal: the shell prints them and reads the next line.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The secure connection to the server could not be opened.
    #[error("failed to connect to {server}: {source}")]
    Connect {
        /// The server that was dialled.
        server: String,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },
    /// The server refused the credentials.
    #[error("authentication failed: {0}")]
    Auth(#[source] TransportError),
    /// A command was issued before the session reached the state it needs.
    #[error("{0}")]
    Precondition(Precondition),
    /// The server refused to select a mailbox.
    #[error("failed to select {mailbox}: {message}")]
    Select {
        /// The mailbox that was requested.
        mailbox: String,
        /// The server's explanation.
        message: String,
    },
    /// The server rejected a search or sort query.
    #[error("invalid query `{query}`: {message}")]
    Query {
        /// The keyword string as the user typed it.
        query: String,
        /// The server's explanation.
        message: String,
    },
    /// A flag name that has no counterpart in the IMAP system flags.
    #[error("unknown flag `{0}`")]
    UnknownFlag(String),
    /// No saved search exists under the given handle.
    #[error("no saved search with handle {0}")]
    NotFound(Handle),
    /// Duplicate detection stopped part-way through a result set.
    #[error("duplicate scan failed at message {message}: {source}")]
    Dup {
        /// The message being fetched or flagged when the walk stopped.
        message: Seq,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },
    /// Any other transport failure, such as a refused `STORE` or `EXPUNGE`.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A command line that does not match the command's usage.
    #[error("usage: {0}")]
    Usage(&'static str),
    /// A line whose first word names no command.
    #[error("unknown command `{0}`; try `help`")]
    UnknownCommand(String),
    /// An `io::Error` while prompting for credentials or writing output.
    #[error(transparent)]
    Io(#[from] IoError),
    /// An invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Session-ordering violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    /// The command needs an open connection.
    #[error("not connected")]
    NotConnected,
    /// `connect` was issued while a connection is open.
    #[error("already connected; disconnect first")]
    AlreadyConnected,
    /// `login` was issued on a session that is already authenticated.
    #[error("already logged in; disconnect first")]
    AlreadyLoggedIn,
    /// The command needs an authenticated session.
    #[error("must login first")]
    MustLogin,
    /// The command needs a selected mailbox.
    #[error("no mailbox selected")]
    NoMailbox,
}

impl From<Precondition> for Error {
    fn from(err: Precondition) -> Error {
        Error::Precondition(err)
    }
}

/// Errors reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered the command with a `NO` or `BAD` response.
    #[error("{0}")]
    Rejected(String),
    /// Any other failure reported by the IMAP client library.
    #[error(transparent)]
    Imap(imap::Error),
    /// The transport was used in a stage that does not support the call.
    #[error("{0}")]
    Unavailable(&'static str),
}

impl TransportError {
    /// The server's text for a rejected command, or the error rendered as text otherwise.
    pub fn server_message(&self) -> String {
        match *self {
            TransportError::Rejected(ref message) => message.clone(),
            ref e => e.to_string(),
        }
    }
}

impl From<imap::Error> for TransportError {
    fn from(err: imap::Error) -> TransportError {
        match err {
            imap::Error::No(no) => TransportError::Rejected(no.information),
            imap::Error::Bad(bad) => TransportError::Rejected(bad.information),
            e => TransportError::Imap(e),
        }
    }
}
