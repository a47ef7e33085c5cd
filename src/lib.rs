//! An interactive shell for working through an IMAP mailbox in bulk.
//!
//! Searches and sorts run on the server and their results are kept in a [`SearchRegistry`] under
//! small integer [`Handle`]s. Later commands consume a handle: [`batch::set_flags`] changes flags
//! on every saved message in bounded `STORE` chunks, and [`dedup::collapse_duplicates`] walks a
//! sorted set and marks adjacent messages that share an identifying header.
//!
//! # Usage
//!
//! The binary wires a [`Shell`] to real TLS connections and the terminal. The library can be
//! driven the same way with any [`Connector`](transport::Connector):
//!
//! ```no_run
//! use imapsh::client::ImapConnector;
//! use imapsh::config::Config;
//! use imapsh::session::Credentials;
//! use imapsh::{Flow, Shell};
//!
//! struct Fixed;
//!
//! impl Credentials for Fixed {
//!     fn username(&mut self) -> std::io::Result<String> {
//!         Ok("me@example.com".to_string())
//!     }
//!     fn password(&mut self) -> std::io::Result<String> {
//!         Ok("password".to_string())
//!     }
//! }
//!
//! let mut shell = Shell::new(ImapConnector::default(), Config::default());
//! let mut out = std::io::stdout();
//! for line in [
//!     "connect imap.example.com",
//!     "login",
//!     "select INBOX",
//!     "sort subject,date",
//!     "uniq -n 1",
//! ] {
//!     if shell.run_line(line, &mut Fixed, &mut out).unwrap() == Flow::Quit {
//!         break;
//!     }
//! }
//! shell.close();
//! ```

mod utils;

pub mod authenticator;
pub mod batch;
pub mod client;
pub mod command;
pub mod config;
pub mod dedup;
pub mod error;
pub mod flags;
pub mod query;
pub mod registry;
pub mod session;
pub mod shell;
pub mod sort;
pub mod transport;

pub use imap::types::Seq;

pub use crate::error::{Error, Result};
pub use crate::registry::{Handle, SearchRegistry};
pub use crate::shell::{Flow, Shell};

#[cfg(test)]
mod mock_stream;
#[cfg(test)]
mod testing;
