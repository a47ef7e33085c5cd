//! [`Transport`] over a real IMAP connection, built on the `imap` crate.

use std::io::{Read, Write};
use std::mem;

use imap::extensions::sort::{SortCharset, SortCriterion};
use imap::types::Flag;
use imap::{ClientBuilder, ConnectionMode};
use imap_proto::types::Capability;
use log::{debug, info, warn};

use crate::authenticator::CramMd5;
use crate::error::TransportError;
use crate::flags::store_query;
use crate::sort::SortKey;
use crate::transport::{Connector, FlagOp, Mechanism, Transport, TransportResult};
use crate::utils::sequence_set;
use crate::Seq;

/// Opens implicit-TLS connections with [`ClientBuilder`].
#[derive(Debug, Default, Clone)]
pub struct ImapConnector {
    /// Print the IMAP conversation to stderr.
    pub debug: bool,
}

impl Connector for ImapConnector {
    type Transport = ImapTransport<imap::Connection>;

    fn connect(&self, host: &str, port: u16) -> TransportResult<Self::Transport> {
        debug!("opening TLS connection to {}:{}", host, port);
        let mut client = ClientBuilder::new(host, port)
            .mode(ConnectionMode::Tls)
            .connect()?;
        client.debug = self.debug;
        info!("connected to {}:{}", host, port);
        Ok(ImapTransport::new(client, self.debug))
    }
}

enum Stage<T: Read + Write> {
    Connected(imap::Client<T>),
    Authenticated(imap::Session<T>),
    Closed,
}

/// An IMAP connection that is either waiting to authenticate or carrying a session.
pub struct ImapTransport<T: Read + Write> {
    stage: Stage<T>,
    debug: bool,
}

impl<T: Read + Write> ImapTransport<T> {
    /// Wraps a client that has already read the server greeting.
    pub fn new(client: imap::Client<T>, debug: bool) -> Self {
        ImapTransport {
            stage: Stage::Connected(client),
            debug,
        }
    }

    fn session(&mut self) -> TransportResult<&mut imap::Session<T>> {
        match self.stage {
            Stage::Authenticated(ref mut session) => Ok(session),
            Stage::Connected(_) => Err(TransportError::Unavailable("not authenticated")),
            Stage::Closed => Err(TransportError::Unavailable("connection closed")),
        }
    }
}

impl<T: Read + Write> Transport for ImapTransport<T> {
    fn authenticate(
        &mut self,
        mechanism: Mechanism,
        user: &str,
        password: &str,
    ) -> TransportResult<()> {
        let client = match mem::replace(&mut self.stage, Stage::Closed) {
            Stage::Connected(client) => client,
            other => {
                self.stage = other;
                return Err(TransportError::Unavailable("already authenticated"));
            }
        };

        let result = match mechanism {
            Mechanism::CramMd5 => client.authenticate("CRAM-MD5", &CramMd5::new(user, password)),
            Mechanism::Login => client.login(user, password),
        };
        match result {
            Ok(mut session) => {
                session.debug = self.debug;
                self.stage = Stage::Authenticated(session);
                Ok(())
            }
            Err((e, client)) => {
                // the connection survives a refused login
                self.stage = Stage::Connected(client);
                Err(e.into())
            }
        }
    }

    fn select(&mut self, mailbox: &str) -> TransportResult<()> {
        let mailbox = self.session()?.select(mailbox)?;
        debug!("selected mailbox with {} messages", mailbox.exists);
        Ok(())
    }

    fn search(&mut self, query: &str) -> TransportResult<Vec<Seq>> {
        let found = self.session()?.search(query)?;
        let mut seqs: Vec<Seq> = found.into_iter().collect();
        seqs.sort_unstable();
        Ok(seqs)
    }

    fn sort(&mut self, keys: &[SortKey], charset: &str, query: &str) -> TransportResult<Vec<Seq>> {
        let criteria: Vec<SortCriterion<'static>> = keys.iter().map(|k| k.criterion()).collect();
        let charset = match charset {
            "UTF-8" => SortCharset::Utf8,
            "US-ASCII" => SortCharset::UsAscii,
            other => SortCharset::Custom(other.into()),
        };
        Ok(self.session()?.sort(&criteria, charset, query)?)
    }

    fn fetch_header(&mut self, seq: Seq, field: &str) -> TransportResult<Option<String>> {
        let query = format!("BODY.PEEK[HEADER.FIELDS ({})]", field);
        let fetches = self.session()?.fetch(seq.to_string(), query)?;
        let header = fetches
            .iter()
            .filter(|f| f.message == seq)
            .find_map(|f| f.header())
            .map(|h| String::from_utf8_lossy(h).into_owned());
        Ok(header)
    }

    fn store(&mut self, seqs: &[Seq], op: FlagOp, flags: &[Flag<'static>]) -> TransportResult<()> {
        if seqs.is_empty() {
            return Ok(());
        }
        self.session()?
            .store(sequence_set(seqs), store_query(op, flags))?;
        Ok(())
    }

    fn expunge(&mut self) -> TransportResult<usize> {
        let deleted = self.session()?.expunge()?;
        Ok(deleted.seqs().count())
    }

    fn capabilities(&mut self) -> TransportResult<Vec<String>> {
        let caps = self.session()?.capabilities()?;
        let mut names: Vec<String> = caps
            .iter()
            .map(|c| match c {
                Capability::Imap4rev1 => "IMAP4rev1".to_string(),
                Capability::Auth(mechanism) => format!("AUTH={}", mechanism),
                Capability::Atom(atom) => atom.to_string(),
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn logout(&mut self) -> TransportResult<()> {
        match mem::replace(&mut self.stage, Stage::Closed) {
            Stage::Authenticated(mut session) => session.logout().map_err(TransportError::from),
            Stage::Connected(_) => Ok(()),
            Stage::Closed => {
                warn!("logout on a closed connection");
                Ok(())
            }
        }
    }
}
