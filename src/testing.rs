//! Recording doubles for the [`Transport`] and [`Connector`] traits.

use std::collections::HashMap;

use imap::types::Flag;

use crate::error::TransportError;
use crate::session::Credentials;
use crate::sort::SortKey;
use crate::transport::{Connector, FlagOp, Mechanism, Transport, TransportResult};
use crate::Seq;

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Authenticate(Mechanism, String, String),
    Select(String),
    Search(String),
    Sort(Vec<SortKey>, String, String),
    Fetch(Seq, String),
    Store(Vec<Seq>, FlagOp, Vec<Flag<'static>>),
    Expunge,
    Capabilities,
    Logout,
}

/// A transport that answers from canned data and records what it was asked.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub calls: Vec<Call>,
    pub refuse_auth: bool,
    pub missing_mailboxes: Vec<String>,
    /// Answer for every search and sort; `Err` text is returned as a server rejection.
    pub results: Option<Result<Vec<Seq>, String>>,
    /// Header text per message; messages not present have no such header.
    pub headers: HashMap<Seq, String>,
    /// Drop the connection on every search and sort.
    pub connection_lost: bool,
    /// Fail the fetch of this message.
    pub fail_fetch: Option<Seq>,
    /// Fail the nth (0-based) store call.
    pub fail_store: Option<usize>,
    pub expunged: usize,
}

impl MockTransport {
    pub fn with_results(results: Vec<Seq>) -> Self {
        MockTransport {
            results: Some(Ok(results)),
            ..Default::default()
        }
    }

    pub fn stores(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Store(..)))
            .collect()
    }

    pub fn fetches(&self) -> Vec<Seq> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Fetch(seq, _) => Some(*seq),
                _ => None,
            })
            .collect()
    }

    fn answer(&self) -> TransportResult<Vec<Seq>> {
        if self.connection_lost {
            return Err(TransportError::Imap(imap::Error::ConnectionLost));
        }
        match self.results {
            Some(Ok(ref seqs)) => Ok(seqs.clone()),
            Some(Err(ref message)) => Err(TransportError::Rejected(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

impl Transport for MockTransport {
    fn authenticate(
        &mut self,
        mechanism: Mechanism,
        user: &str,
        password: &str,
    ) -> TransportResult<()> {
        self.calls.push(Call::Authenticate(
            mechanism,
            user.to_string(),
            password.to_string(),
        ));
        if self.refuse_auth {
            Err(TransportError::Rejected(
                "[AUTHENTICATIONFAILED] Authentication failed.".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn select(&mut self, mailbox: &str) -> TransportResult<()> {
        self.calls.push(Call::Select(mailbox.to_string()));
        if self.missing_mailboxes.iter().any(|m| m == mailbox) {
            Err(TransportError::Rejected(format!(
                "Mailbox doesn't exist: {}",
                mailbox
            )))
        } else {
            Ok(())
        }
    }

    fn search(&mut self, query: &str) -> TransportResult<Vec<Seq>> {
        self.calls.push(Call::Search(query.to_string()));
        self.answer()
    }

    fn sort(&mut self, keys: &[SortKey], charset: &str, query: &str) -> TransportResult<Vec<Seq>> {
        self.calls.push(Call::Sort(
            keys.to_vec(),
            charset.to_string(),
            query.to_string(),
        ));
        self.answer()
    }

    fn fetch_header(&mut self, seq: Seq, field: &str) -> TransportResult<Option<String>> {
        self.calls.push(Call::Fetch(seq, field.to_string()));
        if self.fail_fetch == Some(seq) {
            return Err(TransportError::Unavailable("connection reset"));
        }
        Ok(self.headers.get(&seq).cloned())
    }

    fn store(&mut self, seqs: &[Seq], op: FlagOp, flags: &[Flag<'static>]) -> TransportResult<()> {
        let n = self.stores().len();
        self.calls
            .push(Call::Store(seqs.to_vec(), op, flags.to_vec()));
        if self.fail_store == Some(n) {
            return Err(TransportError::Rejected("STORE failed".to_string()));
        }
        Ok(())
    }

    fn expunge(&mut self) -> TransportResult<usize> {
        self.calls.push(Call::Expunge);
        Ok(self.expunged)
    }

    fn capabilities(&mut self) -> TransportResult<Vec<String>> {
        self.calls.push(Call::Capabilities);
        Ok(vec!["AUTH=CRAM-MD5".to_string(), "IMAP4rev1".to_string(), "SORT".to_string()])
    }

    fn logout(&mut self) -> TransportResult<()> {
        self.calls.push(Call::Logout);
        Ok(())
    }
}

/// Hands out fresh [`MockTransport`]s, or refuses to connect.
#[derive(Debug, Default)]
pub struct MockConnector {
    refuse: Option<String>,
}

impl MockConnector {
    pub fn refusing(reason: &str) -> Self {
        MockConnector {
            refuse: Some(reason.to_string()),
        }
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    fn connect(&self, _host: &str, _port: u16) -> TransportResult<MockTransport> {
        match self.refuse {
            Some(ref reason) => Err(TransportError::Rejected(reason.clone())),
            None => Ok(MockTransport::default()),
        }
    }
}

/// Credentials known up front.
pub struct StaticCredentials {
    user: String,
    password: String,
}

impl StaticCredentials {
    pub fn new(user: &str, password: &str) -> Self {
        StaticCredentials {
            user: user.to_string(),
            password: password.to_string(),
        }
    }
}

impl Credentials for StaticCredentials {
    fn username(&mut self) -> std::io::Result<String> {
        Ok(self.user.clone())
    }

    fn password(&mut self) -> std::io::Result<String> {
        Ok(self.password.clone())
    }
}
