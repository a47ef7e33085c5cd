//! Connection, authentication and mailbox-selection state.
//!
//! A session moves strictly through disconnected, connected, authenticated and mailbox-selected.
//! A failed step only resets the state it was trying to establish.

use log::{info, warn};

use crate::error::{Error, Precondition, Result};
use crate::transport::{Connector, Mechanism, Transport};

/// Supplies credentials when `login` runs.
pub trait Credentials {
    fn username(&mut self) -> std::io::Result<String>;
    fn password(&mut self) -> std::io::Result<String>;
}

/// Everything the shell knows about its one connection.
pub struct Session<T: Transport> {
    connection: Option<T>,
    server: Option<String>,
    username: Option<String>,
    mailbox: Option<String>,
}

impl<T: Transport> Default for Session<T> {
    fn default() -> Self {
        Session {
            connection: None,
            server: None,
            username: None,
            mailbox: None,
        }
    }
}

impl<T: Transport> Session<T> {
    /// A disconnected session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn mailbox(&self) -> Option<&str> {
        self.mailbox.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Opens a secure connection to `server`.
    pub fn connect<C>(&mut self, connector: &C, server: &str, port: u16) -> Result<()>
    where
        C: Connector<Transport = T>,
    {
        if self.connection.is_some() {
            return Err(Precondition::AlreadyConnected.into());
        }
        let conn = connector
            .connect(server, port)
            .map_err(|source| Error::Connect {
                server: server.to_string(),
                source,
            })?;
        self.connection = Some(conn);
        self.server = Some(server.to_string());
        Ok(())
    }

    /// Logs out and forgets the connection and everything downstream of it.
    ///
    /// Safe to call when already disconnected.
    pub fn disconnect(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            if let Err(e) = conn.logout() {
                warn!("logout failed: {}", e);
            }
        }
        self.server = None;
        self.username = None;
        self.mailbox = None;
    }

    /// Authenticates with credentials from `credentials`.
    pub fn login<P: Credentials + ?Sized>(
        &mut self,
        mechanism: Mechanism,
        credentials: &mut P,
    ) -> Result<()> {
        if self.connection.is_none() {
            return Err(Precondition::NotConnected.into());
        }
        if self.username.is_some() {
            return Err(Precondition::AlreadyLoggedIn.into());
        }
        let user = credentials.username()?;
        let password = credentials.password()?;
        let conn = self.transport()?;
        conn.authenticate(mechanism, &user, &password)
            .map_err(Error::Auth)?;
        info!("authenticated as {} using {}", user, mechanism);
        self.username = Some(user);
        Ok(())
    }

    /// Selects `name`. A refused select leaves no mailbox selected.
    pub fn select_mailbox(&mut self, name: &str) -> Result<()> {
        if self.username.is_none() {
            self.mailbox = None;
            return Err(Precondition::MustLogin.into());
        }
        let result = self.transport()?.select(name);
        match result {
            Ok(()) => {
                info!("selected {}", name);
                self.mailbox = Some(name.to_string());
                Ok(())
            }
            Err(e) => {
                self.mailbox = None;
                Err(Error::Select {
                    mailbox: name.to_string(),
                    message: e.server_message(),
                })
            }
        }
    }

    /// The `user@server:mailbox` prompt, with absent parts left out.
    pub fn prompt(&self) -> String {
        let user = match self.username {
            Some(ref u) => format!("{}@", u),
            None => String::new(),
        };
        match (&self.server, &self.mailbox) {
            (None, _) => String::new(),
            (Some(server), None) => format!("{}{}", user, server),
            (Some(server), Some(mailbox)) => format!("{}{}:{}", user, server, mailbox),
        }
    }

    /// The transport, once connected.
    pub fn transport(&mut self) -> Result<&mut T> {
        self.connection
            .as_mut()
            .ok_or(Error::Precondition(Precondition::NotConnected))
    }

    /// The transport, once authenticated.
    pub fn authenticated(&mut self) -> Result<&mut T> {
        if self.username.is_none() {
            return Err(Precondition::MustLogin.into());
        }
        self.transport()
    }

    /// The transport, once a mailbox is selected.
    pub fn selected(&mut self) -> Result<&mut T> {
        if self.mailbox.is_none() {
            return Err(Precondition::NoMailbox.into());
        }
        self.transport()
    }

    /// Permanently removes messages marked `\Deleted` in the selected mailbox.
    pub fn expunge(&mut self) -> Result<usize> {
        Ok(self.selected()?.expunge()?)
    }

    /// The server's capabilities.
    pub fn capabilities(&mut self) -> Result<Vec<String>> {
        Ok(self.authenticated()?.capabilities()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockConnector, MockTransport, StaticCredentials};

    fn connected() -> Session<MockTransport> {
        let mut s = Session::new();
        s.connect(&MockConnector::default(), "imap.example.com", 993)
            .unwrap();
        s
    }

    fn logged_in() -> Session<MockTransport> {
        let mut s = connected();
        s.login(Mechanism::CramMd5, &mut StaticCredentials::new("jo", "pw"))
            .unwrap();
        s
    }

    #[test]
    fn prompt_follows_state() {
        let mut s: Session<MockTransport> = Session::new();
        assert_eq!(s.prompt(), "");
        s.connect(&MockConnector::default(), "host", 993).unwrap();
        assert_eq!(s.prompt(), "host");
        s.login(Mechanism::CramMd5, &mut StaticCredentials::new("user", "pw"))
            .unwrap();
        assert_eq!(s.prompt(), "user@host");
        s.select_mailbox("INBOX").unwrap();
        assert_eq!(s.prompt(), "user@host:INBOX");
    }

    #[test]
    fn failed_connect_stays_disconnected() {
        let mut s: Session<MockTransport> = Session::new();
        let connector = MockConnector::refusing("no route to host");
        match s.connect(&connector, "imap.example.com", 993) {
            Err(Error::Connect { server, source }) => {
                assert_eq!(server, "imap.example.com");
                assert_eq!(source.to_string(), "no route to host");
            }
            r => panic!("unexpected result: {:?}", r.err()),
        }
        assert!(!s.is_connected());
        assert_eq!(s.prompt(), "");
    }

    #[test]
    fn connect_twice() {
        let mut s = connected();
        assert!(matches!(
            s.connect(&MockConnector::default(), "other", 993),
            Err(Error::Precondition(Precondition::AlreadyConnected))
        ));
        assert_eq!(s.server(), Some("imap.example.com"));
    }

    #[test]
    fn login_requires_connection() {
        let mut s: Session<MockTransport> = Session::new();
        assert!(matches!(
            s.login(Mechanism::CramMd5, &mut StaticCredentials::new("a", "b")),
            Err(Error::Precondition(Precondition::NotConnected))
        ));
    }

    #[test]
    fn refused_login_leaves_username_unset() {
        let mut s = connected();
        s.transport().unwrap().refuse_auth = true;
        assert!(matches!(
            s.login(Mechanism::CramMd5, &mut StaticCredentials::new("jo", "bad")),
            Err(Error::Auth(_))
        ));
        assert_eq!(s.username(), None);
        assert!(s.is_connected());
    }

    #[test]
    fn login_uses_mechanism_and_credentials() {
        let mut s = logged_in();
        assert_eq!(
            s.transport().unwrap().calls,
            vec![Call::Authenticate(
                Mechanism::CramMd5,
                "jo".to_string(),
                "pw".to_string()
            )]
        );
    }

    #[test]
    fn second_login_does_not_prompt() {
        struct Counting(usize);
        impl Credentials for Counting {
            fn username(&mut self) -> std::io::Result<String> {
                self.0 += 1;
                Ok("jo".to_string())
            }
            fn password(&mut self) -> std::io::Result<String> {
                Ok("pw".to_string())
            }
        }

        let mut s = connected();
        let mut credentials = Counting(0);
        s.login(Mechanism::CramMd5, &mut credentials).unwrap();
        assert!(matches!(
            s.login(Mechanism::CramMd5, &mut credentials),
            Err(Error::Precondition(Precondition::AlreadyLoggedIn))
        ));
        assert_eq!(credentials.0, 1);
        assert_eq!(s.username(), Some("jo"));
        assert_eq!(s.transport().unwrap().calls.len(), 1);
    }

    #[test]
    fn select_before_login() {
        let mut s = connected();
        assert!(matches!(
            s.select_mailbox("INBOX"),
            Err(Error::Precondition(Precondition::MustLogin))
        ));
        assert_eq!(s.mailbox(), None);
        assert!(s.transport().unwrap().calls.is_empty());
    }

    #[test]
    fn select_before_connect() {
        let mut s: Session<MockTransport> = Session::new();
        assert!(matches!(
            s.select_mailbox("INBOX"),
            Err(Error::Precondition(Precondition::MustLogin))
        ));
        assert_eq!(s.mailbox(), None);
    }

    #[test]
    fn failed_select_clears_mailbox_but_not_user() {
        let mut s = logged_in();
        s.select_mailbox("INBOX").unwrap();
        s.transport()
            .unwrap()
            .missing_mailboxes
            .push("Archive".to_string());
        match s.select_mailbox("Archive") {
            Err(Error::Select { mailbox, message }) => {
                assert_eq!(mailbox, "Archive");
                assert_eq!(message, "Mailbox doesn't exist: Archive");
            }
            r => panic!("unexpected result: {:?}", r.err()),
        }
        assert_eq!(s.mailbox(), None);
        assert_eq!(s.username(), Some("jo"));
        assert_eq!(s.prompt(), "jo@imap.example.com");
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut s = logged_in();
        s.select_mailbox("INBOX").unwrap();
        s.disconnect();
        assert!(!s.is_connected());
        assert_eq!(s.prompt(), "");
        assert_eq!(s.username(), None);
        assert_eq!(s.mailbox(), None);
        s.disconnect();
        assert_eq!(s.prompt(), "");
    }

    #[test]
    fn expunge_requires_mailbox() {
        let mut s = logged_in();
        assert!(matches!(
            s.expunge(),
            Err(Error::Precondition(Precondition::NoMailbox))
        ));
        s.select_mailbox("INBOX").unwrap();
        s.transport().unwrap().expunged = 4;
        assert_eq!(s.expunge().unwrap(), 4);
    }
}
