//! The `CRAM-MD5` challenge-response mechanism from [RFC
//! 2195](https://tools.ietf.org/html/rfc2195).
//!
//! The server sends a unique challenge; the client answers with its user name and the hex
//! HMAC-MD5 of the challenge keyed by the shared secret, so the password itself never crosses the
//! wire.

use imap::Authenticator;

const BLOCK_SIZE: usize = 64;

/// Answers a `CRAM-MD5` challenge for one user.
pub struct CramMd5<'a> {
    user: &'a str,
    secret: &'a str,
}

impl<'a> CramMd5<'a> {
    pub fn new(user: &'a str, secret: &'a str) -> Self {
        CramMd5 { user, secret }
    }
}

impl<'a> Authenticator for CramMd5<'a> {
    type Response = String;

    fn process(&self, challenge: &[u8]) -> Self::Response {
        let digest = hmac_md5(self.secret.as_bytes(), challenge);
        format!("{} {:x}", self.user, digest)
    }
}

/// HMAC (RFC 2104) over MD5.
fn hmac_md5(key: &[u8], message: &[u8]) -> md5::Digest {
    let mut block = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        block[..16].copy_from_slice(&md5::compute(key).0);
    } else {
        block[..key.len()].copy_from_slice(key);
    }

    let mut inner = md5::Context::new();
    inner.consume(block.iter().map(|b| b ^ 0x36).collect::<Vec<u8>>());
    inner.consume(message);
    let inner = inner.compute();

    let mut outer = md5::Context::new();
    outer.consume(block.iter().map(|b| b ^ 0x5c).collect::<Vec<u8>>());
    outer.consume(inner.0);
    outer.compute()
}
