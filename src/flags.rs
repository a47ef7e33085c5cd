//! Flag names accepted by the `flags` command.
//!
//! Users name the [RFC 3501 section 2.3.2](https://tools.ietf.org/html/rfc3501#section-2.3.2)
//! system flags without their backslash and in any case (`seen`, `Deleted`, `\FLAGGED`). `\Recent`
//! cannot be altered by a client and `\*` is not a flag at all, so neither is accepted.

use imap::types::Flag;

use crate::error::{Error, Result};
use crate::transport::FlagOp;
use crate::utils::iter_join;

/// Translates one user-supplied flag name into the IMAP flag it stands for.
pub fn parse_flag(name: &str) -> Result<Flag<'static>> {
    let bare = name.strip_prefix('\\').unwrap_or(name);
    match bare.to_ascii_lowercase().as_str() {
        "seen" => Ok(Flag::Seen),
        "answered" => Ok(Flag::Answered),
        "flagged" => Ok(Flag::Flagged),
        "deleted" => Ok(Flag::Deleted),
        "draft" => Ok(Flag::Draft),
        _ => Err(Error::UnknownFlag(name.to_string())),
    }
}

/// Translates every name, failing on the first unknown one. Repeated flags are kept once.
pub fn parse_flags<I, S>(names: I) -> Result<Vec<Flag<'static>>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut flags = Vec::new();
    for name in names {
        let flag = parse_flag(name.as_ref())?;
        if !flags.contains(&flag) {
            flags.push(flag);
        }
    }
    Ok(flags)
}

/// The data item of a `STORE` command, e.g. `+FLAGS (\Seen \Flagged)`.
pub fn store_query(op: FlagOp, flags: &[Flag<'_>]) -> String {
    format!("{} ({})", op, iter_join(flags, " "))
}
