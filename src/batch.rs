//! Flag changes applied across a saved result set, in bounded chunks.
//!
//! Servers refuse command lines past some length, so a result set is never sent as one
//! `STORE`. It is split into consecutive chunks of at most the batch size, in the set's order.

use log::{debug, info};

use crate::error::Result;
use crate::flags::parse_flags;
use crate::registry::{Handle, SearchRegistry};
use crate::session::Session;
use crate::transport::{FlagOp, Transport};

/// The largest number of messages named in one `STORE`.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// What a completed [`set_flags`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagOutcome {
    /// Messages whose flags were changed.
    pub messages: usize,
    /// `STORE` commands sent.
    pub stores: usize,
}

/// Adds or removes `names` on every message saved under `handle`, then deletes the handle.
///
/// Every name is checked before anything is sent. An empty `names` does nothing and keeps the
/// handle. If a chunk fails the handle is kept; chunks already stored stay stored.
pub fn set_flags<T: Transport, S: AsRef<str>>(
    session: &mut Session<T>,
    registry: &mut SearchRegistry,
    handle: Handle,
    op: FlagOp,
    names: &[S],
    batch_size: usize,
) -> Result<FlagOutcome> {
    let seqs = registry.get(handle)?;
    if names.is_empty() {
        return Ok(FlagOutcome {
            messages: 0,
            stores: 0,
        });
    }
    let flags = parse_flags(names)?;
    let transport = session.selected()?;

    let total = seqs.chunks(batch_size.max(1)).len();
    for (i, chunk) in seqs.chunks(batch_size.max(1)).enumerate() {
        debug!("{} chunk {}/{} ({} messages)", op, i + 1, total, chunk.len());
        transport.store(chunk, op, &flags)?;
    }

    let messages = seqs.len();
    registry.delete(handle)?;
    info!("{} on {} messages from handle {}", op, messages, handle);
    Ok(FlagOutcome {
        messages,
        stores: total,
    })
}
