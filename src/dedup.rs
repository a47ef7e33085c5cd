//! Collapsing of adjacent duplicate messages in a saved result set.
//!
//! The walk compares each message's de-duplication key with its successor's and marks the earlier
//! one of every equal pair, so each run of equal keys keeps only its last message. Only
//! neighbours are compared: sort the set by the key first to catch every duplicate.
//!
//! Fetching a key is a network round-trip, so each key is fetched once. The key fetched as "next"
//! for one pair is carried over as "current" for the following pair by [`Lookahead`].

use std::fmt;
use std::mem;

use imap::types::Flag;
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;

use crate::error::{Error, Result};
use crate::registry::{Handle, SearchRegistry};
use crate::session::Session;
use crate::transport::{FlagOp, Transport};
use crate::Seq;

/// Header used as the de-duplication key unless configured otherwise.
pub const DEFAULT_KEY_HEADER: &str = "Message-ID";

lazy_static! {
    static ref FOLDED_LINE: Regex = Regex::new(r"\r?\n[ \t]+").unwrap();
}

/// What happens to the earlier message of a duplicate pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum DedupMode {
    /// Mark it `\Deleted`, in batches.
    Flag,
    /// Only report it.
    Report,
}

impl fmt::Display for DedupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DedupMode::Flag => write!(f, "flag"),
            DedupMode::Report => write!(f, "report"),
        }
    }
}

/// How to run a collapse.
#[derive(Debug, Clone)]
pub struct DedupOptions {
    pub mode: DedupMode,
    /// Header whose value identifies a message.
    pub header: String,
    /// Largest number of messages flagged per `STORE`.
    pub batch_size: usize,
}

/// A message's de-duplication key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupKey {
    Present(String),
    /// The message has no usable key header and matches nothing.
    Missing,
}

impl DedupKey {
    /// Extracts `field` from raw header text, unfolding continuation lines.
    pub fn from_header(raw: Option<&str>, field: &str) -> DedupKey {
        let raw = match raw {
            Some(raw) => raw,
            None => return DedupKey::Missing,
        };
        let unfolded = FOLDED_LINE.replace_all(raw, " ");
        unfolded
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(field))
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .map_or(DedupKey::Missing, |value| DedupKey::Present(value.to_string()))
    }

    /// Whether two messages are duplicates. Messages without a key never are.
    pub fn matches(&self, other: &DedupKey) -> bool {
        match (self, other) {
            (DedupKey::Present(a), DedupKey::Present(b)) => a == b,
            _ => false,
        }
    }
}

/// The one-key cache carried between adjacent pairs.
#[derive(Debug, Default)]
pub enum Lookahead {
    /// Nothing fetched yet: the current key must come from the server.
    #[default]
    Empty,
    /// The previous pair's "next" key, which is this pair's "current" key.
    Cached(DedupKey),
}

impl Lookahead {
    /// The current pair's first key, from the cache or else from `fetch`.
    pub fn take_or_fetch<F>(&mut self, fetch: F) -> Result<DedupKey>
    where
        F: FnOnce() -> Result<DedupKey>,
    {
        match mem::take(self) {
            Lookahead::Cached(key) => Ok(key),
            Lookahead::Empty => fetch(),
        }
    }

    /// Keeps `key` for the next pair.
    pub fn carry(&mut self, key: DedupKey) {
        *self = Lookahead::Cached(key);
    }
}

/// Emits whole percentages, each at most once and only when they advance.
#[derive(Debug)]
pub struct ProgressMeter {
    total: usize,
    last: u32,
}

impl ProgressMeter {
    pub fn new(total: usize) -> Self {
        ProgressMeter { total, last: 0 }
    }

    /// Records `done` units of work and returns the new percentage if it has advanced.
    pub fn update(&mut self, done: usize) -> Option<u32> {
        if self.total == 0 {
            return None;
        }
        let percent = (done.min(self.total) * 100 / self.total) as u32;
        if percent > self.last {
            self.last = percent;
            Some(percent)
        } else {
            None
        }
    }
}

/// What a completed collapse did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupReport {
    pub mode: DedupMode,
    /// Adjacent pairs compared.
    pub pairs: usize,
    /// Header fetches issued.
    pub fetches: usize,
    /// The earlier message of every duplicate pair, in walk order.
    pub duplicates: Vec<Seq>,
}

/// Walks the set saved under `handle` and flags or reports adjacent duplicates.
///
/// `progress` receives whole percentages of pairs compared. The handle is deleted when the walk
/// completes; a transport failure stops the walk and keeps the handle.
pub fn collapse_duplicates<T: Transport>(
    session: &mut Session<T>,
    registry: &mut SearchRegistry,
    handle: Handle,
    options: &DedupOptions,
    progress: &mut dyn FnMut(u32),
) -> Result<DedupReport> {
    let seqs = registry.get(handle)?.to_vec();
    let mut report = DedupReport {
        mode: options.mode,
        pairs: seqs.len().saturating_sub(1),
        fetches: 0,
        duplicates: Vec::new(),
    };
    if seqs.len() < 2 {
        registry.delete(handle)?;
        return Ok(report);
    }

    let transport = session.selected()?;
    let batch_size = options.batch_size.max(1);
    let mut lookahead = Lookahead::Empty;
    let mut meter = ProgressMeter::new(report.pairs);
    let mut pending: Vec<Seq> = Vec::new();

    for (i, pair) in seqs.windows(2).enumerate() {
        let current = lookahead.take_or_fetch(|| {
            fetch_key(transport, pair[0], &options.header, &mut report.fetches)
        })?;
        let next = fetch_key(transport, pair[1], &options.header, &mut report.fetches)?;
        if current.matches(&next) {
            report.duplicates.push(pair[0]);
            if options.mode == DedupMode::Flag {
                pending.push(pair[0]);
                if pending.len() == batch_size {
                    flag_deleted(transport, &pending)?;
                    pending.clear();
                }
            }
        }
        lookahead.carry(next);
        if let Some(percent) = meter.update(i + 1) {
            progress(percent);
        }
    }
    flag_deleted(transport, &pending)?;

    registry.delete(handle)?;
    info!(
        "{} {} duplicates among {} messages from handle {}",
        match options.mode {
            DedupMode::Flag => "flagged",
            DedupMode::Report => "found",
        },
        report.duplicates.len(),
        seqs.len(),
        handle
    );
    Ok(report)
}

fn fetch_key<T: Transport>(
    transport: &mut T,
    seq: Seq,
    header: &str,
    fetches: &mut usize,
) -> Result<DedupKey> {
    *fetches += 1;
    let raw = transport
        .fetch_header(seq, header)
        .map_err(|source| Error::Dup {
            message: seq,
            source,
        })?;
    debug!("fetched {} of message {}", header, seq);
    Ok(DedupKey::from_header(raw.as_deref(), header))
}

fn flag_deleted<T: Transport>(transport: &mut T, seqs: &[Seq]) -> Result<()> {
    if seqs.is_empty() {
        return Ok(());
    }
    transport
        .store(seqs, FlagOp::Add, &[Flag::Deleted])
        .map_err(|source| Error::Dup {
            message: seqs[0],
            source,
        })
}
