//! Runs SEARCH and SORT against the selected mailbox and saves the results.

use log::debug;

use crate::error::{Error, Result, TransportError};
use crate::registry::{Handle, SearchRegistry};
use crate::session::Session;
use crate::sort::{SortKey, SORT_CHARSET};
use crate::transport::Transport;

/// Search criteria used when a sort names none.
pub const DEFAULT_SEARCH: &str = "ALL";

/// Searches the selected mailbox with `keywords` and saves the matches under a new handle.
///
/// A query the server rejects creates no handle.
pub fn search<T: Transport, S: AsRef<str>>(
    session: &mut Session<T>,
    registry: &mut SearchRegistry,
    keywords: &[S],
) -> Result<Handle> {
    let query = join(keywords);
    let found = session
        .selected()?
        .search(&query)
        .map_err(|e| query_error(&query, e))?;
    debug!("SEARCH {} matched {} messages", query, found.len());
    Ok(registry.add(found))
}

/// Sorts the messages matching `search_keys` (default `ALL`) by `sort_keys` and saves the
/// ordering under a new handle.
pub fn sort<T: Transport, S: AsRef<str>>(
    session: &mut Session<T>,
    registry: &mut SearchRegistry,
    sort_keys: &[SortKey],
    search_keys: Option<&[S]>,
) -> Result<Handle> {
    let query = match search_keys {
        Some(keys) if !keys.is_empty() => join(keys),
        _ => DEFAULT_SEARCH.to_string(),
    };
    let sorted = session
        .selected()?
        .sort(sort_keys, SORT_CHARSET, &query)
        .map_err(|e| query_error(&query, e))?;
    debug!("SORT {} matched {} messages", query, sorted.len());
    Ok(registry.add(sorted))
}

/// A server refusal is blamed on the query; anything else is a transport failure.
fn query_error(query: &str, err: TransportError) -> Error {
    match err {
        TransportError::Rejected(message) => Error::Query {
            query: query.to_string(),
            message,
        },
        e => Error::Transport(e),
    }
}

fn join<S: AsRef<str>>(keywords: &[S]) -> String {
    keywords
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}
