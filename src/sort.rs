//! Sort keys for the IMAP SORT extension specified in [RFC
//! 5256](https://tools.ietf.org/html/rfc5256#section-3).
//!
//! The shell takes its sort keys as one word: a comma-separated list of criteria, each optionally
//! prefixed with `-` to reverse it, e.g. `-date,subject`.

use std::str::FromStr;

use imap::extensions::sort::SortCriterion;

/// The charset sent with every SORT.
pub const SORT_CHARSET: &str = "UTF-8";

/// The defined sort criteria. If the associated header for a particular criterion is absent, it is
/// treated as the empty string, which collates before non-empty strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    /// Internal date and time of the message.
    Arrival,
    /// addr-mailbox of the first "cc" address.
    Cc,
    /// Sent date and time.
    Date,
    /// addr-mailbox of the first "From" address.
    From,
    /// Size of the message in octets.
    Size,
    /// Base subject text.
    Subject,
    /// addr-mailbox of the first "To" address.
    To,
}

impl SortField {
    fn criterion(self) -> SortCriterion<'static> {
        match self {
            SortField::Arrival => SortCriterion::Arrival,
            SortField::Cc => SortCriterion::Cc,
            SortField::Date => SortCriterion::Date,
            SortField::From => SortCriterion::From,
            SortField::Size => SortCriterion::Size,
            SortField::Subject => SortCriterion::Subject,
            SortField::To => SortCriterion::To,
        }
    }

    fn reversed(self) -> SortCriterion<'static> {
        match self {
            SortField::Arrival => SortCriterion::Reverse(&SortCriterion::Arrival),
            SortField::Cc => SortCriterion::Reverse(&SortCriterion::Cc),
            SortField::Date => SortCriterion::Reverse(&SortCriterion::Date),
            SortField::From => SortCriterion::Reverse(&SortCriterion::From),
            SortField::Size => SortCriterion::Reverse(&SortCriterion::Size),
            SortField::Subject => SortCriterion::Reverse(&SortCriterion::Subject),
            SortField::To => SortCriterion::Reverse(&SortCriterion::To),
        }
    }
}

impl FromStr for SortField {
    type Err = SortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use SortField::*;

        match s.to_ascii_lowercase().as_str() {
            "arrival" => Ok(Arrival),
            "cc" => Ok(Cc),
            "date" => Ok(Date),
            "from" => Ok(From),
            "size" => Ok(Size),
            "subject" => Ok(Subject),
            "to" => Ok(To),
            _ => Err(SortKeyError(s.to_string())),
        }
    }
}

/// One sort criterion, possibly reversed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub reverse: bool,
}

impl SortKey {
    /// The `imap` crate's rendition of this key.
    pub fn criterion(self) -> SortCriterion<'static> {
        if self.reverse {
            self.field.reversed()
        } else {
            self.field.criterion()
        }
    }

    /// Parses a comma-separated key list such as `-date,subject`.
    pub fn parse_list(s: &str) -> Result<Vec<SortKey>, SortKeyError> {
        s.split(',')
            .filter(|k| !k.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .and_then(|keys| {
                if keys.is_empty() {
                    Err(SortKeyError(s.to_string()))
                } else {
                    Ok(keys)
                }
            })
    }
}

impl FromStr for SortKey {
    type Err = SortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('-') {
            Some(rest) => Ok(SortKey {
                field: rest.parse().map_err(|_| SortKeyError(s.to_string()))?,
                reverse: true,
            }),
            None => Ok(SortKey {
                field: s.parse()?,
                reverse: false,
            }),
        }
    }
}

/// A sort key that names no known criterion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key `{0}`")]
pub struct SortKeyError(pub String);
