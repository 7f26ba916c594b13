use std::fmt;
use std::str::FromStr;

use crate::QueryError;

/// Identifier of one batch of scan files: a non-empty string of ASCII digits.
///
/// The value names both the scan subdirectory and the cache entry. It is never
/// interpreted as a calendar date, so `"1"` and `"20240101"` are equally valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey(String);

impl DateKey {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(DateKey(raw.to_string()))
        } else {
            Err(QueryError::InvalidDate(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DateKey {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateKey::parse(s)
    }
}

impl AsRef<str> for DateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
