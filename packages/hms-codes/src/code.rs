use crate::error::Error;

/// Longest suffix accepted when reading existing codes. Keeps every suffix inside
/// the range of a PostgreSQL `BIGINT`.
pub const MAX_SUFFIX_DIGITS: usize = 18;

///
/// Human-readable sequential codes such as `ER-01`.
///
/// A code is a fixed prefix followed by a decimal suffix that is zero-padded to a
/// minimum width. Suffixes wider than the width are rendered in full, so `ER-99` is
/// followed by `ER-100`.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeFormat {
    prefix: String,
    width: usize,
}

impl CodeFormat {
    pub fn new(prefix: &str, width: usize) -> Self {
        Self {
            prefix: prefix.to_owned(),
            width,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of characters in the prefix, as counted by PostgreSQL string functions
    pub fn prefix_len(&self) -> usize {
        self.prefix.chars().count()
    }

    pub fn format(&self, suffix: u64) -> String {
        format!("{}{:0width$}", self.prefix, suffix, width = self.width)
    }

    ///
    /// Returns the numeric suffix of `code`.
    ///
    /// `None` unless `code` starts with the prefix and the rest is 1 to
    /// `MAX_SUFFIX_DIGITS` ASCII digits. Signs, whitespace and trailing characters are rejected.
    ///
    pub fn parse_suffix(&self, code: &str) -> Option<u64> {
        let suffix = code.strip_prefix(self.prefix.as_str())?;

        if suffix.is_empty()
            || suffix.len() > MAX_SUFFIX_DIGITS
            || !suffix.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        suffix.parse().ok()
    }

    /// Highest well-formed suffix among `codes`. Malformed codes are skipped.
    pub fn max_suffix<'a, I>(&self, codes: I) -> Option<u64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        codes
            .into_iter()
            .filter_map(|code| self.parse_suffix(code))
            .max()
    }

    /// Code that follows `max`, or the first code when there is none
    pub fn next_code(&self, max: Option<u64>) -> Result<String, Error> {
        let next = max
            .unwrap_or(0)
            .checked_add(1)
            .filter(|n| n.to_string().len() <= MAX_SUFFIX_DIGITS)
            .ok_or_else(|| Error::SuffixOverflow {
                prefix: self.prefix.to_owned(),
            })?;

        Ok(self.format(next))
    }
}
