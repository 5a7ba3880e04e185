//! Dotted-numeric version ordering.
//!
//! "Find the latest of N released versions" must order numerically per
//! dot segment — lexicographic ordering silently misorders `9` vs `10`.
//! Full semver strings take the semver fast path; anything else falls
//! back to a lenient parse that keeps the leading digits of every dot
//! segment and treats missing segments as zero.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::Version;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedVersion {
    numbers: Vec<u64>,
    original: String,
}

impl FromStr for DottedVersion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let numbers = match Version::parse(s) {
            Ok(v) => vec![v.major, v.minor, v.patch],
            Err(_) => s
                .split('.')
                .map(|segment| {
                    let digits: String =
                        segment.chars().take_while(char::is_ascii_digit).collect();
                    digits.parse().unwrap_or(0)
                })
                .collect(),
        };
        Ok(Self {
            numbers,
            original: s.to_string(),
        })
    }
}

impl fmt::Display for DottedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl DottedVersion {
    pub fn as_str(&self) -> &str {
        &self.original
    }
}

impl Ord for DottedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.numbers.len().max(other.numbers.len());
        for i in 0..len {
            let a = self.numbers.get(i).copied().unwrap_or(0);
            let b = other.numbers.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        self.original.cmp(&other.original)
    }
}

impl PartialOrd for DottedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pick the highest version by dotted-numeric ordering.
pub fn latest<I>(versions: I) -> Option<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    versions
        .into_iter()
        .map(|v| {
            v.as_ref()
                .parse::<DottedVersion>()
                .unwrap_or_else(|never| match never {})
        })
        .max()
        .map(|v| v.original)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ordering_beats_lexicographic() {
        assert_eq!(latest(["9", "10", "2"]), Some("10".to_string()));
    }

    #[test]
    fn semver_fast_path() {
        assert_eq!(
            latest(["30.0.2", "30.0.3", "29.0.9"]),
            Some("30.0.3".to_string())
        );
    }

    #[test]
    fn partial_versions_pad_with_zero() {
        assert_eq!(latest(["9.1", "9.1.1", "9"]), Some("9.1.1".to_string()));
    }

    #[test]
    fn suffixed_segments_keep_leading_digits() {
        assert_eq!(
            latest(["28.0.0-rc1", "28.0.1"]),
            Some("28.0.1".to_string())
        );
    }

    #[test]
    fn empty_iterator_has_no_latest() {
        assert_eq!(latest(Vec::<String>::new()), None);
    }
}
