//! Document kinds and formatted document numbers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of numbered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Price quote (`COT`).
    Quote,
    /// Invoice (`FAC`).
    Invoice,
}

impl DocumentKind {
    /// Returns the number prefix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Quote => "COT",
            Self::Invoice => "FAC",
        }
    }

    /// Returns the storage key of the counter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Invoice => "invoice",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "COT" => Some(Self::Quote),
            "FAC" => Some(Self::Invoice),
            _ => None,
        }
    }
}

/// A formatted document number such as `COT-2026-0007`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentNumber {
    /// Document kind.
    pub kind: DocumentKind,
    /// Calendar year of issue.
    pub year: i32,
    /// 1-based sequence within (kind, year).
    pub sequence: u32,
}

impl DocumentNumber {
    /// Creates a document number.
    #[must_use]
    pub const fn new(kind: DocumentKind, year: i32, sequence: u32) -> Self {
        Self {
            kind,
            year,
            sequence,
        }
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:04}",
            self.kind.prefix(),
            self.year,
            self.sequence
        )
    }
}

/// Error returned when a string is not a document number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid document number: {0}")]
pub struct ParseDocumentNumberError(pub String);

impl FromStr for DocumentNumber {
    type Err = ParseDocumentNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDocumentNumberError(s.to_string());
        let mut parts = s.splitn(3, '-');
        let (Some(prefix), Some(year), Some(seq)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let kind = DocumentKind::from_prefix(prefix).ok_or_else(invalid)?;
        if year.len() != 4 || seq.len() < 4 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let sequence = seq.parse::<u32>().map_err(|_| invalid())?;
        if sequence == 0 {
            return Err(invalid());
        }

        Ok(Self::new(kind, year, sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_format() {
        assert_eq!(
            DocumentNumber::new(DocumentKind::Quote, 2026, 7).to_string(),
            "COT-2026-0007"
        );
        assert_eq!(
            DocumentNumber::new(DocumentKind::Invoice, 2025, 1234).to_string(),
            "FAC-2025-1234"
        );
    }

    #[test]
    fn test_format_grows_past_four_digits() {
        assert_eq!(
            DocumentNumber::new(DocumentKind::Invoice, 2026, 12345).to_string(),
            "FAC-2026-12345"
        );
    }

    #[test]
    fn test_parse() {
        let number: DocumentNumber = "FAC-2026-0042".parse().unwrap();
        assert_eq!(number, DocumentNumber::new(DocumentKind::Invoice, 2026, 42));
    }

    #[rstest]
    #[case("")]
    #[case("COT-2026")]
    #[case("XYZ-2026-0001")]
    #[case("COT-26-0001")]
    #[case("COT-2026-01")]
    #[case("COT-2026-0000")]
    #[case("COT-2026-00a1")]
    fn test_parse_rejects(#[case] input: &str) {
        assert!(input.parse::<DocumentNumber>().is_err());
    }
}
