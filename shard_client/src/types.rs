use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::SequenceNumberError;

/// Position of a record within a shard.
///
/// Sequence numbers are decimal-encoded arbitrary-precision integers.
/// Real-world values exceed the 64-bit range, so the digits are kept in
/// their string encoding and compared numerically: leading zeros are
/// ignored, a longer digit string is greater, equal lengths compare
/// lexicographically.
#[derive(Clone, Debug)]
pub struct SequenceNumber(String);

impl SequenceNumber {
    pub fn new(digits: impl Into<String>) -> Result<Self, SequenceNumberError> {
        let digits = digits.into();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SequenceNumberError::InvalidDigits(digits));
        }
        Ok(Self(digits))
    }

    /// Canonical zero, the value of a caller that has not processed any
    /// record yet.
    pub fn zero() -> Self {
        Self("0".into())
    }

    pub fn is_zero(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn significant(&self) -> &str {
        let digits = self.0.trim_start_matches('0');
        if digits.is_empty() {
            "0"
        } else {
            digits
        }
    }
}

impl PartialEq for SequenceNumber {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for SequenceNumber {}

impl Hash for SequenceNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl Ord for SequenceNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }
}

impl PartialOrd for SequenceNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SequenceNumber {
    type Err = SequenceNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<u64> for SequenceNumber {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// One record retrieved from a shard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub data: Vec<u8>,
    pub sequence_number: SequenceNumber,
    pub partition_key: String,
}

/// Result of one retrieval call: the records plus the service-provided
/// cursor positioned immediately after them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordBatch {
    pub records: Vec<Record>,
    pub next_cursor: String,
}

/// Positioning mode for a cursor request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CursorPosition {
    /// Start immediately after the given sequence number.
    AfterSequenceNumber(SequenceNumber),
    /// Start at the newest available data.
    Latest,
}

/// A positioning request for one shard of one stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorRequest {
    pub stream_name: String,
    pub shard_id: String,
    pub position: CursorPosition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_numerically_not_lexicographically() {
        let nine: SequenceNumber = "9".parse().unwrap();
        let ten: SequenceNumber = "10".parse().unwrap();
        assert!(nine < ten);
    }

    #[test]
    fn ignores_leading_zeros() {
        let a: SequenceNumber = "007".parse().unwrap();
        let b: SequenceNumber = "7".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn compares_beyond_u64_range() {
        // 2^64 is 20 digits; these are well past it
        let small: SequenceNumber = "49590338271490256608559692538361571095921575".parse().unwrap();
        let large: SequenceNumber = "49590338271490256608559692538361571095921576".parse().unwrap();
        assert!(small < large);
        assert!(large > SequenceNumber::from(u64::MAX));
    }

    #[test]
    fn zero_detection() {
        assert!(SequenceNumber::zero().is_zero());
        assert!("000".parse::<SequenceNumber>().unwrap().is_zero());
        assert!(!"010".parse::<SequenceNumber>().unwrap().is_zero());
    }

    #[test]
    fn rejects_non_digits() {
        assert!("".parse::<SequenceNumber>().is_err());
        assert!("12a4".parse::<SequenceNumber>().is_err());
        assert!("-5".parse::<SequenceNumber>().is_err());
    }

    #[test]
    fn display_preserves_encoding() {
        let seq: SequenceNumber = "0042".parse().unwrap();
        assert_eq!(seq.to_string(), "0042");
        assert_eq!(seq.as_str(), "0042");
    }
}
