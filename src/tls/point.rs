use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointFormat {
    Uncompressed,
    Ansix962CompressedPrime,
}

impl fmt::Display for PointFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointFormat::Uncompressed => write!(f, "uncompressed"),
            PointFormat::Ansix962CompressedPrime => write!(f, "compressed"),
        }
    }
}

/// Public key observed from the peer, as big-endian coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EcPoint {
    pub x: Vec<u8>,
    pub y: Vec<u8>,
}

impl EcPoint {
    pub fn new(x: impl Into<Vec<u8>>, y: impl Into<Vec<u8>>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }

    /// Compares coordinates as integers, so leading zero bytes do not matter.
    pub fn numerically_equal(&self, other: &EcPoint) -> bool {
        strip_leading_zeros(&self.x) == strip_leading_zeros(&other.x)
            && strip_leading_zeros(&self.y) == strip_leading_zeros(&other.y)
    }
}

impl fmt::Display for EcPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})",
            crate::util::hex::to_hex(&self.x),
            crate::util::hex::to_hex(&self.y)
        )
    }
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
