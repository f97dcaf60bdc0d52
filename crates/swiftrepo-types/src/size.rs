//! Byte sizes as written in repository settings.
//!
//! Accepts a plain byte count (`102400`) or a number with a binary unit
//! suffix (`"100kb"`, `"5gb"`, `"64 MB"`). Units are powers of 1024.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

const UNITS: &[(&str, u64)] = &[
    ("pb", 1 << 50),
    ("tb", 1 << 40),
    ("gb", 1 << 30),
    ("mb", 1 << 20),
    ("kb", 1 << 10),
    ("p", 1 << 50),
    ("t", 1 << 40),
    ("g", 1 << 30),
    ("m", 1 << 20),
    ("k", 1 << 10),
    ("b", 1),
];

/// A size in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const fn b(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn kb(kb: u64) -> Self {
        Self(kb * 1024)
    }

    pub const fn mb(mb: u64) -> Self {
        Self(mb * 1024 * 1024)
    }

    pub const fn gb(gb: u64) -> Self {
        Self(gb * 1024 * 1024 * 1024)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Size as `usize`, saturating on 32-bit targets.
    pub fn as_usize(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl FromStr for ByteSize {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TypeError::InvalidByteSize {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let normalized = s.trim().to_ascii_lowercase();
        let digits_end = normalized
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(normalized.len());
        let (number, unit) = normalized.split_at(digits_end);
        if number.is_empty() {
            return Err(invalid("missing number"));
        }
        let value: u64 = number.parse().map_err(|_| invalid("number out of range"))?;

        let unit = unit.trim();
        let multiplier = if unit.is_empty() {
            1
        } else {
            UNITS
                .iter()
                .find(|(suffix, _)| *suffix == unit)
                .map(|(_, multiplier)| *multiplier)
                .ok_or_else(|| invalid("unknown unit"))?
        };

        value
            .checked_mul(multiplier)
            .map(Self)
            .ok_or_else(|| invalid("size overflows u64"))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "0b");
        }
        // Two-letter units only, largest exact one wins.
        for (suffix, multiplier) in UNITS.iter().filter(|(suffix, _)| suffix.len() == 2) {
            if self.0 % multiplier == 0 {
                return write!(f, "{}{}", self.0 / multiplier, suffix);
            }
        }
        write!(f, "{}b", self.0)
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bytes(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Bytes(bytes) => Ok(Self(bytes)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}
