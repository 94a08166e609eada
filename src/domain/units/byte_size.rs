//! Byte size value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::ByteSizeParseError;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// A number of bytes, parsed from strings such as `10MiB` or `25MB`.
///
/// Parsing rejects zero. The constructors do not, so a zero payload cap is
/// representable and the segmenter rejects it as invalid input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const fn bytes(n: u64) -> Self {
        Self(n)
    }

    pub const fn kib(n: u64) -> Self {
        Self(n * KIB)
    }

    pub const fn mib(n: u64) -> Self {
        Self(n * MIB)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Human-readable rendering used in progress output
    pub fn human(bytes: u64) -> String {
        if bytes < KIB {
            format!("{} B", bytes)
        } else if bytes < MIB {
            format!("{:.1} KiB", bytes as f64 / KIB as f64)
        } else if bytes < GIB {
            format!("{:.1} MiB", bytes as f64 / MIB as f64)
        } else {
            format!("{:.1} GiB", bytes as f64 / GIB as f64)
        }
    }
}

impl FromStr for ByteSize {
    type Err = ByteSizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ByteSizeParseError {
            input: s.to_string(),
        };
        let input = s.trim();
        let digits = input.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Err(err());
        }

        let value: u64 = input[..digits].parse().map_err(|_| err())?;
        let factor = match input[digits..].trim().to_lowercase().as_str() {
            "" | "b" => 1,
            "k" | "kib" => KIB,
            "kb" => 1000,
            "m" | "mib" => MIB,
            "mb" => 1_000_000,
            "g" | "gib" => GIB,
            "gb" => 1_000_000_000,
            _ => return Err(err()),
        };

        let total = value.checked_mul(factor).ok_or_else(err)?;
        if total == 0 {
            return Err(err());
        }
        Ok(Self(total))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0;
        if n % GIB == 0 {
            write!(f, "{}GiB", n / GIB)
        } else if n % MIB == 0 {
            write!(f, "{}MiB", n / MIB)
        } else if n % KIB == 0 {
            write!(f, "{}KiB", n / KIB)
        } else {
            write!(f, "{}B", n)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_binary_units() {
        assert_eq!("10MiB".parse::<ByteSize>().unwrap(), ByteSize::mib(10));
        assert_eq!("512KiB".parse::<ByteSize>().unwrap(), ByteSize::kib(512));
        assert_eq!("1g".parse::<ByteSize>().unwrap().as_u64(), GIB);
    }

    #[test]
    fn parses_decimal_units_and_plain_bytes() {
        assert_eq!("25MB".parse::<ByteSize>().unwrap().as_u64(), 25_000_000);
        assert_eq!("1048576".parse::<ByteSize>().unwrap(), ByteSize::mib(1));
        assert_eq!("10 mib".parse::<ByteSize>().unwrap(), ByteSize::mib(10));
    }

    #[test]
    fn rejects_zero_and_unknown_units() {
        assert!("0MiB".parse::<ByteSize>().is_err());
        assert!("ten".parse::<ByteSize>().is_err());
        assert!("10TB".parse::<ByteSize>().is_err());
    }

    #[test]
    fn display_picks_largest_exact_unit() {
        assert_eq!(ByteSize::mib(10).to_string(), "10MiB");
        assert_eq!(ByteSize::kib(1536).to_string(), "1536KiB");
        assert_eq!(ByteSize::bytes(1000).to_string(), "1000B");
    }

    #[test]
    fn human_readable() {
        assert_eq!(ByteSize::human(500), "500 B");
        assert_eq!(ByteSize::human(2048), "2.0 KiB");
        assert_eq!(ByteSize::human(25 * MIB), "25.0 MiB");
    }
}
