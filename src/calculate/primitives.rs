//! Arithmetic primitives
//!
//! Pure numeric helpers shared by the apportionment engine: capacity tier
//! selection, percentage clamping, power-of-two rounding and unit parsing.

use crate::error::{Result, TuneError};

/// CPU tier boundaries (small, medium, large)
pub const PROCESSOR_TIERS: [u32; 3] = [4, 8, 16];

/// RAM tier boundaries in megabytes (small, medium, large)
pub const MEMORY_TIERS: [u64; 3] = [8192, 16384, 32768];

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// Select a value by processor count.
///
/// Up to 4 CPUs is small, up to 8 is medium, anything above is large.
pub fn fit_to_processors<T>(cpu: u32, small: T, medium: T, large: T) -> T {
    if cpu <= PROCESSOR_TIERS[0] {
        small
    } else if cpu <= PROCESSOR_TIERS[1] {
        medium
    } else {
        large
    }
}

/// Select a value by amount of memory in megabytes.
///
/// Up to 8192 MB is small, up to 16384 MB is medium, anything above is large.
pub fn fit_to_memory<T>(ram_mb: u64, small: T, medium: T, large: T) -> T {
    if ram_mb <= MEMORY_TIERS[0] {
        small
    } else if ram_mb <= MEMORY_TIERS[1] {
        medium
    } else {
        large
    }
}

/// Clamp a value into `[minimum, maximum]`. The minimum wins when the bounds cross.
pub fn clamp(value: u64, minimum: u64, maximum: u64) -> u64 {
    value.min(maximum).max(minimum)
}

/// Take a percentage of a resource (truncated), then clamp it into `[minimum, maximum]`.
///
/// The product saturates, so absurdly large resources land on `maximum`.
pub fn clamp_percent_of_resource(total: u64, percent: u64, minimum: u64, maximum: u64) -> u64 {
    clamp(total.saturating_mul(percent) / 100, minimum, maximum)
}

/// True when `value` is below `target` but no further than `percent` below it.
pub fn within_percent(value: u64, target: u64, percent: u64) -> bool {
    let lower = target as f64 * (1.0 - percent as f64 / 100.0);
    (value as f64) >= lower && value < target
}

/// Nearest power of two, with midpoints rounding up.
pub fn nearest_power_of_two(n: u64) -> u64 {
    if n <= 1 {
        return 1;
    }
    let lower = 1u64 << (63 - n.leading_zeros());
    match lower.checked_mul(2) {
        Some(upper) if upper - n <= n - lower => upper,
        _ => lower,
    }
}

/// Unit suffix of a magnitude string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// `b`
    Bytes,
    /// `k`
    Kilobytes,
    /// `m`
    Megabytes,
    /// `g`
    Gigabytes,
}

impl Unit {
    /// Number of bytes in one of this unit
    pub fn bytes(&self) -> u64 {
        match self {
            Self::Bytes => 1,
            Self::Kilobytes => 1024,
            Self::Megabytes => BYTES_PER_MEGABYTE,
            Self::Gigabytes => 1024 * BYTES_PER_MEGABYTE,
        }
    }

    fn from_suffix(suffix: char) -> Option<Self> {
        match suffix.to_ascii_lowercase() {
            'b' => Some(Self::Bytes),
            'k' => Some(Self::Kilobytes),
            'm' => Some(Self::Megabytes),
            'g' => Some(Self::Gigabytes),
            _ => None,
        }
    }
}

/// Split a magnitude string such as `16g` into its number and optional unit.
pub fn parse_magnitude(s: &str) -> Result<(u64, Option<Unit>)> {
    let trimmed = s.trim();
    let invalid = || TuneError::InvalidUnitFormat(s.to_string());

    let (digits, unit) = match trimmed.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => {
            let unit = Unit::from_suffix(c).ok_or_else(invalid)?;
            (&trimmed[..trimmed.len() - 1], Some(unit))
        }
        Some(_) => (trimmed, None),
        None => return Err(invalid()),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let number = digits.parse::<u64>().map_err(|_| invalid())?;
    Ok((number, unit))
}

/// Convert a magnitude string to bytes.
///
/// An unsuffixed number is read as gigabytes (`"16"` is 16 GB), following the
/// convention of hand-written inventories.
pub fn string_to_bytes(s: &str) -> Result<u64> {
    let (number, unit) = parse_magnitude(s)?;
    number
        .checked_mul(unit.unwrap_or(Unit::Gigabytes).bytes())
        .ok_or_else(|| TuneError::InvalidUnitFormat(s.to_string()))
}

/// Convert a magnitude string to megabytes. An unsuffixed number is already megabytes.
pub fn string_to_megabytes(s: &str) -> Result<u64> {
    let (number, unit) = parse_magnitude(s)?;
    let bytes = number
        .checked_mul(unit.unwrap_or(Unit::Megabytes).bytes())
        .ok_or_else(|| TuneError::InvalidUnitFormat(s.to_string()))?;
    Ok(bytes / BYTES_PER_MEGABYTE)
}
