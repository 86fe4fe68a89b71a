// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Disk-space threshold strings.
//!
//! Two accepted formats: percentage (`"20%"`, 0 < N <= 100) and absolute
//! binary sizes (`"50 GiB"`, `"512 MiB"`). Bare numbers are rejected:
//! every threshold must name its unit.

use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    #[error("threshold '{0}' has no unit (expected 'N%', 'N GiB' or 'N MiB')")]
    MissingUnit(String),
    #[error("threshold '{0}' is not a valid number")]
    BadNumber(String),
    #[error("percentage '{0}' out of range (0 < N <= 100)")]
    PercentOutOfRange(String),
}

/// A free-space floor, either relative to volume size or absolute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// Keep at least this percentage of the volume free.
    Percent(f64),
    /// Keep at least this many bytes free.
    Absolute(u64),
}

impl Threshold {
    /// True when `available` free bytes out of `total` violate the floor.
    pub fn is_below(&self, available: u64, total: u64) -> bool {
        match self {
            Threshold::Percent(min_free) => {
                if total == 0 {
                    return true;
                }
                let free_percent = available as f64 / total as f64 * 100.0;
                free_percent < *min_free
            }
            Threshold::Absolute(min_bytes) => available < *min_bytes,
        }
    }
}

impl FromStr for Threshold {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(number) = trimmed.strip_suffix('%') {
            let value: f64 = number
                .trim()
                .parse()
                .map_err(|_| ThresholdError::BadNumber(s.to_string()))?;
            if value <= 0.0 || value > 100.0 {
                return Err(ThresholdError::PercentOutOfRange(s.to_string()));
            }
            return Ok(Threshold::Percent(value));
        }

        for (suffix, factor) in [("GiB", 1u64 << 30), ("MiB", 1u64 << 20)] {
            if let Some(number) = trimmed.strip_suffix(suffix) {
                let value: f64 = number
                    .trim()
                    .parse()
                    .map_err(|_| ThresholdError::BadNumber(s.to_string()))?;
                if value < 0.0 {
                    return Err(ThresholdError::BadNumber(s.to_string()));
                }
                return Ok(Threshold::Absolute((value * factor as f64) as u64));
            }
        }

        Err(ThresholdError::MissingUnit(s.to_string()))
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Threshold::Percent(p) => write!(f, "{p}%"),
            Threshold::Absolute(bytes) => f.write_str(&pcs_core::format_bytes(*bytes)),
        }
    }
}

#[cfg(test)]
#[path = "threshold_tests.rs"]
mod tests;
