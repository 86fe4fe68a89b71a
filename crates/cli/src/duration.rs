// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Age parsing for `cleanup-snapshots --older-than`.
//!
//! Accepts compact suffixes (`7d`, `2w`, `48h`, `1m` where m is a
//! 30-day month) and free-form unit words (`"30 days"`, `"3 weeks"`).

/// Parse an age expression into whole days, rounding half up.
pub fn parse_older_than(input: &str) -> Result<u32, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("empty duration".to_string());
    }

    let (number_str, unit) = match trimmed.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(split) => (&trimmed[..split], trimmed[split..].trim()),
        None => return Err(format!("duration '{trimmed}' has no unit")),
    };
    let number: f64 = number_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number in duration '{trimmed}'"))?;
    if number < 0.0 {
        return Err(format!("duration '{trimmed}' is negative"));
    }

    let days_per_unit = match unit {
        "d" | "day" | "days" => 1.0,
        "w" | "week" | "weeks" => 7.0,
        "h" | "hour" | "hours" => 1.0 / 24.0,
        "m" | "month" | "months" => 30.0,
        other => return Err(format!("unknown duration unit '{other}'")),
    };

    Ok((number * days_per_unit).round() as u32)
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
