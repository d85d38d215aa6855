//! Value-shape parsers for directive values
//!
//! Sizes and durations keep nginx-style leniency: a numeric part that does
//! not parse counts as zero, only an unknown unit is an error.

use std::num::ParseIntError;
use std::time::Duration;
use thiserror::Error;

const KIB: i64 = 1024;
const MIB: i64 = KIB * 1024;
const GIB: i64 = MIB * 1024;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Failure to read a directive value as a typed value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("Value is empty")]
    Empty,

    #[error("Unsupported boolean value {0}")]
    UnsupportedBool(String),

    #[error("Invalid integer value {value}: {source}")]
    InvalidInt {
        value: String,
        source: ParseIntError,
    },

    #[error("Unsupported measurement unit {0}")]
    UnsupportedUnit(String),

    #[error("Unsupported time unit {0}")]
    UnsupportedTimeUnit(String),

    #[error("Wrong buffer format value {0}")]
    BufferFormat(String),
}

/// Parse `on`/`off`
pub fn parse_bool(value: &str) -> Result<bool, ValueError> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(ValueError::UnsupportedBool(value.to_string())),
    }
}

/// Parse a base-10 signed integer
pub fn parse_int(value: &str) -> Result<i64, ValueError> {
    value.parse().map_err(|source| ValueError::InvalidInt {
        value: value.to_string(),
        source,
    })
}

/// Parse a byte size such as `512`, `16k`, `8M` or `2g`
pub fn parse_size(value: &str) -> Result<i64, ValueError> {
    let unit = value.trim_matches(|c: char| c.is_ascii_digit());
    let number = lenient_number(value.trim_matches(|c: char| "kKmMgG".contains(c)));

    let multiplier = match unit {
        "" => 1,
        "k" | "K" => KIB,
        "m" | "M" => MIB,
        "g" | "G" => GIB,
        _ => return Err(ValueError::UnsupportedUnit(unit.to_string())),
    };

    Ok(number.saturating_mul(multiplier))
}

/// Parse a `count size` buffer pair such as `4 16k`
pub fn parse_buffers(value: &str) -> Result<(i64, i64), ValueError> {
    if value.matches(' ').count() != 1 {
        return Err(ValueError::BufferFormat(value.to_string()));
    }

    let (count, size) = value
        .split_once(' ')
        .ok_or_else(|| ValueError::BufferFormat(value.to_string()))?;

    Ok((parse_int(count)?, parse_size(size)?))
}

/// Parse a duration made of one or more periods, e.g. `1h 30m` or `500ms`
pub fn parse_time(value: &str) -> Result<Duration, ValueError> {
    value
        .split_whitespace()
        .try_fold(Duration::ZERO, |total, period| {
            Ok(total.saturating_add(parse_time_period(period)?))
        })
}

fn parse_time_period(period: &str) -> Result<Duration, ValueError> {
    let unit = period.trim_matches(|c: char| c.is_ascii_digit());
    let number = lenient_number(period.trim_matches(|c: char| "mshdwMy".contains(c)));
    // Units are only valid around a digits-only number, so it is never negative
    let number = u64::try_from(number).unwrap_or_default();

    let duration = match unit {
        "ms" => Duration::from_millis(number),
        "s" | "" => Duration::from_secs(number),
        "m" => seconds(number, MINUTE),
        "h" => seconds(number, HOUR),
        "d" => seconds(number, DAY),
        "w" => seconds(number, 7 * DAY),
        "M" => seconds(number, 30 * DAY),
        "y" => seconds(number, 365 * DAY),
        _ => return Err(ValueError::UnsupportedTimeUnit(unit.to_string())),
    };

    Ok(duration)
}

fn seconds(number: u64, unit: u64) -> Duration {
    Duration::from_secs(number.saturating_mul(unit))
}

fn lenient_number(value: &str) -> i64 {
    value.parse().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("on"), Ok(true));
        assert_eq!(parse_bool("off"), Ok(false));
        assert_eq!(
            parse_bool("auto"),
            Err(ValueError::UnsupportedBool("auto".to_string()))
        );
        assert!(parse_bool("On").is_err());
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("441"), Ok(441));
        assert_eq!(parse_int("-12"), Ok(-12));
        assert!(matches!(parse_int("abc"), Err(ValueError::InvalidInt { .. })));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("160"), Ok(160));
        assert_eq!(parse_size("16k"), Ok(16384));
        assert_eq!(parse_size("512K"), Ok(524288));
        assert_eq!(parse_size("8M"), Ok(8388608));
        assert_eq!(parse_size("8m"), Ok(8388608));
        assert_eq!(parse_size("2G"), Ok(2147483648));
        assert_eq!(
            parse_size("2J"),
            Err(ValueError::UnsupportedUnit("J".to_string()))
        );
    }

    #[test]
    fn test_parse_size_is_lenient_about_numbers() {
        assert_eq!(parse_size("k"), Ok(0));
        assert_eq!(parse_size(""), Ok(0));
        assert_eq!(parse_size("99999999999999999999"), Ok(0));
        assert_eq!(parse_size("9223372036854775807g"), Ok(i64::MAX));
    }

    #[test]
    fn test_parse_buffers() {
        assert_eq!(parse_buffers("4 16k"), Ok((4, 16384)));
        assert_eq!(parse_buffers("8 4"), Ok((8, 4)));
        assert!(matches!(parse_buffers("A 16k"), Err(ValueError::InvalidInt { .. })));
        assert_eq!(
            parse_buffers("4 A"),
            Err(ValueError::UnsupportedUnit("A".to_string()))
        );
        assert!(matches!(parse_buffers("123"), Err(ValueError::BufferFormat(_))));
        assert!(matches!(parse_buffers("4  16k"), Err(ValueError::BufferFormat(_))));
        assert!(matches!(parse_buffers("4 16k 1"), Err(ValueError::BufferFormat(_))));
    }

    #[test]
    fn test_parse_time_units() {
        assert_eq!(parse_time("48"), Ok(Duration::from_secs(48)));
        assert_eq!(parse_time("230ms"), Ok(Duration::from_millis(230)));
        assert_eq!(parse_time("120s"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_time("3m"), Ok(Duration::from_secs(3 * 60)));
        assert_eq!(parse_time("6h"), Ok(Duration::from_secs(6 * 3600)));
        assert_eq!(parse_time("3d"), Ok(Duration::from_secs(72 * 3600)));
        assert_eq!(parse_time("2w"), Ok(Duration::from_secs(14 * 24 * 3600)));
        assert_eq!(parse_time("2M"), Ok(Duration::from_secs(60 * 24 * 3600)));
        assert_eq!(parse_time("1y"), Ok(Duration::from_secs(365 * 24 * 3600)));
    }

    #[test]
    fn test_parse_time_sums_periods() {
        let expected = Duration::from_secs(54 * 3600 + 30 * 60 + 15);
        assert_eq!(parse_time("2d 6h 30m 15s"), Ok(expected));
        assert_eq!(parse_time("1s 500ms"), Ok(Duration::from_millis(1500)));
    }

    #[test]
    fn test_parse_time_unknown_unit() {
        assert_eq!(
            parse_time("3u"),
            Err(ValueError::UnsupportedTimeUnit("u".to_string()))
        );
        assert!(parse_time("1h 3u").is_err());
    }
}
