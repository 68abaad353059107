//! Free-form duration parsing and human-readable formatting.

use chrono::Duration;
use thiserror::Error;

/// Errors produced while parsing duration text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseDurationError {
    /// The input was empty or whitespace-only.
    #[error("duration cannot be empty")]
    Empty,

    /// The input did not match any recognized duration form.
    #[error("unrecognized duration {text:?}")]
    Invalid { text: String },

    /// The parsed duration was zero.
    #[error("duration must be greater than zero, got {text:?}")]
    Zero { text: String },
}

/// Parses free-form duration text into an elapsed time.
///
/// Accepted forms:
/// - unit notation: `"2h13m"`, `"3h"`, `"45m"`, `"90s"` (units must appear
///   in descending order, each at most once)
/// - a bare non-negative integer, interpreted as seconds
///
/// The result is always strictly positive.
pub fn parse_duration(text: &str) -> Result<Duration, ParseDurationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseDurationError::Empty);
    }

    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let seconds: i64 = trimmed.parse().map_err(|_| ParseDurationError::Invalid {
            text: text.to_string(),
        })?;
        return from_seconds(seconds, text);
    }

    let mut total_seconds: i64 = 0;
    let mut last_unit_rank: u8 = 0;
    let mut rest = trimmed;

    while !rest.is_empty() {
        rest = rest.trim_start();
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 {
            return Err(ParseDurationError::Invalid {
                text: text.to_string(),
            });
        }
        let value: i64 = rest[..digits_len]
            .parse()
            .map_err(|_| ParseDurationError::Invalid {
                text: text.to_string(),
            })?;
        rest = &rest[digits_len..];

        let Some(unit) = rest.chars().next() else {
            return Err(ParseDurationError::Invalid {
                text: text.to_string(),
            });
        };
        let (rank, multiplier) = match unit.to_ascii_lowercase() {
            'h' => (1, 3600),
            'm' => (2, 60),
            's' => (3, 1),
            _ => {
                return Err(ParseDurationError::Invalid {
                    text: text.to_string(),
                });
            }
        };
        // Units must be strictly descending: rejects "13m2h" and "1h2h".
        if rank <= last_unit_rank {
            return Err(ParseDurationError::Invalid {
                text: text.to_string(),
            });
        }
        last_unit_rank = rank;
        total_seconds = value
            .checked_mul(multiplier)
            .and_then(|seconds| total_seconds.checked_add(seconds))
            .ok_or_else(|| ParseDurationError::Invalid {
                text: text.to_string(),
            })?;
        rest = &rest[unit.len_utf8()..];
    }

    from_seconds(total_seconds, text)
}

/// Converts whole seconds, rejecting zero and values beyond what an elapsed
/// time can represent. `Duration::seconds` would panic on the latter.
fn from_seconds(seconds: i64, text: &str) -> Result<Duration, ParseDurationError> {
    if seconds == 0 {
        return Err(ParseDurationError::Zero {
            text: text.to_string(),
        });
    }
    Duration::try_seconds(seconds).ok_or_else(|| ParseDurationError::Invalid {
        text: text.to_string(),
    })
}

/// Formats an elapsed time as `"Xh Ym"`, flooring to whole minutes.
///
/// Used for the action lines printed while applying mutations.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_seconds() / 60;
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hours_and_minutes() {
        assert_eq!(parse_duration("2h13m").unwrap(), Duration::minutes(133));
        assert_eq!(parse_duration("3h").unwrap(), Duration::hours(3));
        assert_eq!(parse_duration("45m").unwrap(), Duration::minutes(45));
    }

    #[test]
    fn parses_bare_number_as_seconds() {
        assert_eq!(parse_duration("90").unwrap(), Duration::seconds(90));
        assert_eq!(parse_duration("3").unwrap(), Duration::seconds(3));
    }

    #[test]
    fn parses_with_surrounding_whitespace() {
        assert_eq!(parse_duration(" 1h 30m ").unwrap(), Duration::minutes(90));
    }

    #[test]
    fn parses_seconds_unit() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::seconds(90));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::seconds(90));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(parse_duration("").unwrap_err(), ParseDurationError::Empty);
        assert_eq!(parse_duration("   ").unwrap_err(), ParseDurationError::Empty);
    }

    #[test]
    fn rejects_zero() {
        assert!(matches!(
            parse_duration("0").unwrap_err(),
            ParseDurationError::Zero { .. }
        ));
        assert!(matches!(
            parse_duration("0h0m").unwrap_err(),
            ParseDurationError::Zero { .. }
        ));
    }

    #[test]
    fn rejects_unknown_units() {
        assert!(matches!(
            parse_duration("2d").unwrap_err(),
            ParseDurationError::Invalid { .. }
        ));
    }

    #[test]
    fn rejects_out_of_order_or_repeated_units() {
        assert!(parse_duration("13m2h").is_err());
        assert!(parse_duration("1h2h").is_err());
    }

    #[test]
    fn rejects_huge_values_without_panicking() {
        // Parses as i64 seconds but exceeds the representable elapsed time.
        assert!(matches!(
            parse_duration("10000000000000000").unwrap_err(),
            ParseDurationError::Invalid { .. }
        ));
        // Unit arithmetic would overflow i64 seconds.
        assert!(matches!(
            parse_duration("9000000000000h").unwrap_err(),
            ParseDurationError::Invalid { .. }
        ));
        assert!(matches!(
            parse_duration("9223372036854775807m").unwrap_err(),
            ParseDurationError::Invalid { .. }
        ));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_duration("2h13").is_err());
        assert!(parse_duration("h").is_err());
    }

    #[test]
    fn formats_hours_and_minutes() {
        assert_eq!(format_duration(Duration::minutes(133)), "2h 13m");
        assert_eq!(format_duration(Duration::hours(3)), "3h 0m");
        assert_eq!(format_duration(Duration::minutes(45)), "0h 45m");
    }

    #[test]
    fn format_floors_to_whole_minutes() {
        assert_eq!(format_duration(Duration::seconds(45)), "0h 0m");
        assert_eq!(format_duration(Duration::seconds(3661)), "1h 1m");
    }
}
