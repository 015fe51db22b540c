//! Showtime display strings to wall-clock times.
//!
//! Admins type times the way they appear on the marquee (`7:00 PM`, `7pm`,
//! `19:00`). Ordering and uniqueness use the parsed `NaiveTime`, never the
//! string.

use chrono::NaiveTime;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised showtime '{0}'")]
pub struct ClockParseError(pub String);

pub fn parse_clock(input: &str) -> Result<NaiveTime, ClockParseError> {
    let fail = || ClockParseError(input.to_string());

    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect::<String>()
        .to_ascii_uppercase();

    let (body, meridiem) = if let Some(rest) = compact.strip_suffix("AM") {
        (rest, Some(false))
    } else if let Some(rest) = compact.strip_suffix("PM") {
        (rest, Some(true))
    } else {
        (compact.as_str(), None)
    };

    let (hour, minute) = match body.split_once(':') {
        Some((hour, minute)) => (hour, minute),
        None => (body, "0"),
    };
    if hour.is_empty() || minute.len() > 2 {
        return Err(fail());
    }
    let hour: u32 = hour.parse().map_err(|_| fail())?;
    let minute: u32 = minute.parse().map_err(|_| fail())?;

    let hour = match meridiem {
        Some(is_pm) => {
            if !(1..=12).contains(&hour) {
                return Err(fail());
            }
            match (hour, is_pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            }
        }
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(fail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_parses_twelve_hour_forms() {
        assert_eq!(parse_clock("7:00 PM").unwrap(), hm(19, 0));
        assert_eq!(parse_clock("7PM").unwrap(), hm(19, 0));
        assert_eq!(parse_clock(" 7:30 pm ").unwrap(), hm(19, 30));
        assert_eq!(parse_clock("10:15 a.m.").unwrap(), hm(10, 15));
        assert_eq!(parse_clock("12:00 AM").unwrap(), hm(0, 0));
        assert_eq!(parse_clock("12:05 PM").unwrap(), hm(12, 5));
    }

    #[test]
    fn test_parses_twenty_four_hour_form() {
        assert_eq!(parse_clock("19:00").unwrap(), hm(19, 0));
        assert_eq!(parse_clock("00:45").unwrap(), hm(0, 45));
    }

    #[test]
    fn test_rejects_nonsense() {
        assert!(parse_clock("").is_err());
        assert!(parse_clock("13 PM").is_err());
        assert!(parse_clock("0:30 AM").is_err());
        assert!(parse_clock("25:00").is_err());
        assert!(parse_clock("7:75 PM").is_err());
        assert!(parse_clock("seven").is_err());
    }

    #[test]
    fn test_one_pm_sorts_before_ten_pm() {
        // Lexicographic order of the strings would say otherwise.
        assert!(parse_clock("1:00 PM").unwrap() < parse_clock("10:00 PM").unwrap());
    }
}
