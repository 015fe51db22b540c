use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Rows are single letters `A..=Z`; seat numbers start at 1.
pub const MAX_SEAT_NUMBER: u16 = 99;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("seat row must be a letter A-Z, got '{0}'")]
    InvalidRow(String),
    #[error("seat number must be between 1 and {MAX_SEAT_NUMBER}, got '{0}'")]
    InvalidNumber(String),
}

/// `(row, number)` of a physical seat, written `A5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatCoordinate {
    row: char,
    number: u16,
}

impl SeatCoordinate {
    pub fn new(row: char, number: u16) -> Result<Self, CoordinateError> {
        let row = row.to_ascii_uppercase();
        if !row.is_ascii_uppercase() {
            return Err(CoordinateError::InvalidRow(row.to_string()));
        }
        if number == 0 || number > MAX_SEAT_NUMBER {
            return Err(CoordinateError::InvalidNumber(number.to_string()));
        }
        Ok(Self { row, number })
    }

    pub fn row(&self) -> char {
        self.row
    }

    pub fn number(&self) -> u16 {
        self.number
    }
}

impl fmt::Display for SeatCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}

impl FromStr for SeatCoordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let row = chars
            .next()
            .ok_or_else(|| CoordinateError::InvalidRow(String::new()))?;
        if !row.is_ascii_alphabetic() {
            return Err(CoordinateError::InvalidRow(row.to_string()));
        }
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoordinateError::InvalidNumber(digits.to_string()));
        }
        let number = digits
            .parse::<u16>()
            .map_err(|_| CoordinateError::InvalidNumber(digits.to_string()))?;
        Self::new(row, number)
    }
}

impl TryFrom<String> for SeatCoordinate {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeatCoordinate> for String {
    fn from(value: SeatCoordinate) -> Self {
        value.to_string()
    }
}

/// Pricing tier picked by the booker for one seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeCategory {
    Adult,
    Child,
    Senior,
}

impl AgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeCategory::Adult => "adult",
            AgeCategory::Child => "child",
            AgeCategory::Senior => "senior",
        }
    }
}

impl FromStr for AgeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adult" => Ok(AgeCategory::Adult),
            "child" => Ok(AgeCategory::Child),
            "senior" => Ok(AgeCategory::Senior),
            other => Err(format!("unknown age category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSelection {
    pub seat: SeatCoordinate,
    pub age: AgeCategory,
}

/// A purchased seat, owned by exactly one booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub showtime_id: Uuid,
    pub movie_id: Uuid,
    pub seat: SeatCoordinate,
    pub age: AgeCategory,
    pub user_id: Uuid,
    pub booking_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_parses_and_normalises_row() {
        let seat: SeatCoordinate = "a5".parse().unwrap();
        assert_eq!(seat.row(), 'A');
        assert_eq!(seat.number(), 5);
        assert_eq!(seat.to_string(), "A5");
    }

    #[test]
    fn test_coordinate_rejects_garbage() {
        assert!(matches!(
            "5A".parse::<SeatCoordinate>(),
            Err(CoordinateError::InvalidRow(_))
        ));
        assert!(matches!(
            "A0".parse::<SeatCoordinate>(),
            Err(CoordinateError::InvalidNumber(_))
        ));
        assert!(matches!(
            "B".parse::<SeatCoordinate>(),
            Err(CoordinateError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_coordinate_number_is_plain_digits() {
        for input in ["A+5", "A-5", "A 5", "A5x", "A٣"] {
            assert!(
                matches!(
                    input.parse::<SeatCoordinate>(),
                    Err(CoordinateError::InvalidNumber(_))
                ),
                "{input} should be rejected"
            );
        }
        assert!(matches!(
            "é5".parse::<SeatCoordinate>(),
            Err(CoordinateError::InvalidRow(_))
        ));
        assert_eq!(
            "A05".parse::<SeatCoordinate>().unwrap(),
            SeatCoordinate::new('A', 5).unwrap()
        );
    }

    #[test]
    fn test_coordinate_serializes_as_string() {
        let seat = SeatCoordinate::new('C', 12).unwrap();
        assert_eq!(serde_json::to_string(&seat).unwrap(), "\"C12\"");
        let back: SeatCoordinate = serde_json::from_str("\"C12\"").unwrap();
        assert_eq!(back, seat);
    }

    #[test]
    fn test_coordinates_order_by_row_then_number() {
        let a2 = SeatCoordinate::new('A', 2).unwrap();
        let a10 = SeatCoordinate::new('A', 10).unwrap();
        let b1 = SeatCoordinate::new('B', 1).unwrap();
        let mut seats = vec![b1, a10, a2];
        seats.sort();
        assert_eq!(seats, vec![a2, a10, b1]);
    }
}
