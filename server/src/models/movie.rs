use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::showtime::ShowdateEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovieCategory {
    #[serde(rename = "Currently Running")]
    CurrentlyRunning,
    #[serde(rename = "Coming Soon")]
    ComingSoon,
}

impl MovieCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovieCategory::CurrentlyRunning => "Currently Running",
            MovieCategory::ComingSoon => "Coming Soon",
        }
    }
}

impl fmt::Display for MovieCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovieCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Currently Running" => Ok(MovieCategory::CurrentlyRunning),
            "Coming Soon" => Ok(MovieCategory::ComingSoon),
            other => Err(format!("unknown movie category '{other}'")),
        }
    }
}

/// Catalog entry. Read-only to the booking flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    pub name: String,
    pub category: MovieCategory,
    pub genre: String,
    /// Billing order is preserved.
    pub cast: Vec<String>,
    pub director: String,
    pub producer: String,
    pub synopsis: String,
    pub trailer_url: Option<String>,
    pub mpaa_rating: String,
    pub critic_score: Option<i16>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub name: String,
    pub category: MovieCategory,
    pub genre: String,
    #[serde(default)]
    pub cast: Vec<String>,
    pub director: String,
    pub producer: String,
    pub synopsis: String,
    pub trailer_url: Option<String>,
    pub mpaa_rating: String,
    pub critic_score: Option<i16>,
    /// Price sheet referenced by the initial showtimes.
    pub price_sheet_id: Uuid,
    #[serde(default)]
    pub showdates: Vec<ShowdateEntry>,
}
