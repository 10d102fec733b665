// src/domain/movie.rs
//
// Movie Entity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::genre::Genre;

/// A movie together with the genre it references.
///
/// Built fresh from every row read; never cached or shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    /// Store-assigned identifier, `None` until the movie is inserted
    pub id: Option<i64>,

    pub title: String,

    /// Calendar date only; any stored time of day is dropped on read
    pub release_date: Option<NaiveDate>,

    /// Full genre value, not a bare foreign key
    pub genre: Genre,

    /// Running time in minutes
    pub duration: Option<u32>,

    pub director: String,

    pub summary: Option<String>,
}

impl Movie {
    /// Create a movie that has not been persisted yet
    pub fn new(
        title: impl Into<String>,
        release_date: Option<NaiveDate>,
        genre: Genre,
        duration: Option<u32>,
        director: impl Into<String>,
        summary: Option<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            release_date,
            genre,
            duration,
            director: director.into(),
            summary,
        }
    }

    /// Same movie carrying the given store identifier
    pub fn with_id(self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
