// src/domain/genre.rs
//
// Genre Entity
//
// Always embedded in a Movie; has no lifecycle of its own here.

use serde::{Deserialize, Serialize};

/// A genre row as read through the movie/genre join
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    /// Store-assigned identifier (`genre.idgenre`)
    pub id: i64,

    /// Short label, e.g. "Drama"
    pub name: String,
}

impl Genre {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
