// src/repositories/movie_repository.rs
//
// Movie persistence
//
// Reads go through the movie/genre join and come back as fully built
// entities; writes are single bound INSERT statements.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{params, OptionalExtension, Params, Row};

use crate::db::ConnectionProvider;
use crate::domain::{Genre, Movie};
use crate::error::{DataAccessError, DataResult};

const SELECT_MOVIES: &str = "SELECT movie.idmovie AS idmovie, movie.title AS title,
        movie.release_date AS release_date, genre.idgenre AS idgenre, genre.name AS name,
        movie.duration AS duration, movie.director AS director, movie.summary AS summary
     FROM movie JOIN genre ON movie.genre_id = genre.idgenre";

const INSERT_MOVIE: &str = "INSERT INTO movie (title, release_date, genre_id, duration, director, summary)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     RETURNING idmovie";

/// Julian day number of 1970-01-01T00:00:00Z
const UNIX_EPOCH_JULIAN_DAY: f64 = 2_440_587.5;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Layouts a stored release date may carry a time of day in.
const DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub trait MovieRepository: Send + Sync {
    fn list_all(&self) -> DataResult<Vec<Movie>>;
    fn list_by_genre(&self, genre_name: &str) -> DataResult<Vec<Movie>>;
    fn add(&self, movie: &Movie) -> DataResult<Movie>;
}

/// How `list_by_genre` compares genre names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenreMatch {
    /// Store default collation (case-sensitive in SQLite)
    #[default]
    Exact,
    /// ASCII case folding via `COLLATE NOCASE`
    CaseInsensitive,
}

impl GenreMatch {
    fn predicate(self) -> &'static str {
        match self {
            GenreMatch::Exact => "genre.name = ?1",
            GenreMatch::CaseInsensitive => "genre.name = ?1 COLLATE NOCASE",
        }
    }
}

pub struct SqliteMovieRepository {
    provider: Arc<dyn ConnectionProvider>,
    genre_match: GenreMatch,
}

impl SqliteMovieRepository {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            provider,
            genre_match: GenreMatch::default(),
        }
    }

    pub fn with_genre_match(mut self, genre_match: GenreMatch) -> Self {
        self.genre_match = genre_match;
        self
    }

    pub fn genre_match(&self) -> GenreMatch {
        self.genre_match
    }

    /// Run a join query on a fresh connection and map every row.
    ///
    /// The statement and its cursor borrow the connection, so all three are
    /// released in reverse order whether mapping succeeds or not.
    fn query_movies<P: Params>(&self, sql: &str, params: P) -> DataResult<Vec<Movie>> {
        let conn = self.provider.get_connection()?;
        let mut stmt = conn.prepare(sql)?;

        let movies = stmt
            .query_map(params, Self::row_to_movie)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(movies)
    }

    /// Map a joined row to Movie - returns rusqlite::Error for query_map compatibility
    fn row_to_movie(row: &Row) -> rusqlite::Result<Movie> {
        let genre = Genre {
            id: row.get("idgenre")?,
            name: row.get("name")?,
        };

        Ok(Movie {
            id: Some(row.get("idmovie")?),
            title: row.get("title")?,
            release_date: read_release_date(row, "release_date")?,
            genre,
            duration: row.get("duration")?,
            director: row.get("director")?,
            summary: row.get("summary")?,
        })
    }
}

impl MovieRepository for SqliteMovieRepository {
    fn list_all(&self) -> DataResult<Vec<Movie>> {
        let movies = self.query_movies(SELECT_MOVIES, [])?;
        debug!("Listed {} movies", movies.len());
        Ok(movies)
    }

    fn list_by_genre(&self, genre_name: &str) -> DataResult<Vec<Movie>> {
        let sql = format!("{} WHERE {}", SELECT_MOVIES, self.genre_match.predicate());

        let movies = self.query_movies(&sql, params![genre_name])?;
        debug!(
            "Listed {} movies for genre {:?} ({:?} match)",
            movies.len(),
            genre_name,
            self.genre_match
        );
        Ok(movies)
    }

    fn add(&self, movie: &Movie) -> DataResult<Movie> {
        let conn = self.provider.get_connection()?;
        let mut stmt = conn.prepare(INSERT_MOVIE)?;

        let generated: Option<i64> = stmt
            .query_row(
                params![
                    movie.title,
                    movie.release_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    movie.genre.id,
                    movie.duration,
                    movie.director,
                    movie.summary,
                ],
                |row| row.get(0),
            )
            .optional()?;

        match generated {
            Some(id) => {
                debug!("Inserted movie {:?} with id {}", movie.title, id);
                Ok(movie.clone().with_id(id))
            }
            None => {
                warn!("Insert of movie {:?} returned no generated id", movie.title);
                Err(DataAccessError::GenerationFailed)
            }
        }
    }
}

/// Read a release date stored as ISO text (optionally with a time of day),
/// as epoch milliseconds or as a Julian day number. The time of day is
/// discarded.
fn read_release_date(row: &Row, column: &str) -> rusqlite::Result<Option<NaiveDate>> {
    let idx = row.as_ref().column_index(column)?;

    let invalid = |ty: Type, message: String| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            ty,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
        )
    };

    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))?;
            parse_release_date(text)
                .map(Some)
                .ok_or_else(|| invalid(Type::Text, format!("Invalid release date '{}'", text)))
        }
        ValueRef::Integer(millis) => DateTime::from_timestamp_millis(millis)
            .map(|dt| Some(dt.date_naive()))
            .ok_or_else(|| invalid(Type::Integer, format!("Release date {} out of range", millis))),
        ValueRef::Real(julian_day) => julian_day_to_date(julian_day)
            .map(Some)
            .ok_or_else(|| invalid(Type::Real, format!("Release date {} out of range", julian_day))),
        other => Err(rusqlite::Error::InvalidColumnType(
            idx,
            column.to_string(),
            other.data_type(),
        )),
    }
}

fn julian_day_to_date(julian_day: f64) -> Option<NaiveDate> {
    if !julian_day.is_finite() {
        return None;
    }
    let millis = ((julian_day - UNIX_EPOCH_JULIAN_DAY) * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.date_naive())
}

fn parse_release_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().or_else(|| {
        DATE_TIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(|dt| dt.date())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_plain_date_parses() {
        assert_eq!(parse_release_date("2024-02-09"), date(2024, 2, 9));
    }

    #[test]
    fn test_time_of_day_is_dropped() {
        assert_eq!(parse_release_date("2015-11-26 12:00:00.000"), date(2015, 11, 26));
        assert_eq!(parse_release_date("2015-11-26 23:59:59"), date(2015, 11, 26));
        assert_eq!(parse_release_date("2015-11-26T08:30:00.5"), date(2015, 11, 26));
        assert_eq!(parse_release_date("2015-11-26 08:30"), date(2015, 11, 26));
    }

    #[test]
    fn test_garbage_date_is_rejected() {
        assert_eq!(parse_release_date("26/11/2015"), None);
        assert_eq!(parse_release_date("2015-13-01"), None);
        assert_eq!(parse_release_date(""), None);
    }

    #[test]
    fn test_julian_day_converts_to_utc_date() {
        assert_eq!(julian_day_to_date(2_440_587.5), date(1970, 1, 1));
        assert_eq!(julian_day_to_date(2_457_353.0), date(2015, 11, 26));
        assert_eq!(julian_day_to_date(2_457_352.49), date(2015, 11, 25));
        assert_eq!(julian_day_to_date(f64::NAN), None);
        assert_eq!(julian_day_to_date(1.0e30), None);
    }

    #[test]
    fn test_genre_match_defaults_to_exact() {
        assert_eq!(GenreMatch::default(), GenreMatch::Exact);
        assert_eq!(GenreMatch::Exact.predicate(), "genre.name = ?1");
        assert!(GenreMatch::CaseInsensitive.predicate().ends_with("COLLATE NOCASE"));
    }
}
