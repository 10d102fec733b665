// src/repositories/mod.rs
//
// Repository layer
//
// RULES:
// - Repositories are plain data mappers: rows in, entities out
// - No business logic, no validation of caller input
// - Bound parameters only, never string-built predicates from user data
// - One connection per operation, obtained from the injected provider

pub mod movie_repository;


pub use movie_repository::{GenreMatch, MovieRepository, SqliteMovieRepository};
