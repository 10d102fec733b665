// src/domain/mod.rs
//
// Domain Root
//
// Plain data holders mirroring the `movie` and `genre` rows. No behavior
// beyond construction lives here.

pub mod genre;
pub mod movie;

pub use genre::Genre;
pub use movie::Movie;
