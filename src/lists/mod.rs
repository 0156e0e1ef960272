//! In-memory movie lists. Nothing here logs or performs I/O; persistence and
//! metadata lookups belong to the callers in `services`.

pub mod complete;
pub mod unique;

pub use complete::{CompleteListSnapshot, CompleteMovieList};
pub use unique::{AddOutcome, UniqueMovieList};
