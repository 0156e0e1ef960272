//! Curates two personal movie lists sourced from a public knowledge graph.
//!
//! The *unique* list allows each director, writer, and actor to be credited on
//! at most one entry; the *complete* list tracks which movies were reviewed,
//! ignored, and rated.

pub mod config;
pub mod db;
pub mod error;
pub mod lists;
pub mod models;
pub mod services;
