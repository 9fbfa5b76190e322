//! Database-backed repositories.

#[cfg(feature = "seaorm")]
pub mod seaorm;
