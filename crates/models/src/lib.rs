//! Data model shared by the user context: input parameters, lookup clauses,
//! changesets and the persisted `users` entity.

pub mod errors;
pub mod db;
pub mod changeset;
pub mod params;
pub mod record;
pub mod user;

pub use changeset::{Action, Changeset};
pub use params::{Clauses, LoginField, Params};
pub use record::Record;

#[cfg(test)]
mod tests;
