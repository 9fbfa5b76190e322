//! User context service: lifecycle operations for users over a pluggable
//! repository and user schema.
//! - `context` holds the operation contract and its reference behavior.
//! - `account` is the email and argon2 password schema.
//! - `setup` builds a context from the settings file.

pub mod account;
pub mod context;
pub mod setup;
#[cfg(test)]
pub mod test_support;
