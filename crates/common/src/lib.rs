//! Shared runtime helpers for the workspace binaries and tests.

pub mod utils {
    pub mod logging;
}
