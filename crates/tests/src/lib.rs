//! Cross-crate integration tests.
//!
//! API-surface tests run everywhere; tests that need a live MongoDB are
//! `#[ignore]`d and expect `mongodb://localhost:27017` (override with
//! `LECTIO_TEST_MONGO_URI`). Run them with `cargo test -p lectio-tests -- --ignored`.

pub mod support;

#[cfg(test)]
mod api_tests;
#[cfg(test)]
mod queue_tests;
#[cfg(test)]
mod report_tests;
