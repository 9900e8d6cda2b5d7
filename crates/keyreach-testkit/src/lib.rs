//! Keyreach testing infrastructure
//!
//! Shared setup for the keyreach test suites: a [`SessionFixture`] that
//! stands up a store with one session, assertion helpers for the error
//! variants callers are expected to tell apart, and proptest strategies for
//! random keyring graphs.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! keyreach-testkit = { path = "../keyreach-testkit" }
//! ```
//!
//! ```rust,no_run
//! use keyreach_testkit::*;
//!
//! #[test]
//! fn my_test() {
//!     init_test_tracing();
//!     let fixture = SessionFixture::new();
//!     let key = fixture.add_user_key("k1", "data");
//!     assert_denied(&fixture.session.read(key));
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod strategies;

pub use assertions::*;
pub use fixtures::*;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_TEST_FILTER: &str = "keyreach_core=debug,keyreach_store=debug";

/// Install a fmt subscriber that writes through the test harness
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_TEST_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
