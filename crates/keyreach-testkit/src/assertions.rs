//! Assertion helpers for keyreach results
//!
//! Callers must be able to tell "exists but not possessed" from "does not
//! exist", so these helpers fail with the actual outcome in the message.

use keyreach_core::{KeyringError, Result};
use std::fmt::Debug;

/// Assert the operation failed with `Denied`
#[track_caller]
pub fn assert_denied<T: Debug>(result: &Result<T>) {
    assert!(
        matches!(result, Err(KeyringError::Denied { .. })),
        "expected Denied, got {result:?}"
    );
}

/// Assert the operation failed with `NotFound`
#[track_caller]
pub fn assert_not_found<T: Debug>(result: &Result<T>) {
    assert!(
        matches!(result, Err(KeyringError::NotFound { .. })),
        "expected NotFound, got {result:?}"
    );
}

/// Assert the operation failed with `InvalidTarget`
#[track_caller]
pub fn assert_invalid_target<T: Debug>(result: &Result<T>) {
    assert!(
        matches!(result, Err(KeyringError::InvalidTarget { .. })),
        "expected InvalidTarget, got {result:?}"
    );
}

/// Assert a read succeeded with exactly `expected`
#[track_caller]
pub fn assert_payload(result: &Result<Vec<u8>>, expected: &[u8]) {
    match result {
        Ok(payload) => assert_eq!(payload.as_slice(), expected, "payload mismatch"),
        Err(err) => panic!("expected payload, got error: {err}"),
    }
}
