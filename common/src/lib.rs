pub mod config;
pub mod yaml_include;

/// Common utilities shared across the storefront workspace
///
/// This crate provides functionality used by both the generic `storefront`
/// core and the `growth_shop` deployment:
///
/// - Configuration structures and loading
/// - YAML `!include` resolution used by build scripts
/// - Shared test helpers for unique identifiers

// Test helpers module - available for both development and test builds
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(any(test, feature = "test-helpers"))]
pub use test_helpers::{generate_unique_id, get_test_database_url, unique_email};
