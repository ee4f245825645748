//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Conflict detection tests
//! - Registry registration/lookup tests
//! - Library editing tests
//! - Action contract tests
//! - Shortcut parser tests
//! - Input validation tests

#[cfg(test)]
mod parser_tests;
#[cfg(test)]
mod registry_tests;
