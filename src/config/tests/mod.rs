//! Config module tests
//!
//! - Library store (open, read, backups)
//! - Transactions (commit, validation, rollback)
//! - Library validation
//! - Settings loading
//! - File watching

mod settings_tests;
mod validator_tests;
