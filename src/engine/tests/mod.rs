//! Engine module tests
//!
//! - Dispatcher resolution and outcomes
//! - Action worker semantics (ordering, confirmation, failures, probe)
//! - Daemon start-up and reload
//! - Daemon state switches

mod dispatcher_tests;
