//! Trap module tests
//!
//! - Recorder state machine and verification
//! - Shared trapping flag
