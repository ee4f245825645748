//! IPC module tests
//!
//! - Client queries against a live `IpcServer`
//! - Timeouts and stale replies against a scripted fake editor
//! - Blocking probe used by the action worker
