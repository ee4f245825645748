//! Editor module tests

mod controller_tests;
