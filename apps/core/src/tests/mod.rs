//! Test Module
//!
//! Cross-module test suites for the wellness chat core.
//!
//! ## Test Categories
//! - `brain_tests`: rule ordering, crisis priority, fallback totality
//! - `session_tests`: session state machine, backends, cancellation
