//! Common test utilities and helpers
//!
//! Canned provider responses and assertion helpers shared by the
//! integration suites.

#![allow(dead_code)]

pub mod assertion_helpers;
pub mod test_fixtures;
