//! Testing utilities for code built on top of the SCM clients.
//!
//! [`FakeTransport`] stands in for a provider's REST API so adapters can be
//! connected and exercised entirely in memory.

mod fake_transport;

pub use fake_transport::FakeTransport;
