//! Core business logic for Noxa.
//!
//! Services own the use cases of the platform: accounts and sessions, the
//! publication catalog, the follow graph, collections, discussions,
//! notification fan-out and search history. Multi-step writes run inside a
//! single database transaction.

pub mod services;

#[cfg(test)]
mod test_support;

pub use services::*;
