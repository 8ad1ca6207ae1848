//! # Glide Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion groups for the dispatcher hot path
//! │   └── dispatch.rs
//! │
//! └── integration/      # Client, listener and simulated core end to end
//!     └── flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p glide-tests
//!
//! # By category
//! cargo test -p glide-tests integration::
//!
//! # Benchmarks
//! cargo bench -p glide-tests
//! ```

pub mod integration;
