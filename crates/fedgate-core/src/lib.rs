//! # fedgate-core
//!
//! Shared primitives for the fedgate identity-federation node.
//!
//! This crate provides:
//! - An injectable clock abstraction so time-dependent behavior (TTL
//!   expiry, token timestamps, metadata validity windows) is deterministic
//!   in tests
//! - Digest helpers shared by the token and metadata layers

pub mod clock;
pub mod digest;

pub use clock::{Clock, ManualClock, SystemClock};
pub use digest::{sha256_base64, sha256_base64url};
