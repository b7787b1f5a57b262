//! Output verification
//!
//! Checks that the stream-copied streams of a converted file decode to
//! exactly the same content as their sources.

pub mod digest_cache;
pub mod verifier;

pub use digest_cache::CachedStreamHasher;
pub use verifier::IntegrityVerifier;
