//! API types for dataweb-web JSON serialization.
//!
//! One `ApiDashboard` is the complete projected view of one feed poll,
//! ready for web clients to render without re-applying any rules.

pub mod convert;
pub mod snapshot;
