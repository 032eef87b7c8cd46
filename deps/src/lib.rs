//! pinned third-party crates shared across the workspace
//!
//! crates that need the exact same version on both sides of a public API
//! are re-exported from here instead of being listed in every manifest.

pub use bigdecimal;
pub use serde_json;
