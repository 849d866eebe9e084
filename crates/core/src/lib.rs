pub mod cluster;
pub mod config;
pub mod error;
pub mod profile;
pub mod score;

pub use cluster::*;
pub use config::*;
pub use error::*;
pub use profile::*;
pub use score::*;

/// Version stamped into serialized profiles and matrices. Bump when a
/// persisted layout changes shape.
pub const SCHEMA_VERSION: u32 = 1;
