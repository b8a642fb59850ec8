//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → consumed once at startup to build the routing table
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; backend targets are static
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ForwardConfig, LogFormat, ObservabilityConfig, ProxyConfig, ReverseConfig,
    SelectionStrategy, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
