//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + environment
//!     → loader.rs (parse, env overrides)
//!     → validation.rs (semantic checks)
//!     → ShimConfig (validated, immutable)
//!     → owned by the server's InnerState
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server rebuilds InnerState and swaps it in atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Rewrite toggles are handed to the rewriter per request, never read globally

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, RewriteConfig, SecurityConfig, ShimConfig,
    StorefrontConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
