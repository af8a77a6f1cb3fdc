pub mod loader;
pub mod schema;

pub use loader::{load, load_from_path, load_from_str, locate, ConfigError, ConfigOrigin, CONFIG_ENV};
pub use schema::{ProjectConfig, ResolvedGlobs, ValidationError, ValidationIssue};
