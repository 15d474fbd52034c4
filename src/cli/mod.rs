//! CLI entrypoint module structure.

pub mod args;
pub mod profile;

pub use args::LaunchArgs;
pub use profile::{resolve_config_path, LaunchProfile, RunMode};
