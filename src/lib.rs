//! Library crate root for the pgtunnel launcher.

#[path = "lib/mod.rs"]
pub mod lib_mod;
pub use lib_mod as lib;
pub mod cli;
pub mod config;
pub mod launch;
pub mod runtime;
