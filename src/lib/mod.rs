//! Shared library modules providing error types, command builders, secrets, and telemetry.

pub mod commands;
pub mod errors;
pub mod paths;
pub mod secret;
pub mod telemetry;
