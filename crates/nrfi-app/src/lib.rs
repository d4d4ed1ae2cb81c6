// Library root for the `nrfi` binary, exposed for integration tests.

pub mod cli;
pub mod commands;
pub mod config;
