// Subcommands. Each returns a report whose `Display` is the stdout text.

pub mod features;
pub mod ingest;
pub mod predict;
