#[path = "integration/fixtures/mod.rs"]
mod fixtures;

#[path = "integration/sync/mod.rs"]
mod sync;
#[cfg(feature = "cli")]
#[path = "integration/cli/mod.rs"]
mod cli;
