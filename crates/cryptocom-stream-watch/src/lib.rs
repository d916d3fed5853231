/*
[INPUT]:  Public API exports for cryptocom-stream-watch crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod runner;

pub use config::{WatchConfig, WatchKind, WatchSpec};
pub use runner::WatchRunner;
