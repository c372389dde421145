pub mod probe;
pub mod run;

// Re-export command functions for convenience
pub use probe::{probe, ticker};
pub use run::{run, RunOverrides};
