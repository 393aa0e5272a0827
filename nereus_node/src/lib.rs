// nereus_node/src/lib.rs

// This prelude is for convenience for other files WITHIN the nereus_node crate.
pub mod prelude;

pub mod cli;
pub mod config;
pub mod logging;
pub mod runtime;
pub mod scenario;
