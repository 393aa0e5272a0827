// nereus_core/src/lib.rs

//! # Nereus Core
//!
//! Framework-agnostic thrust allocation for an underwater vehicle with a
//! redundant, fixed thruster layout.
//!
//! ## Modules
//!
//! - [`vehicle`]: thruster geometry and mass properties, validated once at startup
//! - [`state`]: the inertial snapshot a solve reads
//! - [`messages`]: timestamped input events and the published solution
//! - [`models`]: the rigid-body acceleration model
//! - [`allocation`]: bounded least-squares allocators
//! - [`context`]: the context object the control loop owns

pub mod allocation;
pub mod context;
pub mod error;
pub mod frames;
pub mod messages;
pub mod models;
pub mod prelude;
pub mod reference;
pub mod state;
pub mod types;
pub mod validation;
pub mod vehicle;
