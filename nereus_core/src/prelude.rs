// nereus_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::allocation::{ThrustAllocator, Allocation, AllocatorKind, SolveReport, SolverSettings};
pub use crate::models::dynamics::AccelerationModel;
pub use crate::types::{Accel6, Dof, TfProvider};

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::context::AllocationContext;
pub use crate::frames::FrameId;
pub use crate::messages::{AccelCommand, InertialMeasurement, InputEvent, ThrustSolution};
pub use crate::state::{SharedVehicleState, VehicleState};
pub use crate::vehicle::{ThrusterId, ThrusterSpec, Vehicle, VehicleParameters};
pub use crate::error::{ConfigError, InputError, NereusError};
pub use crate::validation::InputLimits;

// --- Concrete Implementations (Export common ones for convenience) ---
pub use crate::allocation::active_set::ActiveSetAllocator;
pub use crate::allocation::gauss_newton::GaussNewtonAllocator;
pub use crate::models::dynamics::RigidBodyModel;
