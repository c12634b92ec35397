//! # pcs
//!
//! Parallel Constraint Satisfaction (PCS) network simulation.
//!
//! A PCS network is a small, fully-connected activation-spreading model used to
//! predict choice, decision time and confidence in decision tasks. This crate
//! provides the iterative engine: given an interconnection matrix it repeatedly
//! updates the node activations until every registered convergence criterion is
//! satisfied, logging the full trajectory and the network energy at each step.
//!
//! ## Quick Start
//!
//! ```
//! use pcs::prelude::*;
//!
//! // Source node 0 feeds two mutually inhibiting options through one cue.
//! let matrix = Matrix::from_rows(vec![
//!     vec![0.0, 0.1, 0.0, 0.0],
//!     vec![0.1, 0.0, 0.01, -0.01],
//!     vec![0.0, 0.01, 0.0, -0.2],
//!     vec![0.0, -0.01, -0.2, 0.0],
//! ])
//! .unwrap();
//!
//! let result = run_from_matrix(matrix, default_criteria()).unwrap();
//! let settled_at = result.convergence_of("default").unwrap();
//! assert!(settled_at > 10);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `serde` (default): Serialization of configs, matrices and results
//! - `parallel`: Multi-threaded net-input computation via rayon
//!
//! ## no_std Support
//!
//! Disable default features for `no_std` environments:
//! ```toml
//! pcs = { version = "0.1", default-features = false }
//! ```
//!
//! ## Modules
//!
//! - [`network`]: Interconnection matrix and validated network inputs
//! - [`state`]: Reset (clamping) of the state vector
//! - [`energy`]: Network energy
//! - [`update`]: Activation update rule
//! - [`buffer`]: Block-grown row storage
//! - [`history`]: Per-iteration trajectory log
//! - [`convergence`]: Pluggable convergence criteria
//! - [`simulation`]: The iteration loop and result record
//! - [`observer`]: Read-only decision read-outs

// no_std support
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/network.rs"]
pub mod network;

#[path = "core/state.rs"]
pub mod state;

#[path = "core/energy.rs"]
pub mod energy;

#[path = "core/update.rs"]
pub mod update;

#[path = "core/buffer.rs"]
pub mod buffer;

#[path = "core/history.rs"]
pub mod history;

#[path = "core/convergence.rs"]
pub mod convergence;

#[path = "core/simulation.rs"]
pub mod simulation;

pub mod observer;

pub use error::{PcsError, PcsResult};
pub use simulation::{run, run_from_matrix};

/// Prelude module for convenient imports.
///
/// ```
/// use pcs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::convergence::{
        default_criteria, ConvergenceCriterion, Criterion, CriterionMode, CriterionOutput,
        IterationLimit, McClellandRumelhart,
    };
    pub use crate::error::{PcsError, PcsResult};
    pub use crate::history::{History, HistoryRow};
    pub use crate::network::{Activation, Matrix, Network, Weight};
    pub use crate::observer::{DecisionSnapshot, ResultAdapter};
    pub use crate::simulation::{
        run, run_from_matrix, ExecutionTier, PcsConfig, Phase, Simulation, SimulationResult,
        Termination,
    };
}
