//! Stochastic chemical kinetics: exact stochastic simulation and direct
//! integration of the chemical master equation for small reaction networks.

pub mod analysis;
pub mod cme;
pub mod config;
pub mod error;
pub mod gillespie;
pub mod integrator;
pub mod lattice;
pub mod network;
pub mod serialize;
pub mod simulate;

pub use cme::{Cme, CmeState};
pub use error::{Error, Result};
pub use gillespie::{Gillespie, GillespieState, NO_DEADLINE};
pub use integrator::{ExplicitRungeKutta, Integrator, Method};
pub use lattice::Lattice;
pub use network::{Network, ReactionNetwork};
