use ndarray::ArrayView1;
use thiserror::Error;

/// Failures raised by the simulation engines and the reaction networks they
/// drive.
///
/// A state where every propensity is zero is not an error: the engines report
/// it through the `false` return of `step`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid parameters handed to a constructor.
    #[error("construction error: {0}")]
    Construction(String),

    /// The population is inconsistent with the conserved quantities of the
    /// model. Always fatal for the current run.
    #[error("current state {state:?} is incompatible with constants of motion")]
    Domain { state: Vec<i64> },

    #[error("reaction channel index {channel} out of bounds ({num_channels} channels)")]
    ChannelOutOfRange { channel: usize, num_channels: usize },

    #[error("species index {species} out of bounds ({num_species} species)")]
    SpeciesOutOfRange { species: usize, num_species: usize },

    #[error("dimension mismatch: expected {expected} entries, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A run parameter such as a time step or sampling stride is unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn domain(state: ArrayView1<i64>) -> Self {
        Error::Domain {
            state: state.to_vec(),
        }
    }
}
