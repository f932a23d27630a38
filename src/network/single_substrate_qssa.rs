use super::*;
use ndarray::arr2;

/// Total quasi-steady-state reduction of [`SingleSubstrate`].
///
/// Tracks only the product. The complex is slaved to the total substrate
/// `Ŝ = ST - P` through the smaller root of `C^2 - (ET + Ŝ + kM) C + ET Ŝ = 0`,
/// and products appear at rate `kcat C`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleSubstrateTqssa {
    pub km: f64,
    pub kcat: f64,
    pub et: i64,
    pub st: i64,
}

impl SingleSubstrateTqssa {
    pub const P: usize = 0;

    pub const F: usize = 0;

    pub fn new(km: f64, kcat: f64, et: i64, st: i64) -> Self {
        SingleSubstrateTqssa { km, kcat, et, st }
    }
}

impl ReactionNetwork for SingleSubstrateTqssa {
    fn num_species(&self) -> usize {
        1
    }

    fn num_channels(&self) -> usize {
        1
    }

    fn stoichiometry(&self) -> Array2<i64> {
        arr2(&[[1]])
    }

    fn is_consistent(&self, state: ArrayView1<i64>) -> bool {
        0 <= state[Self::P] && state[Self::P] <= self.st
    }

    fn propensity(&self, state: ArrayView1<i64>, channel: usize) -> Result<f64> {
        if !self.is_consistent(state) {
            return Err(Error::domain(state));
        }
        match channel {
            Self::F => Ok(tqssa_rate(
                self.kcat,
                self.km,
                self.et,
                self.st - state[Self::P],
            )),
            _ => Err(channel_out_of_range(channel, self.num_channels())),
        }
    }

    fn population_bounds(&self) -> Vec<i64> {
        vec![self.st + 1]
    }

    fn species_names(&self) -> Vec<&'static str> {
        vec!["P"]
    }

    fn channel_names(&self) -> Vec<&'static str> {
        vec!["f"]
    }
}

/// Standard quasi-steady-state (Michaelis-Menten) reduction of
/// [`SingleSubstrate`]: products appear at rate `kcat ET S / (S + kM)` with
/// `S = ST - P`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleSubstrateSqssa {
    pub km: f64,
    pub kcat: f64,
    pub et: i64,
    pub st: i64,
}

impl SingleSubstrateSqssa {
    pub const P: usize = 0;

    pub const F: usize = 0;

    pub fn new(km: f64, kcat: f64, et: i64, st: i64) -> Self {
        SingleSubstrateSqssa { km, kcat, et, st }
    }
}

impl ReactionNetwork for SingleSubstrateSqssa {
    fn num_species(&self) -> usize {
        1
    }

    fn num_channels(&self) -> usize {
        1
    }

    fn stoichiometry(&self) -> Array2<i64> {
        arr2(&[[1]])
    }

    fn is_consistent(&self, state: ArrayView1<i64>) -> bool {
        0 <= state[Self::P] && state[Self::P] <= self.st
    }

    fn propensity(&self, state: ArrayView1<i64>, channel: usize) -> Result<f64> {
        if !self.is_consistent(state) {
            return Err(Error::domain(state));
        }
        match channel {
            Self::F => {
                let s = (self.st - state[Self::P]) as f64;
                Ok(self.kcat * self.et as f64 * s / (s + self.km))
            }
            _ => Err(channel_out_of_range(channel, self.num_channels())),
        }
    }

    fn population_bounds(&self) -> Vec<i64> {
        vec![self.st + 1]
    }

    fn species_names(&self) -> Vec<&'static str> {
        vec!["P"]
    }

    fn channel_names(&self) -> Vec<&'static str> {
        vec!["f"]
    }
}
