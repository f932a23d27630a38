use super::*;
use ndarray::arr2;

/// Single-substrate enzyme kinetics, `E + S <-> C -> E + P`.
///
/// The free enzyme and substrate populations follow from the conserved
/// totals, so only the complex `C` and the product `P` are tracked:
/// `E = ET - C` and `S = ST - C - P`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleSubstrate {
    pub kf: f64,
    pub kb: f64,
    pub kcat: f64,
    pub et: i64,
    pub st: i64,
}

impl SingleSubstrate {
    pub const C: usize = 0;
    pub const P: usize = 1;

    pub const F: usize = 0;
    pub const B: usize = 1;
    pub const CAT: usize = 2;

    pub fn new(kf: f64, kb: f64, kcat: f64, et: i64, st: i64) -> Self {
        SingleSubstrate {
            kf,
            kb,
            kcat,
            et,
            st,
        }
    }

    /// `(kb + kcat) / kf`
    pub fn michaelis_constant(&self) -> f64 {
        (self.kb + self.kcat) / self.kf
    }

    pub fn tqssa(&self) -> SingleSubstrateTqssa {
        SingleSubstrateTqssa::new(self.michaelis_constant(), self.kcat, self.et, self.st)
    }

    pub fn sqssa(&self) -> SingleSubstrateSqssa {
        SingleSubstrateSqssa::new(self.michaelis_constant(), self.kcat, self.et, self.st)
    }
}

impl ReactionNetwork for SingleSubstrate {
    fn num_species(&self) -> usize {
        2
    }

    fn num_channels(&self) -> usize {
        3
    }

    fn stoichiometry(&self) -> Array2<i64> {
        //     C, P
        arr2(&[
            [1, 0],  // f
            [-1, 0], // b
            [-1, 1], // cat
        ])
    }

    fn is_consistent(&self, state: ArrayView1<i64>) -> bool {
        let (c, p) = (state[Self::C], state[Self::P]);
        0 <= c && 0 <= p && c <= self.et && c + p <= self.st
    }

    fn propensity(&self, state: ArrayView1<i64>, channel: usize) -> Result<f64> {
        if !self.is_consistent(state) {
            return Err(Error::domain(state));
        }
        let (c, p) = (state[Self::C], state[Self::P]);
        match channel {
            Self::F => Ok(self.kf * ((self.et - c) * (self.st - c - p)) as f64),
            Self::B => Ok(self.kb * c as f64),
            Self::CAT => Ok(self.kcat * c as f64),
            _ => Err(channel_out_of_range(channel, self.num_channels())),
        }
    }

    fn population_bounds(&self) -> Vec<i64> {
        vec![self.et + 1, self.st + 1]
    }

    fn species_names(&self) -> Vec<&'static str> {
        vec!["C", "P"]
    }

    fn channel_names(&self) -> Vec<&'static str> {
        vec!["f", "b", "cat"]
    }
}
