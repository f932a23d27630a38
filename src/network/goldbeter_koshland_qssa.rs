use super::*;
use ndarray::arr2;

/// Total quasi-steady-state reduction of [`GoldbeterKoshland`], tracking the
/// total phosphorylated substrate `ŜP = SP + CP`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldbeterKoshlandTqssa {
    pub kme: f64,
    pub ke: f64,
    pub kmd: f64,
    pub kd: f64,
    pub et: i64,
    pub dt: i64,
    pub st: i64,
}

impl GoldbeterKoshlandTqssa {
    pub const SP_HAT: usize = 0;

    pub const E: usize = 0;
    pub const D: usize = 1;

    pub fn new(kme: f64, ke: f64, kmd: f64, kd: f64, et: i64, dt: i64, st: i64) -> Self {
        GoldbeterKoshlandTqssa {
            kme,
            ke,
            kmd,
            kd,
            et,
            dt,
            st,
        }
    }
}

impl ReactionNetwork for GoldbeterKoshlandTqssa {
    fn num_species(&self) -> usize {
        1
    }

    fn num_channels(&self) -> usize {
        2
    }

    fn stoichiometry(&self) -> Array2<i64> {
        arr2(&[[1], [-1]])
    }

    fn is_consistent(&self, state: ArrayView1<i64>) -> bool {
        0 <= state[Self::SP_HAT] && state[Self::SP_HAT] <= self.st
    }

    fn propensity(&self, state: ArrayView1<i64>, channel: usize) -> Result<f64> {
        if !self.is_consistent(state) {
            return Err(Error::domain(state));
        }
        let sp_hat = state[Self::SP_HAT];
        match channel {
            Self::E => Ok(tqssa_rate(self.ke, self.kme, self.et, self.st - sp_hat)),
            Self::D => Ok(tqssa_rate(self.kd, self.kmd, self.dt, sp_hat)),
            _ => Err(channel_out_of_range(channel, self.num_channels())),
        }
    }

    fn population_bounds(&self) -> Vec<i64> {
        vec![self.st + 1]
    }

    fn species_names(&self) -> Vec<&'static str> {
        vec!["SP_hat"]
    }

    fn channel_names(&self) -> Vec<&'static str> {
        vec!["e", "d"]
    }
}

/// Standard quasi-steady-state reduction of [`GoldbeterKoshland`]: both
/// branches follow Michaelis-Menten kinetics in the free substrate forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldbeterKoshlandSqssa {
    pub kme: f64,
    pub ke: f64,
    pub kmd: f64,
    pub kd: f64,
    pub et: i64,
    pub dt: i64,
    pub st: i64,
}

impl GoldbeterKoshlandSqssa {
    pub const SP: usize = 0;

    pub const E: usize = 0;
    pub const D: usize = 1;

    pub fn new(kme: f64, ke: f64, kmd: f64, kd: f64, et: i64, dt: i64, st: i64) -> Self {
        GoldbeterKoshlandSqssa {
            kme,
            ke,
            kmd,
            kd,
            et,
            dt,
            st,
        }
    }
}

impl ReactionNetwork for GoldbeterKoshlandSqssa {
    fn num_species(&self) -> usize {
        1
    }

    fn num_channels(&self) -> usize {
        2
    }

    fn stoichiometry(&self) -> Array2<i64> {
        arr2(&[[1], [-1]])
    }

    fn is_consistent(&self, state: ArrayView1<i64>) -> bool {
        0 <= state[Self::SP] && state[Self::SP] <= self.st
    }

    fn propensity(&self, state: ArrayView1<i64>, channel: usize) -> Result<f64> {
        if !self.is_consistent(state) {
            return Err(Error::domain(state));
        }
        let sp = state[Self::SP] as f64;
        match channel {
            Self::E => {
                let s = self.st as f64 - sp;
                Ok(self.ke * self.et as f64 * s / (s + self.kme))
            }
            Self::D => Ok(self.kd * self.dt as f64 * sp / (sp + self.kmd)),
            _ => Err(channel_out_of_range(channel, self.num_channels())),
        }
    }

    fn population_bounds(&self) -> Vec<i64> {
        vec![self.st + 1]
    }

    fn species_names(&self) -> Vec<&'static str> {
        vec!["SP"]
    }

    fn channel_names(&self) -> Vec<&'static str> {
        vec!["e", "d"]
    }
}
