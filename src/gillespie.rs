use crate::error::{Error, Result};
use crate::network::{checked_stoichiometry, ReactionNetwork};
use ndarray::{Array1, Array2};
use rand::distr::Open01;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Passing this as a deadline lets a trajectory run without a time limit.
pub const NO_DEADLINE: f64 = f64::INFINITY;

/// Snapshot of a stochastic trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GillespieState {
    pub population: Array1<i64>,
    pub time: f64,
}

/// Exact stochastic simulation of a [`ReactionNetwork`] with Gillespie's
/// direct method.
///
/// Every engine owns its random stream, so engines never share state and
/// a seeded engine always reproduces the same trajectory.
pub struct Gillespie<M: ReactionNetwork> {
    network: M,
    stoichiometry: Array2<i64>,
    population: Array1<i64>,
    time: f64,
    rng: StdRng,
}

fn has_deadline(deadline: f64) -> bool {
    deadline > 0.
}

impl<M: ReactionNetwork> Gillespie<M> {
    /// Starts at the zero population and time zero with a seed drawn from the
    /// operating system.
    pub fn new(network: M) -> Result<Self> {
        Self::with_seed(network, rand::rng().random::<u64>())
    }

    pub fn with_seed(network: M, seed: u64) -> Result<Self> {
        let stoichiometry = checked_stoichiometry(&network)?;
        let population = Array1::zeros(network.num_species());
        debug!(
            num_species = network.num_species(),
            num_channels = network.num_channels(),
            seed,
            "created stochastic simulation engine"
        );
        Ok(Gillespie {
            network,
            stoichiometry,
            population,
            time: 0.,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn network(&self) -> &M {
        &self.network
    }

    pub fn population(&self) -> &Array1<i64> {
        &self.population
    }

    pub fn set_population(&mut self, population: Array1<i64>) -> Result<()> {
        if population.len() != self.network.num_species() {
            return Err(Error::DimensionMismatch {
                expected: self.network.num_species(),
                found: population.len(),
            });
        }
        self.population = population;
        Ok(())
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn state(&self) -> GillespieState {
        GillespieState {
            population: self.population.clone(),
            time: self.time,
        }
    }

    pub fn set_state(&mut self, state: GillespieState) -> Result<()> {
        self.set_population(state.population)?;
        self.time = state.time;
        Ok(())
    }

    /// Propensity of every channel at the current population.
    pub fn propensities(&self) -> Result<Array1<f64>> {
        (0..self.network.num_channels())
            .map(|channel| self.network.propensity(self.population.view(), channel))
            .collect()
    }

    pub fn total_propensity(&self) -> Result<f64> {
        Ok(self.propensities()?.sum())
    }

    /// Fires one reaction without a time limit. Returns `false` if no channel
    /// can fire.
    pub fn step(&mut self) -> Result<bool> {
        self.step_until(NO_DEADLINE)
    }

    /// Fires one reaction unless the system is absorbed or the next event
    /// would land after `deadline`. In both of those cases nothing changes and
    /// `false` is returned. Non-positive deadlines are ignored.
    pub fn step_until(&mut self, deadline: f64) -> Result<bool> {
        let propensities = self.propensities()?;
        let total = propensities.sum();
        if total <= 0. {
            trace!(time = self.time, "no channel can fire");
            return Ok(false);
        }

        let tau = -self.rng.sample::<f64, _>(Open01).ln() / total;
        let threshold = self.rng.sample::<f64, _>(Open01) * total;
        if has_deadline(deadline) && self.time + tau > deadline {
            trace!(time = self.time, tau, deadline, "next event beyond deadline");
            return Ok(false);
        }

        // Rounding can leave the running sum just short of the total, in
        // which case the last channel fires.
        let last = propensities.len() - 1;
        let mut channel = last;
        let mut accumulated = 0.;
        for (r, &a) in propensities.iter().enumerate().take(last) {
            accumulated += a;
            if accumulated > threshold {
                channel = r;
                break;
            }
        }

        self.time += tau;
        self.population += &self.stoichiometry.row(channel);
        trace!(time = self.time, channel, "fired");
        Ok(true)
    }

    /// Takes at most `num_steps` steps, stopping early once the system is
    /// absorbed or the clock passes `deadline`. Returns the number of
    /// reactions fired.
    pub fn simulate(&mut self, num_steps: usize, deadline: f64) -> Result<usize> {
        let mut fired = 0;
        while fired < num_steps && (!has_deadline(deadline) || self.time <= deadline) {
            if !self.step_until(deadline)? {
                break;
            }
            fired += 1;
        }
        debug!(fired, time = self.time, "trajectory finished");
        Ok(fired)
    }

    /// Like [`Gillespie::simulate`], appending a snapshot to `states` after
    /// every reaction and, if `include_initial`, before the first one.
    pub fn simulate_recording(
        &mut self,
        states: &mut Vec<GillespieState>,
        num_steps: usize,
        deadline: f64,
        include_initial: bool,
    ) -> Result<usize> {
        if include_initial {
            states.push(self.state());
        }
        let mut fired = 0;
        while fired < num_steps && (!has_deadline(deadline) || self.time <= deadline) {
            if !self.step_until(deadline)? {
                break;
            }
            fired += 1;
            states.push(self.state());
        }
        debug!(fired, time = self.time, "trajectory finished");
        Ok(fired)
    }
}
