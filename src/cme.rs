use crate::error::{Error, Result};
use crate::integrator::Integrator;
use crate::lattice::Lattice;
use crate::network::{checked_stoichiometry, ReactionNetwork};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use tracing::{debug, trace};

/// Raw moments up to this order are computed together in one sweep and
/// cached until the distribution changes.
pub const MAX_CACHED_MOMENT: u32 = 3;

/// Snapshot of a master equation solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmeState {
    pub probability: Array1<f64>,
    pub time: f64,
}

/// Deterministic solution of the chemical master equation of a
/// [`ReactionNetwork`] on a finite population lattice.
///
/// The full probability distribution is stored densely, one entry per lattice
/// point, and advanced with a pluggable explicit [`Integrator`]. Lattice
/// points which contradict the conserved totals of the network carry no
/// dynamics.
#[derive(Debug, Clone)]
pub struct Cme<M: ReactionNetwork> {
    network: M,
    stoichiometry: Array2<i64>,
    lattice: Lattice,
    probability: Array1<f64>,
    time: f64,
    // Row per species, column `k` holds E[y^(k + 1)].
    moments: OnceCell<Array2<f64>>,
}

impl<M: ReactionNetwork> Cme<M> {
    /// Uses the population bounds reported by the network.
    pub fn new(network: M) -> Result<Self> {
        let bounds = network.population_bounds();
        Self::with_bounds(network, bounds)
    }

    /// Starts with all probability on the zero population at time zero.
    pub fn with_bounds(network: M, bounds: Vec<i64>) -> Result<Self> {
        let stoichiometry = checked_stoichiometry(&network)?;
        if bounds.len() != network.num_species() {
            return Err(Error::Construction(format!(
                "got {} population bounds for {} species",
                bounds.len(),
                network.num_species()
            )));
        }
        let lattice = Lattice::new(bounds)?;
        let mut probability = Array1::zeros(lattice.len());
        probability[0] = 1.;
        debug!(
            bounds = ?lattice.bounds(),
            num_states = lattice.len(),
            "created master equation engine"
        );
        Ok(Cme {
            network,
            stoichiometry,
            lattice,
            probability,
            time: 0.,
            moments: OnceCell::new(),
        })
    }

    pub fn network(&self) -> &M {
        &self.network
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn index(&self, population: &[i64]) -> usize {
        self.lattice.index(population)
    }

    pub fn pop(&self, index: usize) -> Array1<i64> {
        self.lattice.pop(index)
    }

    pub fn probability(&self) -> &Array1<f64> {
        &self.probability
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> CmeState {
        CmeState {
            probability: self.probability.clone(),
            time: self.time,
        }
    }

    pub fn set_state(&mut self, state: CmeState) -> Result<()> {
        if state.probability.len() != self.lattice.len() {
            return Err(Error::DimensionMismatch {
                expected: self.lattice.len(),
                found: state.probability.len(),
            });
        }
        self.probability = state.probability;
        self.time = state.time;
        self.moments.take();
        Ok(())
    }

    /// Right hand side of the master equation at distribution `p`.
    pub fn derivative(&self, p: ArrayView1<f64>) -> Result<Array1<f64>> {
        master_equation(&self.network, &self.stoichiometry, &self.lattice, p)
    }

    /// Advances the distribution by `dt`. On error the state is unchanged.
    pub fn step<I: Integrator + ?Sized>(&mut self, integrator: &mut I, dt: f64) -> Result<()> {
        if !(dt > 0.) {
            return Err(Error::InvalidArgument(format!(
                "time step must be positive, got {}",
                dt
            )));
        }
        let (network, stoichiometry, lattice) = (&self.network, &self.stoichiometry, &self.lattice);
        let next = integrator.step(self.probability.view(), dt, &mut |p| {
            master_equation(network, stoichiometry, lattice, p)
        })?;
        self.probability = next;
        self.time += dt;
        self.moments.take();
        trace!(time = self.time, "integrated");
        Ok(())
    }

    /// Steps while the clock has not passed `t_final`, so the final time lies
    /// within one `dt` beyond it. Returns the number of steps taken.
    pub fn simulate<I: Integrator + ?Sized>(
        &mut self,
        integrator: &mut I,
        dt: f64,
        t_final: f64,
    ) -> Result<usize> {
        let mut steps = 0;
        while self.time <= t_final {
            self.step(integrator, dt)?;
            steps += 1;
        }
        debug!(steps, time = self.time, "master equation solved");
        Ok(steps)
    }

    /// Like [`Cme::simulate`], appending a snapshot to `states` before the
    /// first step and after every `sampling_stride` steps.
    pub fn simulate_recording<I: Integrator + ?Sized>(
        &mut self,
        integrator: &mut I,
        dt: f64,
        t_final: f64,
        sampling_stride: usize,
        states: &mut Vec<CmeState>,
    ) -> Result<usize> {
        if sampling_stride == 0 {
            return Err(Error::InvalidArgument(
                "sampling stride must be at least 1".to_string(),
            ));
        }
        states.push(self.state());
        let mut steps = 0;
        while self.time <= t_final {
            self.step(integrator, dt)?;
            steps += 1;
            if steps % sampling_stride == 0 {
                states.push(self.state());
            }
        }
        debug!(steps, time = self.time, "master equation solved");
        Ok(steps)
    }

    fn check_species(&self, species: usize) -> Result<()> {
        if species >= self.lattice.num_species() {
            return Err(Error::SpeciesOutOfRange {
                species,
                num_species: self.lattice.num_species(),
            });
        }
        Ok(())
    }

    fn moment_table(&self) -> &Array2<f64> {
        self.moments.get_or_init(|| {
            let order = MAX_CACHED_MOMENT as usize;
            let mut table = Array2::zeros((self.lattice.num_species(), order));
            for (point, &p) in self.lattice.iter().zip(self.probability.iter()) {
                if p == 0. {
                    continue;
                }
                for (species, &y) in point.iter().enumerate() {
                    let y = y as f64;
                    let mut power = 1.;
                    for k in 0..order {
                        power *= y;
                        table[[species, k]] += power * p;
                    }
                }
            }
            table
        })
    }

    /// Raw moment `E[y_species^n]`. Orders up to [`MAX_CACHED_MOMENT`] come
    /// from the cache; higher orders cost a sweep over the lattice. Orders
    /// above `i32::MAX` are rejected.
    pub fn nth_moment(&self, species: usize, n: u32) -> Result<f64> {
        self.check_species(species)?;
        if (1..=MAX_CACHED_MOMENT).contains(&n) {
            return Ok(self.moment_table()[[species, n as usize - 1]]);
        }
        let exponent = i32::try_from(n)
            .map_err(|_| Error::InvalidArgument(format!("moment order {} is too large", n)))?;
        Ok(self
            .probability
            .iter()
            .enumerate()
            .map(|(index, &p)| (self.lattice.coordinate(index, species) as f64).powi(exponent) * p)
            .sum())
    }

    pub fn mean(&self, species: usize) -> Result<f64> {
        self.nth_moment(species, 1)
    }

    /// Mean square `E[y^2]`.
    pub fn msq(&self, species: usize) -> Result<f64> {
        self.nth_moment(species, 2)
    }

    /// Standard deviation. Rounding can push `E[y^2] - E[y]^2` slightly below
    /// zero; such values are clamped.
    pub fn sd(&self, species: usize) -> Result<f64> {
        let mean = self.mean(species)?;
        Ok((self.msq(species)? - mean * mean).max(0.).sqrt())
    }

    /// Marginal distribution of one species, indexed by population.
    pub fn marginal(&self, species: usize) -> Result<Array1<f64>> {
        self.check_species(species)?;
        let mut marginal = Array1::zeros(self.lattice.bounds()[species] as usize);
        for (point, &p) in self.lattice.iter().zip(self.probability.iter()) {
            marginal[point[species] as usize] += p;
        }
        Ok(marginal)
    }
}

/// `dp[x] = sum_r a_r(x - nu_r) p[x - nu_r] - a_r(x) p[x]` over every lattice
/// point `x` consistent with the network. Sources outside the lattice or
/// inconsistent with the network contribute nothing, while outflow towards
/// points beyond the lattice is lost.
fn master_equation<M: ReactionNetwork>(
    network: &M,
    stoichiometry: &Array2<i64>,
    lattice: &Lattice,
    p: ArrayView1<f64>,
) -> Result<Array1<f64>> {
    let mut dp = Array1::zeros(lattice.len());
    let mut x = vec![0; lattice.num_species()];
    let mut source = vec![0; lattice.num_species()];
    for i in 0..lattice.len() {
        let state = ArrayView1::from(&x[..]);
        if network.is_consistent(state) {
            let mut flow = 0.;
            for (channel, nu) in stoichiometry.outer_iter().enumerate() {
                for ((s, &y), &n) in source.iter_mut().zip(x.iter()).zip(nu.iter()) {
                    *s = y - n;
                }
                let from = ArrayView1::from(&source[..]);
                if lattice.in_bounds(&source) && network.is_consistent(from) {
                    flow += network.propensity(from, channel)? * p[lattice.index(&source)];
                }
                flow -= network.propensity(state, channel)? * p[i];
            }
            dp[i] = flow;
        }
        lattice.advance(&mut x);
    }
    Ok(dp)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::integrator::{ExplicitRungeKutta, Method};
    use crate::network::tests::BirthDeath;
    use crate::network::{SingleSubstrate, SingleSubstrateSqssa};
    use ndarray::arr1;

    fn enzyme() -> SingleSubstrate {
        SingleSubstrate::new(10., 9., 1., 10, 9)
    }

    fn immigration() -> BirthDeath {
        BirthDeath {
            birth: 5.,
            death: 1.,
            capacity: 60,
        }
    }

    #[test]
    fn starts_as_point_mass_at_zero() {
        let cme = Cme::new(enzyme()).unwrap();
        assert_eq!(cme.lattice().len(), 11 * 10);
        assert_eq!(cme.probability()[0], 1.);
        assert_eq!(cme.probability().sum(), 1.);
        assert_eq!(cme.mean(SingleSubstrate::P), Ok(0.));
        assert_eq!(cme.sd(SingleSubstrate::C), Ok(0.));
        assert_eq!(cme.time(), 0.);
    }

    #[test]
    fn construction_errors() {
        assert!(matches!(
            Cme::with_bounds(enzyme(), vec![11]),
            Err(Error::Construction(_))
        ));
        assert!(matches!(
            Cme::with_bounds(enzyme(), vec![11, 0]),
            Err(Error::Construction(_))
        ));
    }

    #[test]
    fn index_and_pop_follow_the_lattice() {
        let cme = Cme::new(enzyme()).unwrap();
        assert_eq!(cme.index(&[0, 0]), 0);
        assert_eq!(cme.index(&[0, 1]), 1);
        assert_eq!(cme.index(&[1, 0]), 10);
        for i in 0..cme.lattice().len() {
            assert_eq!(cme.index(cme.pop(i).as_slice().unwrap()), i);
        }
    }

    #[test]
    fn probability_is_conserved_by_every_method() {
        for method in Method::ALL {
            let mut cme = Cme::new(enzyme()).unwrap();
            let mut integrator = ExplicitRungeKutta::new(method);
            for _ in 0..200 {
                cme.step(&mut integrator, 1e-4).unwrap();
            }
            assert!(
                (cme.probability().sum() - 1.).abs() < 1e-12,
                "{:?}",
                method
            );
            assert!((cme.time() - 0.02).abs() < 1e-12);
        }
    }

    #[test]
    fn derivative_conserves_probability_on_a_closed_lattice() {
        let mut cme = Cme::new(enzyme()).unwrap();
        let dp = cme.derivative(cme.probability().view()).unwrap();
        assert_eq!(dp[0], -900.);
        assert_eq!(dp[cme.index(&[1, 0])], 900.);
        assert_eq!(dp.sum(), 0.);

        let mut integrator = ExplicitRungeKutta::default();
        cme.simulate(&mut integrator, 1e-4, 0.1).unwrap();
        let dp = cme.derivative(cme.probability().view()).unwrap();
        let scale = dp.iter().map(|d| d.abs()).sum::<f64>();
        assert!(scale > 1.);
        assert!(dp.sum().abs() < 1e-10 * scale, "{}", dp.sum());
    }

    #[test]
    fn derivative_loses_outflow_past_the_lattice() {
        // No room for complex, so binding leaves the lattice.
        let cme = Cme::with_bounds(enzyme(), vec![1, 10]).unwrap();
        let dp = cme.derivative(cme.probability().view()).unwrap();
        assert_eq!(dp[0], -900.);
        assert_eq!(dp.sum(), -900.);
    }

    #[test]
    fn inconsistent_states_stay_empty() {
        let mut cme = Cme::new(enzyme()).unwrap();
        let mut integrator = ExplicitRungeKutta::new(Method::Rk4);
        cme.simulate(&mut integrator, 1e-4, 0.5).unwrap();
        for (i, &p) in cme.probability().iter().enumerate() {
            if !cme.network().is_consistent(cme.pop(i).view()) {
                assert_eq!(p, 0.);
            }
        }
    }

    #[test]
    fn matches_poisson_solution() {
        let network = immigration();
        let expected = network.poisson_mean(1.);
        let mut cme = Cme::new(network).unwrap();
        let mut integrator = ExplicitRungeKutta::new(Method::Rk4);
        for _ in 0..1000 {
            cme.step(&mut integrator, 1e-3).unwrap();
        }
        let (mean, sd) = (cme.mean(0).unwrap(), cme.sd(0).unwrap());
        assert!((mean - expected).abs() < 1e-6, "{} != {}", mean, expected);
        assert!((sd * sd - expected).abs() < 1e-6);

        // Poisson raw moments.
        let l = expected;
        let third = l.powi(3) + 3. * l * l + l;
        let fourth = l.powi(4) + 6. * l.powi(3) + 7. * l * l + l;
        assert!((cme.nth_moment(0, 3).unwrap() - third).abs() < 1e-5);
        assert!((cme.nth_moment(0, 4).unwrap() - fourth).abs() < 1e-4);
        assert!((cme.nth_moment(0, 0).unwrap() - 1.).abs() < 1e-12);
    }

    #[test]
    fn oversized_moment_orders_are_rejected() {
        let cme = Cme::new(SingleSubstrateSqssa::new(1., 1., 10, 9)).unwrap();
        assert!(matches!(
            cme.nth_moment(0, i32::MAX as u32 + 1),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            cme.nth_moment(0, u32::MAX),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn cached_moments_match_direct_sums() {
        let mut cme = Cme::new(enzyme()).unwrap();
        let mut integrator = ExplicitRungeKutta::default();
        cme.simulate(&mut integrator, 1e-4, 0.2).unwrap();
        for species in 0..2 {
            for n in 1..=MAX_CACHED_MOMENT {
                let direct: f64 = cme
                    .probability()
                    .iter()
                    .enumerate()
                    .map(|(i, &p)| (cme.pop(i)[species] as f64).powi(n as i32) * p)
                    .sum();
                let cached = cme.nth_moment(species, n).unwrap();
                assert!((cached - direct).abs() < 1e-10 * direct.abs().max(1.));
            }
            let sd = cme.sd(species).unwrap();
            let mean = cme.mean(species).unwrap();
            assert!((sd * sd - (cme.msq(species).unwrap() - mean * mean)).abs() < 1e-10);
        }
    }

    #[test]
    fn moments_follow_state_changes() {
        let mut cme = Cme::new(SingleSubstrateSqssa::new(1., 1., 10, 9)).unwrap();
        assert_eq!(cme.mean(0), Ok(0.));
        let mut probability = Array1::zeros(10);
        probability[4] = 0.5;
        probability[6] = 0.5;
        cme.set_state(CmeState {
            probability,
            time: 1.,
        })
        .unwrap();
        assert_eq!(cme.mean(0), Ok(5.));
        assert_eq!(cme.msq(0), Ok(26.));
        assert_eq!(cme.sd(0), Ok(1.));
        assert_eq!(cme.time(), 1.);
    }

    #[test]
    fn species_and_lengths_are_checked() {
        let mut cme = Cme::new(enzyme()).unwrap();
        assert_eq!(
            cme.mean(2),
            Err(Error::SpeciesOutOfRange {
                species: 2,
                num_species: 2
            })
        );
        assert!(matches!(
            cme.set_state(CmeState {
                probability: arr1(&[1.]),
                time: 0.
            }),
            Err(Error::DimensionMismatch { .. })
        ));
        let mut integrator = ExplicitRungeKutta::default();
        assert!(matches!(
            cme.step(&mut integrator, 0.),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn marginals_sum_to_one() {
        let mut cme = Cme::new(enzyme()).unwrap();
        let mut integrator = ExplicitRungeKutta::default();
        cme.simulate(&mut integrator, 1e-4, 0.3).unwrap();
        let marginal = cme.marginal(SingleSubstrate::P).unwrap();
        assert_eq!(marginal.len(), 10);
        assert!((marginal.sum() - 1.).abs() < 1e-12);
        let mean: f64 = marginal
            .iter()
            .enumerate()
            .map(|(y, &p)| y as f64 * p)
            .sum();
        assert!((mean - cme.mean(SingleSubstrate::P).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn recording_samples_every_stride() {
        let mut cme = Cme::new(immigration()).unwrap();
        let mut integrator = ExplicitRungeKutta::new(Method::Euler);
        let mut states = Vec::new();
        let steps = cme
            .simulate_recording(&mut integrator, 0.01, 0.095, 3, &mut states)
            .unwrap();
        // Steps are taken while t <= 0.095, ending at t = 0.1.
        assert_eq!(steps, 10);
        assert_eq!(states.len(), 1 + 3);
        assert_eq!(states[0].time, 0.);
        assert!((states[1].time - 0.03).abs() < 1e-12);
        assert!((cme.time() - 0.1).abs() < 1e-12);
    }
}
