use crate::cme::Cme;
use crate::error::{Error, Result};
use crate::gillespie::{Gillespie, GillespieState, NO_DEADLINE};
use crate::integrator::Integrator;
use crate::network::ReactionNetwork;
use ndarray::Array1;
use tracing::debug;

fn check_species(network: &impl ReactionNetwork, species: usize) -> Result<()> {
    if species >= network.num_species() {
        return Err(Error::SpeciesOutOfRange {
            species,
            num_species: network.num_species(),
        });
    }
    Ok(())
}

/// Restarts `engine` from the zero population at time zero, runs it up to
/// `t_final` and returns the count of `species` at that time.
///
/// The engine keeps its random stream, so consecutive calls give
/// independent realizations.
pub fn final_population<M: ReactionNetwork>(
    engine: &mut Gillespie<M>,
    t_final: f64,
    species: usize,
) -> Result<i64> {
    check_species(engine.network(), species)?;
    let num_species = engine.network().num_species();
    engine.set_state(GillespieState {
        population: Array1::zeros(num_species),
        time: 0.,
    })?;
    engine.simulate(usize::MAX, t_final)?;
    Ok(engine.population()[species])
}

/// Counts of `species` at `t_final` over `realizations` independent
/// trajectories of `network`, all drawn from a single seeded stream.
pub fn final_populations<M: ReactionNetwork>(
    network: M,
    realizations: usize,
    t_final: f64,
    seed: u64,
    species: usize,
) -> Result<Vec<i64>> {
    let mut engine = Gillespie::with_seed(network, seed)?;
    let populations = (0..realizations)
        .map(|_| final_population(&mut engine, t_final, species))
        .collect::<Result<Vec<_>>>()?;
    debug!(realizations, t_final, seed, "ensemble finished");
    Ok(populations)
}

/// Restarts `engine` from the zero population at time zero and runs it until
/// no channel can fire. Returns the time at which that happened.
///
/// Only networks with an absorbing state reachable from zero ever return,
/// such as single-substrate kinetics once all substrate is product.
pub fn completion_time<M: ReactionNetwork>(engine: &mut Gillespie<M>) -> Result<f64> {
    let num_species = engine.network().num_species();
    engine.set_state(GillespieState {
        population: Array1::zeros(num_species),
        time: 0.,
    })?;
    engine.simulate(usize::MAX, NO_DEADLINE)?;
    Ok(engine.time())
}

/// Completion times of `realizations` independent trajectories of `network`,
/// all drawn from a single seeded stream.
pub fn completion_times<M: ReactionNetwork>(
    network: M,
    realizations: usize,
    seed: u64,
) -> Result<Vec<f64>> {
    let mut engine = Gillespie::with_seed(network, seed)?;
    let times = (0..realizations)
        .map(|_| completion_time(&mut engine))
        .collect::<Result<Vec<_>>>()?;
    debug!(realizations, seed, "completion times recorded");
    Ok(times)
}

/// `(time, mean)` of `species` before the first step and after every
/// `sampling_stride` steps of the master equation.
pub fn mean_trajectory<M: ReactionNetwork, I: Integrator + ?Sized>(
    cme: &mut Cme<M>,
    integrator: &mut I,
    dt: f64,
    t_final: f64,
    sampling_stride: usize,
    species: usize,
) -> Result<Vec<(f64, f64)>> {
    check_species(cme.network(), species)?;
    if sampling_stride == 0 {
        return Err(Error::InvalidArgument(
            "sampling stride must be at least 1".to_string(),
        ));
    }
    let mut trajectory = vec![(cme.time(), cme.mean(species)?)];
    let mut steps = 0;
    while cme.time() <= t_final {
        cme.step(integrator, dt)?;
        steps += 1;
        if steps % sampling_stride == 0 {
            trajectory.push((cme.time(), cme.mean(species)?));
        }
    }
    debug!(steps, time = cme.time(), "mean trajectory recorded");
    Ok(trajectory)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::integrator::{ExplicitRungeKutta, Method};
    use crate::network::tests::BirthDeath;
    use crate::network::{SingleSubstrate, SingleSubstrateSqssa};

    #[test]
    fn realizations_are_independent_and_reproducible() {
        let network = SingleSubstrateSqssa::new(1., 1., 10, 9);
        let first = final_populations(network.clone(), 50, 0.5, 11, 0).unwrap();
        let second = final_populations(network, 50, 0.5, 11, 0).unwrap();
        assert_eq!(first, second);
        assert!(first.iter().all(|&p| (0..=9).contains(&p)));
        // 50 identical counts from a noisy process would mean the engine was
        // never reset or never reseeded.
        assert!(first.iter().any(|&p| p != first[0]));
    }

    #[test]
    fn long_runs_reach_the_absorbing_state() {
        let network = SingleSubstrate::new(10., 9., 1., 10, 9);
        let populations = final_populations(network, 20, 1e3, 3, SingleSubstrate::P).unwrap();
        assert!(populations.iter().all(|&p| p == 9));
    }

    #[test]
    fn unknown_species_is_rejected() {
        let network = SingleSubstrateSqssa::new(1., 1., 10, 9);
        assert_eq!(
            final_populations(network, 5, 1., 0, 1),
            Err(Error::SpeciesOutOfRange {
                species: 1,
                num_species: 1
            })
        );
    }

    #[test]
    fn completion_leaves_only_product() {
        let mut engine = Gillespie::with_seed(SingleSubstrate::new(10., 9., 1., 10, 9), 12).unwrap();
        let first = completion_time(&mut engine).unwrap();
        assert!(first > 0.);
        assert_eq!(engine.population(), &ndarray::arr1(&[0, 9]));
        assert_eq!(engine.total_propensity(), Ok(0.));

        // The engine restarts from zero rather than from the absorbed state.
        let second = completion_time(&mut engine).unwrap();
        assert!(second > 0.);
        assert_ne!(first, second);
    }

    #[test]
    fn mean_completion_time_of_a_pure_conversion() {
        // One channel converting substrate at rate kcat ET s / (s + km), so the
        // expected completion time is the sum of the mean waits at every s.
        let network = SingleSubstrateSqssa::new(1., 1., 10, 9);
        let expected: f64 = (1..=9)
            .map(|s| (s as f64 + 1.) / (10. * s as f64))
            .sum();
        let times = completion_times(network.clone(), 2_000, 13).unwrap();
        assert_eq!(times, completion_times(network, 2_000, 13).unwrap());
        let mean = times.iter().sum::<f64>() / times.len() as f64;
        assert!((mean - expected).abs() / expected < 0.05, "{} vs {}", mean, expected);
    }

    #[test]
    fn mean_trajectory_follows_the_master_equation() {
        let network = BirthDeath {
            birth: 5.,
            death: 1.,
            capacity: 60,
        };
        let expected = network.poisson_mean(0.5);
        let mut cme = Cme::new(network).unwrap();
        let mut integrator = ExplicitRungeKutta::new(Method::Rk4);
        let trajectory = mean_trajectory(&mut cme, &mut integrator, 1e-3, 0.4995, 100, 0).unwrap();
        assert_eq!(trajectory.len(), 6);
        assert_eq!(trajectory[0], (0., 0.));
        let (t, mean) = trajectory[5];
        assert!((t - 0.5).abs() < 1e-9);
        assert!((mean - expected).abs() < 1e-6);
        assert!(trajectory.windows(2).all(|w| w[1].1 > w[0].1));
    }
}
