use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// A reaction network as seen by the simulation engines: a fixed number of
/// species and reaction channels, one stoichiometric vector per channel, and
/// a propensity for every channel at any population.
///
/// A zero propensity is the normal way to say a channel is blocked by the
/// current state. `propensity` returns [`Error::Domain`] only when the state
/// itself contradicts the conserved quantities of the model.
pub trait ReactionNetwork {
    fn num_species(&self) -> usize;
    fn num_channels(&self) -> usize;

    /// Stoichiometric matrix of shape `(num_channels, num_species)`; row `r`
    /// is the population change applied when channel `r` fires.
    fn stoichiometry(&self) -> Array2<i64>;

    /// Whether `state` agrees with the conserved totals of the model.
    fn is_consistent(&self, state: ArrayView1<i64>) -> bool;

    fn propensity(&self, state: ArrayView1<i64>, channel: usize) -> Result<f64>;

    /// Exclusive per-species upper bounds of the populations reachable under
    /// the conserved totals. Used as the default master equation lattice.
    fn population_bounds(&self) -> Vec<i64>;

    fn species_names(&self) -> Vec<&'static str>;
    fn channel_names(&self) -> Vec<&'static str>;
}

/// Stoichiometric matrix of `network`, checked against the declared species
/// and channel counts.
pub(crate) fn checked_stoichiometry(network: &impl ReactionNetwork) -> Result<Array2<i64>> {
    let (num_channels, num_species) = (network.num_channels(), network.num_species());
    if num_species == 0 || num_channels == 0 {
        return Err(Error::Construction(format!(
            "a reaction network needs at least one species and one channel, got {} and {}",
            num_species, num_channels
        )));
    }
    let stoichiometry = network.stoichiometry();
    if stoichiometry.dim() != (num_channels, num_species) {
        return Err(Error::Construction(format!(
            "stoichiometric matrix has shape {:?}, expected ({}, {})",
            stoichiometry.shape(),
            num_channels,
            num_species
        )));
    }
    Ok(stoichiometry)
}

pub(crate) fn channel_out_of_range(channel: usize, num_channels: usize) -> Error {
    Error::ChannelOutOfRange {
        channel,
        num_channels,
    }
}

/// Propensity of the total quasi-steady-state reductions:
/// `k * 2 e s / (b + sqrt(b^2 - 4 e s))` with `b = e + s + km`.
///
/// This is `k` times the smaller root of `c^2 - b c + e s = 0`, written in a
/// form which does not cancel when `e s` is small.
pub(crate) fn tqssa_rate(k: f64, km: f64, total_enzyme: i64, substrate: i64) -> f64 {
    let c = (2 * total_enzyme * substrate) as f64;
    let b = (total_enzyme + substrate) as f64 + km;
    let delta = b * b - 2. * c;
    if c == 0. {
        return 0.;
    }
    k * c / (b + delta.max(0.).sqrt())
}

/// Species names and the named stoichiometric rows of a network, archived
/// next to the results of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub species: Vec<String>,
    pub channels: Vec<(String, Vec<i64>)>,
}

impl Description {
    pub fn of(network: &impl ReactionNetwork) -> Result<Self> {
        let stoichiometry = checked_stoichiometry(network)?;
        let species = network.species_names();
        if species.len() != network.num_species() {
            return Err(Error::DimensionMismatch {
                expected: network.num_species(),
                found: species.len(),
            });
        }
        let channel_names = network.channel_names();
        if channel_names.len() != network.num_channels() {
            return Err(Error::DimensionMismatch {
                expected: network.num_channels(),
                found: channel_names.len(),
            });
        }
        let channels = channel_names
            .into_iter()
            .zip(stoichiometry.rows())
            .map(|(name, row)| (name.to_string(), row.to_vec()))
            .collect();
        Ok(Description {
            species: species.into_iter().map(str::to_string).collect(),
            channels,
        })
    }
}

mod goldbeter_koshland;
pub use goldbeter_koshland::*;
mod goldbeter_koshland_qssa;
pub use goldbeter_koshland_qssa::*;
mod single_substrate;
pub use single_substrate::*;
mod single_substrate_qssa;
pub use single_substrate_qssa::*;

/// Every shipped reaction network, tagged by name when serialized so a run can
/// be described in a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Network {
    SingleSubstrate(SingleSubstrate),
    SingleSubstrateTqssa(SingleSubstrateTqssa),
    SingleSubstrateSqssa(SingleSubstrateSqssa),
    GoldbeterKoshland(GoldbeterKoshland),
    GoldbeterKoshlandTqssa(GoldbeterKoshlandTqssa),
    GoldbeterKoshlandSqssa(GoldbeterKoshlandSqssa),
}

impl Network {
    fn inner(&self) -> &dyn ReactionNetwork {
        match self {
            Network::SingleSubstrate(network) => network,
            Network::SingleSubstrateTqssa(network) => network,
            Network::SingleSubstrateSqssa(network) => network,
            Network::GoldbeterKoshland(network) => network,
            Network::GoldbeterKoshlandTqssa(network) => network,
            Network::GoldbeterKoshlandSqssa(network) => network,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::SingleSubstrate(_) => "SingleSubstrate",
            Network::SingleSubstrateTqssa(_) => "SingleSubstrateTqssa",
            Network::SingleSubstrateSqssa(_) => "SingleSubstrateSqssa",
            Network::GoldbeterKoshland(_) => "GoldbeterKoshland",
            Network::GoldbeterKoshlandTqssa(_) => "GoldbeterKoshlandTqssa",
            Network::GoldbeterKoshlandSqssa(_) => "GoldbeterKoshlandSqssa",
        }
    }

    /// The quasi-steady-state reductions of a full model, tQSSA first. Empty
    /// for networks which are already reduced.
    pub fn reductions(&self) -> Vec<Network> {
        match self {
            Network::SingleSubstrate(network) => vec![
                Network::SingleSubstrateTqssa(network.tqssa()),
                Network::SingleSubstrateSqssa(network.sqssa()),
            ],
            Network::GoldbeterKoshland(network) => vec![
                Network::GoldbeterKoshlandTqssa(network.tqssa()),
                Network::GoldbeterKoshlandSqssa(network.sqssa()),
            ],
            _ => vec![],
        }
    }

    /// Whether every trajectory from the zero population ends in a state no
    /// channel can leave. True for single-substrate kinetics, where all
    /// substrate ends up as product; the switch keeps cycling.
    pub fn has_absorbing_state(&self) -> bool {
        matches!(
            self,
            Network::SingleSubstrate(_)
                | Network::SingleSubstrateTqssa(_)
                | Network::SingleSubstrateSqssa(_)
        )
    }

    /// Index of the species whose count is compared between a full model and
    /// its reductions (product for single-substrate kinetics, phosphorylated
    /// substrate for the switch).
    pub fn observed_species(&self) -> usize {
        match self {
            Network::SingleSubstrate(_) => SingleSubstrate::P,
            Network::SingleSubstrateTqssa(_) => SingleSubstrateTqssa::P,
            Network::SingleSubstrateSqssa(_) => SingleSubstrateSqssa::P,
            Network::GoldbeterKoshland(_) => GoldbeterKoshland::SP,
            Network::GoldbeterKoshlandTqssa(_) => GoldbeterKoshlandTqssa::SP_HAT,
            Network::GoldbeterKoshlandSqssa(_) => GoldbeterKoshlandSqssa::SP,
        }
    }
}

impl ReactionNetwork for Network {
    fn num_species(&self) -> usize {
        self.inner().num_species()
    }

    fn num_channels(&self) -> usize {
        self.inner().num_channels()
    }

    fn stoichiometry(&self) -> Array2<i64> {
        self.inner().stoichiometry()
    }

    fn is_consistent(&self, state: ArrayView1<i64>) -> bool {
        self.inner().is_consistent(state)
    }

    fn propensity(&self, state: ArrayView1<i64>, channel: usize) -> Result<f64> {
        self.inner().propensity(state, channel)
    }

    fn population_bounds(&self) -> Vec<i64> {
        self.inner().population_bounds()
    }

    fn species_names(&self) -> Vec<&'static str> {
        self.inner().species_names()
    }

    fn channel_names(&self) -> Vec<&'static str> {
        self.inner().channel_names()
    }
}
