use crate::integrator::Method;
use crate::network::{Network, SingleSubstrate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything the driver needs to compare the stochastic and master equation
/// engines on one network. Missing fields take their [`Default`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub network: Network,
    pub realizations: usize,
    pub t_final: f64,
    pub dt: f64,
    pub method: Method,
    /// Master equation steps between recorded means.
    pub sampling_stride: usize,
    /// Drawn from the operating system when absent.
    pub seed: Option<u64>,
    pub output: PathBuf,
    /// Also record how long every realization takes to reach its absorbing
    /// state. Skipped for networks which have none.
    pub completion_times: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            network: Network::SingleSubstrate(SingleSubstrate::new(10., 9., 1., 10, 9)),
            realizations: 10_000,
            t_final: 2.,
            dt: 1e-4,
            method: Method::default(),
            sampling_stride: 100,
            seed: None,
            output: PathBuf::from("data/kinetics.tar.gz"),
            completion_times: false,
        }
    }
}

impl RunConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error + 'static>> {
        let file = fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}
