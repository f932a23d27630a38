use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Sample statistics of an ensemble of realizations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    /// Sample standard deviation (`n - 1` in the denominator).
    pub sd: f64,
    /// Standard error of the mean, `sd / sqrt(n)`.
    pub standard_error: f64,
    pub count: usize,
}

impl Summary {
    pub fn new(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidArgument(
                "cannot summarize an empty sample".to_string(),
            ));
        }
        let count = values.len();
        let mean = raw_moment(values, 1);
        let sd = if count > 1 {
            let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
            (squares / (count - 1) as f64).sqrt()
        } else {
            0.
        };
        Ok(Summary {
            mean,
            sd,
            standard_error: sd / (count as f64).sqrt(),
            count,
        })
    }
}

/// `E[v^n]` over the sample; `NaN` for an empty sample.
pub fn raw_moment(values: &[f64], n: i32) -> f64 {
    values.iter().map(|v| v.powi(n)).sum::<f64>() / values.len() as f64
}

/// `|value - reference| / |reference|`.
pub fn relative_difference(reference: f64, value: f64) -> f64 {
    (value - reference).abs() / reference.abs()
}

/// Mean of one species at the end of a run as estimated by both engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub network: String,
    pub species: String,
    pub ssa: Summary,
    pub cme_mean: f64,
    pub cme_sd: f64,
    pub cme_time: f64,
}

impl Comparison {
    pub fn relative_difference(&self) -> f64 {
        relative_difference(self.cme_mean, self.ssa.mean)
    }

    /// Distance between the two means in units of the ensemble standard
    /// error.
    pub fn z_score(&self) -> f64 {
        (self.ssa.mean - self.cme_mean) / self.ssa.standard_error
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn summary_of_small_sample() {
        let summary = Summary::new(&[1., 2., 3., 4.]).unwrap();
        assert_eq!(summary.mean, 2.5);
        assert!((summary.sd - (5f64 / 3.).sqrt()).abs() < 1e-15);
        assert!((summary.standard_error - summary.sd / 2.).abs() < 1e-15);
        assert_eq!(summary.count, 4);
    }

    #[test]
    fn single_value_has_no_spread() {
        let summary = Summary::new(&[7.]).unwrap();
        assert_eq!(summary.mean, 7.);
        assert_eq!(summary.sd, 0.);
        assert!(matches!(Summary::new(&[]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn raw_moments() {
        let values = [1., 2., 3.];
        assert_eq!(raw_moment(&values, 0), 1.);
        assert_eq!(raw_moment(&values, 2), 14. / 3.);
        assert!(raw_moment(&[], 1).is_nan());
    }

    #[test]
    fn comparison_scores() {
        let comparison = Comparison {
            network: "SingleSubstrate".to_string(),
            species: "P".to_string(),
            ssa: Summary {
                mean: 10.1,
                sd: 1.,
                standard_error: 0.05,
                count: 400,
            },
            cme_mean: 10.,
            cme_sd: 1.,
            cme_time: 2.,
        };
        assert!((comparison.relative_difference() - 0.01).abs() < 1e-12);
        assert!((comparison.z_score() - 2.).abs() < 1e-9);
    }
}
