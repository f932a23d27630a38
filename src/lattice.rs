use crate::error::{Error, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Dense enumeration of all population vectors `y` with `0 <= y[i] < bounds[i]`.
///
/// Populations are laid out in mixed radix, most significant species first:
/// `index = sum_i y[i] * prod_{j > i} bounds[j]`. The last species therefore
/// varies fastest as the index increases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lattice {
    bounds: Vec<i64>,
    strides: Vec<usize>,
    len: usize,
}

impl Lattice {
    pub fn new(bounds: Vec<i64>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(Error::Construction(
                "a lattice needs at least one species".to_string(),
            ));
        }
        if let Some(bound) = bounds.iter().find(|&&bound| bound <= 0) {
            return Err(Error::Construction(format!(
                "the maximum population numbers must be greater than 0, got {}",
                bound
            )));
        }

        let mut strides = vec![0; bounds.len()];
        let mut len: usize = 1;
        for i in (0..bounds.len()).rev() {
            strides[i] = len;
            len = len.checked_mul(bounds[i] as usize).ok_or_else(|| {
                Error::Construction(format!("lattice with bounds {:?} is too large", bounds))
            })?;
        }

        Ok(Lattice {
            bounds,
            strides,
            len,
        })
    }

    /// Number of lattice points, i.e. the product of the bounds.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_species(&self) -> usize {
        self.bounds.len()
    }

    pub fn bounds(&self) -> &[i64] {
        &self.bounds
    }

    /// Flat index of an in-bounds population. The population is assumed to
    /// be valid; use [`Lattice::in_bounds`] first when it may not be.
    pub fn index(&self, population: &[i64]) -> usize {
        population
            .iter()
            .zip(self.strides.iter())
            .map(|(&y, &stride)| y as usize * stride)
            .sum()
    }

    /// Population at a flat index. Exact inverse of [`Lattice::index`].
    pub fn pop(&self, index: usize) -> Array1<i64> {
        Array1::from_iter((0..self.num_species()).map(|s| self.coordinate(index, s)))
    }

    /// Population of a single species at a flat index.
    pub fn coordinate(&self, index: usize, species: usize) -> i64 {
        ((index / self.strides[species]) % self.bounds[species] as usize) as i64
    }

    pub fn in_bounds(&self, population: &[i64]) -> bool {
        population.len() == self.bounds.len()
            && population
                .iter()
                .zip(self.bounds.iter())
                .all(|(&y, &bound)| 0 <= y && y < bound)
    }

    /// Moves `population` to the next lattice point in index order. Returns
    /// false once it wraps around to the origin.
    pub fn advance(&self, population: &mut [i64]) -> bool {
        for i in (0..self.bounds.len()).rev() {
            population[i] += 1;
            if population[i] < self.bounds[i] {
                return true;
            }
            population[i] = 0;
        }
        false
    }

    /// Iterates over every lattice point in index order.
    pub fn iter(&self) -> impl Iterator<Item = Array1<i64>> + '_ {
        (0..self.len).map(move |i| self.pop(i))
    }
}
