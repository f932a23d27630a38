use crate::error::Result;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Derivative of an autonomous system of ODEs, `y -> dy/dt`.
pub type Derivative<'a> = dyn FnMut(ArrayView1<f64>) -> Result<Array1<f64>> + 'a;

/// A single-step explicit integration rule.
///
/// `step` returns the state after advancing `y` by `dt`. Any error raised by
/// the derivative aborts the step and is handed back unchanged.
pub trait Integrator {
    fn step(
        &mut self,
        y: ArrayView1<f64>,
        dt: f64,
        derivative: &mut Derivative<'_>,
    ) -> Result<Array1<f64>>;
}

/// Coefficients of an explicit Runge-Kutta method. `a` is strictly lower
/// triangular and stored row by row, so `a[i]` has `i` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButcherTableau {
    pub a: Vec<Vec<f64>>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
}

impl ButcherTableau {
    pub fn stages(&self) -> usize {
        self.b.len()
    }
}

/// The explicit Runge-Kutta schemes shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Method {
    Euler,
    Midpoint,
    Heun2,
    Ralston2,
    Rk4,
    Rk4ThreeEighths,
    #[default]
    Ralston4,
    Butcher6,
    Verner8,
}

impl Method {
    pub const ALL: [Method; 9] = [
        Method::Euler,
        Method::Midpoint,
        Method::Heun2,
        Method::Ralston2,
        Method::Rk4,
        Method::Rk4ThreeEighths,
        Method::Ralston4,
        Method::Butcher6,
        Method::Verner8,
    ];

    pub fn order(&self) -> usize {
        match self {
            Method::Euler => 1,
            Method::Midpoint | Method::Heun2 | Method::Ralston2 => 2,
            Method::Rk4 | Method::Rk4ThreeEighths | Method::Ralston4 => 4,
            Method::Butcher6 => 6,
            Method::Verner8 => 8,
        }
    }

    pub fn tableau(&self) -> ButcherTableau {
        match self {
            Method::Euler => ButcherTableau {
                a: vec![vec![]],
                b: vec![1.],
                c: vec![0.],
            },
            Method::Midpoint => ButcherTableau {
                a: vec![vec![], vec![0.5]],
                b: vec![0., 1.],
                c: vec![0., 0.5],
            },
            Method::Heun2 => ButcherTableau {
                a: vec![vec![], vec![1.]],
                b: vec![0.5, 0.5],
                c: vec![0., 1.],
            },
            Method::Ralston2 => ButcherTableau {
                a: vec![vec![], vec![2. / 3.]],
                b: vec![0.25, 0.75],
                c: vec![0., 2. / 3.],
            },
            Method::Rk4 => ButcherTableau {
                a: vec![vec![], vec![0.5], vec![0., 0.5], vec![0., 0., 1.]],
                b: vec![1. / 6., 1. / 3., 1. / 3., 1. / 6.],
                c: vec![0., 0.5, 0.5, 1.],
            },
            Method::Rk4ThreeEighths => ButcherTableau {
                a: vec![
                    vec![],
                    vec![1. / 3.],
                    vec![-1. / 3., 1.],
                    vec![1., -1., 1.],
                ],
                b: vec![1. / 8., 3. / 8., 3. / 8., 1. / 8.],
                c: vec![0., 1. / 3., 2. / 3., 1.],
            },
            // Minimum truncation error fourth order method, c3 = 7/8 - 3 sqrt(5) / 16.
            Method::Ralston4 => ButcherTableau {
                a: vec![
                    vec![],
                    vec![0.4],
                    vec![0.29697760924775363, 0.15875964497103584],
                    vec![0.21810038822592046, -3.05096514869293101, 3.83286476046701052],
                ],
                b: vec![
                    0.17476028226269036,
                    -0.55148066287873299,
                    1.20553559939652355,
                    0.17118478121951902,
                ],
                c: vec![0., 0.4, 0.45573725421878941, 1.],
            },
            Method::Butcher6 => ButcherTableau {
                a: vec![
                    vec![],
                    vec![1. / 3.],
                    vec![0., 2. / 3.],
                    vec![1. / 12., 1. / 3., -1. / 12.],
                    vec![-1. / 16., 9. / 8., -3. / 16., -3. / 8.],
                    vec![0., 9. / 8., -3. / 8., -3. / 4., 1. / 2.],
                    vec![9. / 44., -9. / 11., 63. / 44., 18. / 11., 0., -16. / 11.],
                ],
                b: vec![
                    11. / 120.,
                    0.,
                    27. / 40.,
                    27. / 40.,
                    -4. / 15.,
                    -4. / 15.,
                    11. / 120.,
                ],
                c: vec![0., 1. / 3., 2. / 3., 1. / 3., 1. / 2., 1. / 2., 1.],
            },
            // Cooper and Verner's eleven stage eighth order method.
            Method::Verner8 => {
                let s = 21f64.sqrt();
                ButcherTableau {
                    a: vec![
                        vec![],
                        vec![1. / 2.],
                        vec![1. / 4., 1. / 4.],
                        vec![1. / 7., (-7. - 3. * s) / 98., (21. + 5. * s) / 49.],
                        vec![(11. + s) / 84., 0., (18. + 4. * s) / 63., (21. - s) / 252.],
                        vec![
                            (5. + s) / 48.,
                            0.,
                            (9. + s) / 36.,
                            (-231. + 14. * s) / 360.,
                            (63. - 7. * s) / 80.,
                        ],
                        vec![
                            (10. - s) / 42.,
                            0.,
                            (-432. + 92. * s) / 315.,
                            (633. - 145. * s) / 90.,
                            (-504. + 115. * s) / 70.,
                            (63. - 13. * s) / 35.,
                        ],
                        vec![
                            1. / 14.,
                            0.,
                            0.,
                            0.,
                            (14. - 3. * s) / 126.,
                            (13. - 3. * s) / 63.,
                            1. / 9.,
                        ],
                        vec![
                            1. / 32.,
                            0.,
                            0.,
                            0.,
                            (91. - 21. * s) / 576.,
                            11. / 72.,
                            (-385. - 75. * s) / 1152.,
                            (63. + 13. * s) / 128.,
                        ],
                        vec![
                            1. / 14.,
                            0.,
                            0.,
                            0.,
                            1. / 9.,
                            (-733. - 147. * s) / 2205.,
                            (515. + 111. * s) / 504.,
                            (-51. - 11. * s) / 56.,
                            (132. + 28. * s) / 245.,
                        ],
                        vec![
                            0.,
                            0.,
                            0.,
                            0.,
                            (-42. + 7. * s) / 18.,
                            (-18. + 28. * s) / 45.,
                            (-273. - 53. * s) / 72.,
                            (301. + 53. * s) / 72.,
                            (28. - 28. * s) / 45.,
                            (49. - 7. * s) / 18.,
                        ],
                    ],
                    b: vec![
                        1. / 20.,
                        0.,
                        0.,
                        0.,
                        0.,
                        0.,
                        0.,
                        49. / 180.,
                        16. / 45.,
                        49. / 180.,
                        1. / 20.,
                    ],
                    c: vec![
                        0.,
                        1. / 2.,
                        1. / 2.,
                        (7. + s) / 14.,
                        (7. + s) / 14.,
                        1. / 2.,
                        (7. - s) / 14.,
                        (7. - s) / 14.,
                        1. / 2.,
                        (7. + s) / 14.,
                        1.,
                    ],
                }
            }
        }
    }
}

/// Fixed-step explicit Runge-Kutta integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplicitRungeKutta {
    tableau: ButcherTableau,
}

impl ExplicitRungeKutta {
    pub fn new(method: Method) -> Self {
        ExplicitRungeKutta {
            tableau: method.tableau(),
        }
    }

    pub fn from_tableau(tableau: ButcherTableau) -> Self {
        ExplicitRungeKutta { tableau }
    }

    pub fn tableau(&self) -> &ButcherTableau {
        &self.tableau
    }
}

impl Default for ExplicitRungeKutta {
    fn default() -> Self {
        ExplicitRungeKutta::new(Method::default())
    }
}

impl From<Method> for ExplicitRungeKutta {
    fn from(method: Method) -> Self {
        ExplicitRungeKutta::new(method)
    }
}

impl Integrator for ExplicitRungeKutta {
    fn step(
        &mut self,
        y: ArrayView1<f64>,
        dt: f64,
        derivative: &mut Derivative<'_>,
    ) -> Result<Array1<f64>> {
        let mut slopes: Vec<Array1<f64>> = Vec::with_capacity(self.tableau.stages());
        for row in self.tableau.a.iter() {
            let mut stage = y.to_owned();
            for (slope, &a) in slopes.iter().zip(row.iter()) {
                if a != 0. {
                    stage.scaled_add(dt * a, slope);
                }
            }
            slopes.push(derivative(stage.view())?);
        }

        let mut next = y.to_owned();
        for (slope, &b) in slopes.iter().zip(self.tableau.b.iter()) {
            if b != 0. {
                next.scaled_add(dt * b, slope);
            }
        }
        Ok(next)
    }
}
