use super::*;
use ndarray::arr2;

/// Goldbeter-Koshland switch: a kinase `E` phosphorylates `S` through the
/// complex `C`, a phosphatase `D` dephosphorylates `SP` through the complex
/// `CP`.
///
/// ```text
/// E + S  <-> C  -> E + SP    (fe, be, e)
/// D + SP <-> CP -> D + S     (fd, bd, d)
/// ```
///
/// Free kinase, phosphatase and substrate follow from the conserved totals:
/// `E = ET - C`, `D = DT - CP`, `S = ST - SP - C - CP`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldbeterKoshland {
    pub kfe: f64,
    pub kbe: f64,
    pub ke: f64,
    pub kfd: f64,
    pub kbd: f64,
    pub kd: f64,
    pub et: i64,
    pub dt: i64,
    pub st: i64,
}

impl GoldbeterKoshland {
    pub const SP: usize = 0;
    pub const C: usize = 1;
    pub const CP: usize = 2;

    pub const FE: usize = 0;
    pub const BE: usize = 1;
    pub const E: usize = 2;
    pub const FD: usize = 3;
    pub const BD: usize = 4;
    pub const D: usize = 5;

    pub fn new(
        kfe: f64,
        kbe: f64,
        ke: f64,
        kfd: f64,
        kbd: f64,
        kd: f64,
        et: i64,
        dt: i64,
        st: i64,
    ) -> Self {
        GoldbeterKoshland {
            kfe,
            kbe,
            ke,
            kfd,
            kbd,
            kd,
            et,
            dt,
            st,
        }
    }

    /// Michaelis constant of the phosphorylation branch, `(kbe + ke) / kfe`.
    pub fn kinase_michaelis_constant(&self) -> f64 {
        (self.kbe + self.ke) / self.kfe
    }

    /// Michaelis constant of the dephosphorylation branch, `(kbd + kd) / kfd`.
    pub fn phosphatase_michaelis_constant(&self) -> f64 {
        (self.kbd + self.kd) / self.kfd
    }

    pub fn tqssa(&self) -> GoldbeterKoshlandTqssa {
        GoldbeterKoshlandTqssa::new(
            self.kinase_michaelis_constant(),
            self.ke,
            self.phosphatase_michaelis_constant(),
            self.kd,
            self.et,
            self.dt,
            self.st,
        )
    }

    pub fn sqssa(&self) -> GoldbeterKoshlandSqssa {
        GoldbeterKoshlandSqssa::new(
            self.kinase_michaelis_constant(),
            self.ke,
            self.phosphatase_michaelis_constant(),
            self.kd,
            self.et,
            self.dt,
            self.st,
        )
    }
}

impl ReactionNetwork for GoldbeterKoshland {
    fn num_species(&self) -> usize {
        3
    }

    fn num_channels(&self) -> usize {
        6
    }

    fn stoichiometry(&self) -> Array2<i64> {
        //    SP,  C, CP
        arr2(&[
            [0, 1, 0],  // fe
            [0, -1, 0], // be
            [1, -1, 0], // e
            [-1, 0, 1], // fd
            [1, 0, -1], // bd
            [0, 0, -1], // d
        ])
    }

    fn is_consistent(&self, state: ArrayView1<i64>) -> bool {
        let (sp, c, cp) = (state[Self::SP], state[Self::C], state[Self::CP]);
        0 <= sp && 0 <= c && 0 <= cp && c <= self.et && cp <= self.dt && sp + c + cp <= self.st
    }

    fn propensity(&self, state: ArrayView1<i64>, channel: usize) -> Result<f64> {
        if !self.is_consistent(state) {
            return Err(Error::domain(state));
        }
        let (sp, c, cp) = (state[Self::SP], state[Self::C], state[Self::CP]);
        match channel {
            Self::FE => Ok(self.kfe * ((self.et - c) * (self.st - sp - c - cp)) as f64),
            Self::BE => Ok(self.kbe * c as f64),
            Self::E => Ok(self.ke * c as f64),
            Self::FD => Ok(self.kfd * ((self.dt - cp) * sp) as f64),
            Self::BD => Ok(self.kbd * cp as f64),
            Self::D => Ok(self.kd * cp as f64),
            _ => Err(channel_out_of_range(channel, self.num_channels())),
        }
    }

    fn population_bounds(&self) -> Vec<i64> {
        vec![self.st + 1, self.et + 1, self.dt + 1]
    }

    fn species_names(&self) -> Vec<&'static str> {
        vec!["SP", "C", "CP"]
    }

    fn channel_names(&self) -> Vec<&'static str> {
        vec!["fe", "be", "e", "fd", "bd", "d"]
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use ndarray::arr1;

    fn switch() -> GoldbeterKoshland {
        GoldbeterKoshland::new(2., 1., 1., 3., 1., 2., 4, 3, 10)
    }

    #[test]
    fn mass_action_propensities() {
        let network = switch();
        let state = arr1(&[2, 1, 1]);
        let expected = [2. * 3. * 6., 1., 1., 3. * 2. * 2., 1., 2.];
        for (channel, &rate) in expected.iter().enumerate() {
            assert_eq!(network.propensity(state.view(), channel), Ok(rate));
        }
    }

    #[test]
    fn conserved_totals_are_enforced() {
        let network = switch();
        assert!(network.is_consistent(arr1(&[6, 2, 2]).view()));
        assert!(!network.is_consistent(arr1(&[0, 5, 0]).view()));
        assert!(!network.is_consistent(arr1(&[0, 0, 4]).view()));
        assert!(!network.is_consistent(arr1(&[8, 2, 1]).view()));
        assert!(matches!(
            network.propensity(arr1(&[8, 2, 1]).view(), GoldbeterKoshland::E),
            Err(Error::Domain { .. })
        ));
    }

    #[test]
    fn stoichiometry_conserves_substrate() {
        let nu = switch().stoichiometry();
        assert_eq!(nu.shape(), &[6, 3]);
        // Channels e and d convert between free and phosphorylated forms
        // without changing SP + C + CP by more than one unit.
        for row in nu.rows() {
            assert!(row.sum().abs() <= 1);
        }
    }

    #[test]
    fn reductions_share_constants() {
        let network = switch();
        let tqssa = network.tqssa();
        assert_eq!(tqssa.kme, 1.);
        assert_eq!(tqssa.kmd, 1.);
        assert_eq!((tqssa.et, tqssa.dt, tqssa.st), (4, 3, 10));
        let sqssa = network.sqssa();
        assert_eq!((sqssa.ke, sqssa.kd), (1., 2.));
    }
}
