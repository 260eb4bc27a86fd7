//! Prognostic field storage.
//!
//! One [`Field`] couples a 3-D array in the ghosted `ijk` layout with its
//! horizontal-mean profile. [`Fields`] owns the staggered velocities and
//! their tendencies, the prognostic scalars with their tendencies, and the
//! diagnostic pressure. The mean profiles are the publisher half of the
//! subsidence coupling: `Force` switches them on at construction and the
//! time loop refreshes them with [`Fields::update_means`] before every
//! forcing step.

use {
    crate::{
        error::{Error, Result},
        grid::Grid,
        utils::view3d,
    },
    log::error,
    ndarray::s,
    std::collections::BTreeMap,
};

#[derive(Debug)]
pub struct Field {
    pub data: Vec<f64>,
    pub mean: Vec<f64>,
}

impl Field {
    pub fn new(grid: &Grid) -> Self {
        Field {
            data: vec![0.0; grid.ncells],
            mean: vec![0.0; grid.kcells],
        }
    }
}

#[derive(Debug)]
pub struct Fields {
    pub u: Field,
    pub v: Field,
    pub w: Field,
    pub ut: Field,
    pub vt: Field,
    pub wt: Field,

    /// Prognostic scalars and their tendencies, iterated in name order.
    pub sp: BTreeMap<String, Field>,
    pub st: BTreeMap<String, Field>,

    /// Diagnostic pressure.
    pub p: Field,

    calc_mean_profs: bool,
}

impl Fields {
    pub fn new(grid: &Grid, scalars: &[String]) -> Result<Self> {
        let mut nerror = 0;

        let mut sp = BTreeMap::new();
        let mut st = BTreeMap::new();
        for name in scalars {
            if ["u", "v", "w", "p"].contains(&name.as_str()) {
                error!("\"{}\" is a reserved field name", name);
                nerror += 1;
                continue;
            }
            if sp.insert(name.clone(), Field::new(grid)).is_some() {
                error!("scalar \"{}\" is listed more than once", name);
                nerror += 1;
            }
            st.insert(name.clone(), Field::new(grid));
        }

        if nerror > 0 {
            return Err(Error::Config {
                section: "fields",
                nerror,
            });
        }

        Ok(Fields {
            u: Field::new(grid),
            v: Field::new(grid),
            w: Field::new(grid),
            ut: Field::new(grid),
            vt: Field::new(grid),
            wt: Field::new(grid),
            sp,
            st,
            p: Field::new(grid),
            calc_mean_profs: false,
        })
    }

    pub fn enable_mean_profiles(&mut self) {
        self.calc_mean_profs = true;
    }

    pub fn mean_profiles_enabled(&self) -> bool {
        self.calc_mean_profs
    }

    /// Refresh the horizontal-mean profiles of the velocities and scalars
    /// at every level, ghost levels included. No-op until a consumer has
    /// called [`enable_mean_profiles`](Self::enable_mean_profiles).
    pub fn update_means(&mut self, grid: &Grid) {
        if !self.calc_mean_profs {
            return;
        }

        let Fields { u, v, w, sp, .. } = self;
        for field in [u, v, w].into_iter().chain(sp.values_mut()) {
            calc_mean(field, grid);
        }
    }

    pub fn clear_tendencies(&mut self) {
        for field in [&mut self.ut, &mut self.vt, &mut self.wt] {
            field.data.fill(0.0);
        }
        for field in self.st.values_mut() {
            field.data.fill(0.0);
        }
    }
}

fn calc_mean(field: &mut Field, grid: &Grid) {
    let Field { data, mean } = field;
    let data = view3d(data, grid.icells, grid.jcells, grid.kcells);
    let ni = 1.0 / (grid.itot * grid.jtot) as f64;

    for (k, m) in mean.iter_mut().enumerate() {
        let sum = data
            .slice(s![grid.istart..grid.iend, grid.jstart..grid.jend, k])
            .sum();
        *m = grid.get_sum(sum) * ni;
    }
}

#[cfg(test)]
mod test {
    use {super::*, crate::parameters::GridParameters, approx::assert_abs_diff_eq};

    fn grid() -> Grid {
        Grid::new(&GridParameters {
            itot: 4,
            jtot: 3,
            ktot: 4,
            xsize: 4.0,
            ysize: 3.0,
            zsize: 4.0,
            ..GridParameters::default()
        })
        .unwrap()
    }

    #[test]
    fn means_average_the_horizontal_interior() {
        let grid = grid();
        let mut fields = Fields::new(&grid, &["s".to_string()]).unwrap();
        fields.enable_mean_profiles();

        let s = fields.sp.get_mut("s").unwrap();
        for k in 0..grid.kcells {
            for j in grid.jstart..grid.jend {
                for i in grid.istart..grid.iend {
                    // Level-dependent mean, plus a zero-mean checkerboard.
                    let wiggle = if (i + j) % 2 == 0 { 0.5 } else { -0.5 };
                    s.data[grid.ijk(i, j, k)] = k as f64 + wiggle;
                }
            }
        }

        fields.update_means(&grid);

        let mean = &fields.sp["s"].mean;
        for k in 0..grid.kcells {
            assert_abs_diff_eq!(mean[k], k as f64, epsilon = 1.0e-13);
        }
    }

    #[test]
    fn means_stay_zero_until_enabled() {
        let grid = grid();
        let mut fields = Fields::new(&grid, &["s".to_string()]).unwrap();
        fields.sp.get_mut("s").unwrap().data.fill(3.0);

        fields.update_means(&grid);

        assert!(fields.sp["s"].mean.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn reserved_and_duplicate_names_are_counted() {
        let grid = grid();
        let err = Fields::new(
            &grid,
            &["w".to_string(), "q".to_string(), "q".to_string()],
        )
        .unwrap_err();

        match err {
            Error::Config { section, nerror } => {
                assert_eq!(section, "fields");
                assert_eq!(nerror, 2);
            }
            _ => panic!("expected a configuration error"),
        }
    }
}
