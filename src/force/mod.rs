//! Large-scale momentum and scalar forcing.
//!
//! Four composable modes, each behind its own tagged switch: a mean
//! pressure-gradient force (either a bulk-flux controller or geostrophic
//! wind), prescribed large-scale source profiles for listed scalars,
//! subsidence advection with a prescribed vertical velocity profile, and
//! linear-in-time interpolation of the large-scale profiles between input
//! columns. Illegal switch combinations are reported during construction,
//! one message per problem, and surfaced as a single counted error.

#[cfg(test)]
mod test;

use {
    crate::{
        constants::{CI0, CI1, CI2, CI3},
        error::{Error, Result},
        fields::Fields,
        grid::{Grid, SpatialOrder},
        parameters::{ForceParameters, Parameters},
    },
    log::{error, warn},
    std::collections::BTreeMap,
};

/// Large-scale pressure-gradient forcing mode.
#[derive(Debug, Clone, PartialEq)]
pub enum LsPres {
    Off,
    /// Uniform body force steering the bulk streamwise velocity to `uflux`.
    BulkFlux { uflux: f64 },
    /// Coriolis force against the geostrophic wind profiles `ug`, `vg`.
    Geostrophic { fc: f64 },
}

/// Prescribed large-scale source profiles for the listed scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum Ls {
    Off,
    On { lslist: Vec<String> },
}

/// Large-scale subsidence advection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wls {
    Off,
    On,
}

/// Time dependence of the large-scale profiles.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeDep {
    Off,
    On { timedeplist: Vec<String> },
}

#[derive(Debug)]
pub struct Force {
    swlspres: LsPres,
    swls: Ls,
    swwls: Wls,
    swtimedep: TimeDep,

    kmax: usize,
    kgc: usize,

    ug: Vec<f64>,
    vg: Vec<f64>,
    wls: Vec<f64>,
    lsprofs: BTreeMap<String, Vec<f64>>,

    /// Single time axis shared by every time-dependent profile, with the
    /// flattened `[T × kmax]` tables keyed by profile name.
    timedeptime: Vec<f64>,
    timedepdata: BTreeMap<String, Vec<f64>>,
}

impl Force {
    /// Validate the switches and allocate the profile buffers. Subsidence
    /// requires up-to-date scalar mean profiles, so it flips the publisher
    /// switch on `fields` here.
    pub fn new(params: &ForceParameters, grid: &Grid, fields: &mut Fields) -> Result<Self> {
        let mut nerror = 0;

        let swlspres = match params.swlspres.as_str() {
            "0" => LsPres::Off,
            "uflux" => match params.uflux {
                Some(uflux) => LsPres::BulkFlux { uflux },
                None => {
                    error!("swlspres = \"uflux\" requires uflux");
                    nerror += 1;
                    LsPres::Off
                }
            },
            "geo" => match params.fc {
                Some(fc) => LsPres::Geostrophic { fc },
                None => {
                    error!("swlspres = \"geo\" requires fc");
                    nerror += 1;
                    LsPres::Off
                }
            },
            s => {
                error!("\"{}\" is an illegal option for swlspres", s);
                nerror += 1;
                LsPres::Off
            }
        };

        let swls = match params.swls.as_str() {
            "0" => Ls::Off,
            "1" => Ls::On {
                lslist: params.lslist.clone(),
            },
            s => {
                error!("\"{}\" is an illegal option for swls", s);
                nerror += 1;
                Ls::Off
            }
        };

        let swwls = match params.swwls.as_str() {
            "0" => Wls::Off,
            "1" => {
                fields.enable_mean_profiles();
                Wls::On
            }
            s => {
                error!("\"{}\" is an illegal option for swwls", s);
                nerror += 1;
                Wls::Off
            }
        };

        let swtimedep = match params.swtimedep.as_str() {
            "0" => TimeDep::Off,
            "1" => TimeDep::On {
                timedeplist: params.timedeplist.clone(),
            },
            s => {
                error!("\"{}\" is an illegal option for swtimedep", s);
                nerror += 1;
                TimeDep::Off
            }
        };

        if nerror > 0 {
            return Err(Error::Config {
                section: "force",
                nerror,
            });
        }

        let kcells = grid.kcells;
        let (ug, vg) = match swlspres {
            LsPres::Geostrophic { .. } => (vec![0.0; kcells], vec![0.0; kcells]),
            _ => (Vec::new(), Vec::new()),
        };
        let wls = match swwls {
            Wls::On => vec![0.0; kcells],
            Wls::Off => Vec::new(),
        };
        let mut lsprofs = BTreeMap::new();
        if let Ls::On { lslist } = &swls {
            for name in lslist {
                lsprofs.insert(name.clone(), vec![0.0; kcells]);
            }
        }

        Ok(Force {
            swlspres,
            swls,
            swwls,
            swtimedep,
            kmax: grid.ktot,
            kgc: grid.kgc,
            ug,
            vg,
            wls,
            lsprofs,
            timedeptime: Vec::new(),
            timedepdata: BTreeMap::new(),
        })
    }

    /// Populate the profile buffers from the input columns and load the
    /// time-dependent tables. Problems are counted, not short-circuited, so
    /// one run reports every missing or malformed input.
    pub fn create(&mut self, params: &Parameters, grid: &Grid, fields: &Fields) -> Result<()> {
        let mut nerror = 0;

        if let LsPres::Geostrophic { .. } = self.swlspres {
            nerror += read_prof(&mut self.ug, "ug", params, grid);
            nerror += read_prof(&mut self.vg, "vg", params, grid);
        }

        if let Ls::On { lslist } = &self.swls {
            for name in lslist {
                if !fields.sp.contains_key(name) {
                    error!("scalar \"{}\" in lslist is not a prognostic field", name);
                    nerror += 1;
                }
            }
            for name in lslist {
                let prof = self.lsprofs.get_mut(name).unwrap();
                nerror += read_prof(prof, &format!("{}ls", name), params, grid);
            }
        }

        if self.swwls == Wls::On {
            nerror += read_prof(&mut self.wls, "wls", params, grid);
        }

        if let TimeDep::On { timedeplist } = &self.swtimedep {
            let mut tmplist = timedeplist.clone();

            self.timedeptime = params.timedep.time.clone();
            let nt = self.timedeptime.len();
            if !self.timedeptime.windows(2).all(|w| w[1] > w[0]) {
                error!("the timedep time column must increase monotonically");
                nerror += 1;
            }

            if let Ls::On { lslist } = &self.swls {
                for name in lslist {
                    if !timedeplist.contains(name) {
                        continue;
                    }
                    let key = format!("{}ls", name);
                    match params.timedep.profiles.get(&key) {
                        Some(_) if nt == 0 => {
                            error!("time-dependent profiles require a time column");
                            nerror += 1;
                        }
                        Some(table) if table.len() == nt * grid.ktot => {
                            self.timedepdata.insert(key, table.clone());
                        }
                        Some(table) => {
                            error!(
                                "time table \"{}\" holds {} values, expected {}",
                                key,
                                table.len(),
                                nt * grid.ktot
                            );
                            nerror += 1;
                        }
                        None => {
                            error!("no time-dependent table found for \"{}\"", key);
                            nerror += 1;
                        }
                    }
                    tmplist.retain(|n| n != name);
                }
            }

            for name in &tmplist {
                warn!("{} is not supported as a time dependent parameter", name);
            }
        }

        if nerror > 0 {
            return Err(Error::Config {
                section: "force",
                nerror,
            });
        }
        Ok(())
    }

    /// Blend the time-dependent profiles to the simulation time `t`,
    /// clamping to the first and last table rows outside the time column.
    pub fn update_time_dep(&mut self, t: f64) {
        if self.swtimedep == TimeDep::Off || self.timedepdata.is_empty() {
            return;
        }

        // First entry beyond t.
        let mut index1 = 0;
        for &time in &self.timedeptime {
            if t < time {
                break;
            }
            index1 += 1;
        }

        let (fac0, fac1, index0, index1) = if index1 == 0 {
            (0.0, 1.0, 0, 0)
        } else if index1 == self.timedeptime.len() {
            (1.0, 0.0, index1 - 1, index1 - 1)
        } else {
            let index0 = index1 - 1;
            let timestep = self.timedeptime[index1] - self.timedeptime[index0];
            (
                (self.timedeptime[index1] - t) / timestep,
                (t - self.timedeptime[index0]) / timestep,
                index0,
                index1,
            )
        };

        self.update_time_dep_profs(fac0, fac1, index0, index1);
    }

    fn update_time_dep_profs(&mut self, fac0: f64, fac1: f64, index0: usize, index1: usize) {
        let kk = self.kmax;
        let kgc = self.kgc;

        if let Ls::On { lslist } = &self.swls {
            for name in lslist {
                let key = format!("{}ls", name);
                if let Some(data) = self.timedepdata.get(&key) {
                    let prof = self.lsprofs.get_mut(name).unwrap();
                    for k in 0..kk {
                        prof[k + kgc] = fac0 * data[index0 * kk + k] + fac1 * data[index1 * kk + k];
                    }
                }
            }
        }
    }

    /// Add the enabled forcing terms to the tendencies.
    pub fn exec(&self, fields: &mut Fields, grid: &Grid, dt: f64) {
        match self.swlspres {
            LsPres::BulkFlux { uflux } => {
                calc_flux(&mut fields.ut.data, &fields.u.data, grid, uflux, dt)
            }
            LsPres::Geostrophic { fc } => match grid.spatial_order {
                SpatialOrder::Second => coriolis_2nd(
                    &mut fields.ut.data,
                    &mut fields.vt.data,
                    &fields.u.data,
                    &fields.v.data,
                    &self.ug,
                    &self.vg,
                    grid,
                    fc,
                ),
                SpatialOrder::Fourth => coriolis_4th(
                    &mut fields.ut.data,
                    &mut fields.vt.data,
                    &fields.u.data,
                    &fields.v.data,
                    &self.ug,
                    &self.vg,
                    grid,
                    fc,
                ),
            },
            LsPres::Off => {}
        }

        if let Ls::On { lslist } = &self.swls {
            for name in lslist {
                if let Some(st) = fields.st.get_mut(name) {
                    large_scale_source(&mut st.data, &self.lsprofs[name], grid);
                }
            }
        }

        if self.swwls == Wls::On {
            let Fields { sp, st, .. } = fields;
            for (name, st) in st.iter_mut() {
                if let Some(s) = sp.get(name) {
                    advec_wls_2nd(&mut st.data, &s.mean, &self.wls, grid);
                }
            }
        }
    }
}

fn read_prof(dst: &mut [f64], name: &str, params: &Parameters, grid: &Grid) -> usize {
    match params.profiles.get(name) {
        Some(prof) if prof.len() == grid.ktot => {
            dst[grid.kstart..grid.kend].copy_from_slice(prof);
            0
        }
        Some(prof) => {
            error!(
                "profile \"{}\" has {} levels, expected {}",
                name,
                prof.len(),
                grid.ktot
            );
            1
        }
        None => {
            error!("profile \"{}\" is missing", name);
            1
        }
    }
}

/// Uniform body force that makes the bulk streamwise velocity equal the
/// target after one Euler step with the updated tendency.
fn calc_flux(ut: &mut [f64], u: &[f64], grid: &Grid, uflux: f64, dt: f64) {
    let jj = grid.icells;
    let kk = grid.ijcells;

    let mut uavg = 0.0;
    let mut utavg = 0.0;

    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                let ijk = i + j * jj + k * kk;
                uavg += u[ijk] * grid.dz[k];
                utavg += ut[ijk] * grid.dz[k];
            }
        }
    }

    let vol = grid.itot as f64 * grid.jtot as f64 * grid.zsize;
    let uavg = grid.get_sum(uavg) / vol;
    let utavg = grid.get_sum(utavg) / vol;

    let fbody = (uflux - uavg - grid.utrans) / dt - utavg;

    for e in ut.iter_mut() {
        *e += fbody;
    }
}

fn coriolis_2nd(
    ut: &mut [f64],
    vt: &mut [f64],
    u: &[f64],
    v: &[f64],
    ug: &[f64],
    vg: &[f64],
    grid: &Grid,
    fc: f64,
) {
    let ii = 1;
    let jj = grid.icells;
    let kk = grid.ijcells;

    let ugrid = grid.utrans;
    let vgrid = grid.vtrans;

    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                let ijk = i + j * jj + k * kk;
                ut[ijk] +=
                    fc * (0.25 * (v[ijk - ii] + v[ijk] + v[ijk - ii + jj] + v[ijk + jj]) + vgrid
                        - vg[k]);
            }
        }
    }

    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                let ijk = i + j * jj + k * kk;
                vt[ijk] -=
                    fc * (0.25 * (u[ijk - jj] + u[ijk] + u[ijk + ii - jj] + u[ijk + ii]) + ugrid
                        - ug[k]);
            }
        }
    }
}

fn coriolis_4th(
    ut: &mut [f64],
    vt: &mut [f64],
    u: &[f64],
    v: &[f64],
    ug: &[f64],
    vg: &[f64],
    grid: &Grid,
    fc: f64,
) {
    let ii1 = 1;
    let ii2 = 2;
    let jj1 = grid.icells;
    let jj2 = 2 * grid.icells;
    let kk1 = grid.ijcells;

    let ugrid = grid.utrans;
    let vgrid = grid.vtrans;

    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                let ijk = i + j * jj1 + k * kk1;
                ut[ijk] += fc
                    * ((CI0
                        * (CI0 * v[ijk - ii2 - jj1]
                            + CI1 * v[ijk - ii1 - jj1]
                            + CI2 * v[ijk - jj1]
                            + CI3 * v[ijk + ii1 - jj1])
                        + CI1
                            * (CI0 * v[ijk - ii2]
                                + CI1 * v[ijk - ii1]
                                + CI2 * v[ijk]
                                + CI3 * v[ijk + ii1])
                        + CI2
                            * (CI0 * v[ijk - ii2 + jj1]
                                + CI1 * v[ijk - ii1 + jj1]
                                + CI2 * v[ijk + jj1]
                                + CI3 * v[ijk + ii1 + jj1])
                        + CI3
                            * (CI0 * v[ijk - ii2 + jj2]
                                + CI1 * v[ijk - ii1 + jj2]
                                + CI2 * v[ijk + jj2]
                                + CI3 * v[ijk + ii1 + jj2]))
                        + vgrid
                        - vg[k]);
            }
        }
    }

    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                let ijk = i + j * jj1 + k * kk1;
                vt[ijk] -= fc
                    * ((CI0
                        * (CI0 * u[ijk - ii1 - jj2]
                            + CI1 * u[ijk - jj2]
                            + CI2 * u[ijk + ii1 - jj2]
                            + CI3 * u[ijk + ii2 - jj2])
                        + CI1
                            * (CI0 * u[ijk - ii1 - jj1]
                                + CI1 * u[ijk - jj1]
                                + CI2 * u[ijk + ii1 - jj1]
                                + CI3 * u[ijk + ii2 - jj1])
                        + CI2
                            * (CI0 * u[ijk - ii1]
                                + CI1 * u[ijk]
                                + CI2 * u[ijk + ii1]
                                + CI3 * u[ijk + ii2])
                        + CI3
                            * (CI0 * u[ijk - ii1 + jj1]
                                + CI1 * u[ijk + jj1]
                                + CI2 * u[ijk + ii1 + jj1]
                                + CI3 * u[ijk + ii2 + jj1]))
                        + ugrid
                        - ug[k]);
            }
        }
    }
}

fn large_scale_source(st: &mut [f64], sls: &[f64], grid: &Grid) {
    let jj = grid.icells;
    let kk = grid.ijcells;

    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                let ijk = i + j * jj + k * kk;
                st[ijk] += sls[k];
            }
        }
    }
}

/// Subsidence advection of the scalar mean profile, upwind in the sign of
/// `wls[k]`.
fn advec_wls_2nd(st: &mut [f64], s: &[f64], wls: &[f64], grid: &Grid) {
    let jj = grid.icells;
    let kk = grid.ijcells;

    for k in grid.kstart..grid.kend {
        if wls[k] > 0.0 {
            for j in grid.jstart..grid.jend {
                for i in grid.istart..grid.iend {
                    let ijk = i + j * jj + k * kk;
                    st[ijk] -= wls[k] * (s[k] - s[k - 1]) * grid.dzhi[k];
                }
            }
        } else {
            for j in grid.jstart..grid.jend {
                for i in grid.istart..grid.iend {
                    let ijk = i + j * jj + k * kk;
                    st[ijk] -= wls[k] * (s[k + 1] - s[k]) * grid.dzhi[k + 1];
                }
            }
        }
    }
}
