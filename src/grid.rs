//! Grid geometry for a horizontally periodic, wall-bounded box.
//!
//! The x and y directions are uniform and cyclic; the vertical direction may
//! be stretched and carries the staggered metric arrays for both spatial
//! orders. Arrays are stored x-fastest with `igc/jgc/kgc` ghost cells per
//! side, addressed through [`Grid::ijk`].

use {
    crate::{
        constants::{CG0, CG1, CG2, CG3},
        error::{Error, Result},
        parameters::GridParameters,
    },
    log::error,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialOrder {
    Second,
    Fourth,
}

#[derive(Debug, Clone)]
pub struct Grid {
    pub itot: usize,
    pub jtot: usize,
    pub ktot: usize,

    pub igc: usize,
    pub jgc: usize,
    pub kgc: usize,

    pub icells: usize,
    pub jcells: usize,
    pub kcells: usize,
    pub ijcells: usize,
    pub ncells: usize,

    pub istart: usize,
    pub jstart: usize,
    pub kstart: usize,
    pub iend: usize,
    pub jend: usize,
    pub kend: usize,

    pub xsize: f64,
    pub ysize: f64,
    pub zsize: f64,

    pub dx: f64,
    pub dy: f64,
    pub dxi: f64,
    pub dyi: f64,

    pub utrans: f64,
    pub vtrans: f64,

    pub spatial_order: SpatialOrder,

    /// Cell-center heights, mirror-extended into the ghost levels.
    pub z: Vec<f64>,
    /// Face heights; `zh[k]` is the face below cell `k`, so the array holds
    /// one entry more than `kcells`.
    pub zh: Vec<f64>,
    /// Cell thickness `zh[k+1] - zh[k]` and its inverse.
    pub dz: Vec<f64>,
    pub dzi: Vec<f64>,
    /// Center-to-center spacing `z[k] - z[k-1]` and its inverse.
    pub dzh: Vec<f64>,
    pub dzhi: Vec<f64>,
    /// 4th-order effective inverse spacings at centers and faces. The
    /// `1/24` gradient factor is folded in; on a uniform grid both reduce
    /// to `1/(24 dz)`. Empty for 2nd-order grids.
    pub dzi4: Vec<f64>,
    pub dzhi4: Vec<f64>,
}

impl Grid {
    pub fn new(params: &GridParameters) -> Result<Self> {
        let mut nerror = 0;

        let spatial_order = match params.spatial_order {
            2 => SpatialOrder::Second,
            4 => SpatialOrder::Fourth,
            n => {
                error!("\"{}\" is an illegal value for spatial_order", n);
                nerror += 1;
                SpatialOrder::Second
            }
        };

        if params.itot == 0 || params.jtot == 0 || params.ktot == 0 {
            error!(
                "grid sizes must be positive, got {} x {} x {}",
                params.itot, params.jtot, params.ktot
            );
            nerror += 1;
        }

        if spatial_order == SpatialOrder::Fourth && params.ktot < 3 {
            error!("the 4th-order scheme needs at least 3 vertical levels");
            nerror += 1;
        }

        if params.xsize <= 0.0 || params.ysize <= 0.0 || params.zsize <= 0.0 {
            error!("domain sizes must be positive");
            nerror += 1;
        }

        if let Some(zp) = &params.z {
            if zp.len() != params.ktot {
                error!("z profile has {} levels, expected {}", zp.len(), params.ktot);
                nerror += 1;
            } else {
                let inside = zp.first().map_or(false, |&z0| z0 > 0.0)
                    && zp.last().map_or(false, |&zt| zt < params.zsize);
                let monotone = zp.windows(2).all(|w| w[1] > w[0]);
                if !(inside && monotone) {
                    error!("z profile must increase monotonically inside (0, zsize)");
                    nerror += 1;
                }
            }
        }

        if nerror > 0 {
            return Err(Error::Config {
                section: "grid",
                nerror,
            });
        }

        let (itot, jtot, ktot) = (params.itot, params.jtot, params.ktot);
        let gc = match spatial_order {
            SpatialOrder::Second => 1,
            SpatialOrder::Fourth => 2,
        };
        let (igc, jgc, kgc) = (gc, gc, gc);

        let icells = itot + 2 * igc;
        let jcells = jtot + 2 * jgc;
        let kcells = ktot + 2 * kgc;
        let ijcells = icells * jcells;
        let ncells = ijcells * kcells;

        let (istart, jstart, kstart) = (igc, jgc, kgc);
        let (iend, jend, kend) = (itot + igc, jtot + jgc, ktot + kgc);

        let dx = params.xsize / itot as f64;
        let dy = params.ysize / jtot as f64;
        let zsize = params.zsize;

        // Cell centers, mirrored over the walls into the ghost levels.
        let mut z = vec![0.0; kcells];
        match &params.z {
            Some(zp) => z[kstart..kend].copy_from_slice(zp),
            None => {
                let dzuni = zsize / ktot as f64;
                for k in kstart..kend {
                    z[k] = (k as f64 - kgc as f64 + 0.5) * dzuni;
                }
            }
        }
        z[kstart - 1] = -z[kstart];
        z[kend] = 2.0 * zsize - z[kend - 1];
        if kgc > 1 {
            z[kstart - 2] = -z[kstart + 1];
            z[kend + 1] = 2.0 * zsize - z[kend - 2];
        }

        // Faces at the midpoints, pinned to the walls, mirrored outside.
        let mut zh = vec![0.0; kcells + 1];
        zh[kstart] = 0.0;
        zh[kend] = zsize;
        for k in kstart + 1..kend {
            zh[k] = 0.5 * (z[k - 1] + z[k]);
        }
        zh[kstart - 1] = -zh[kstart + 1];
        zh[kend + 1] = 2.0 * zsize - zh[kend - 1];
        if kgc > 1 {
            zh[kstart - 2] = -zh[kstart + 2];
            zh[kend + 2] = 2.0 * zsize - zh[kend - 2];
        }

        let mut dz = vec![0.0; kcells];
        for k in 0..kcells {
            dz[k] = zh[k + 1] - zh[k];
        }
        let mut dzh = vec![0.0; kcells];
        for k in 1..kcells {
            dzh[k] = z[k] - z[k - 1];
        }
        dzh[0] = dzh[1];

        let dzi = dz.iter().map(|&d| 1.0 / d).collect();
        let dzhi = dzh.iter().map(|&d| 1.0 / d).collect();

        let mut dzi4 = Vec::new();
        let mut dzhi4 = Vec::new();
        if spatial_order == SpatialOrder::Fourth {
            dzi4 = vec![0.0; kcells];
            dzhi4 = vec![0.0; kcells];
            for k in 2..kcells - 1 {
                dzhi4[k] = 1.0 / (CG0 * z[k - 2] + CG1 * z[k - 1] + CG2 * z[k] + CG3 * z[k + 1]);
            }
            for k in 1..kcells - 1 {
                dzi4[k] = 1.0 / (CG0 * zh[k - 1] + CG1 * zh[k] + CG2 * zh[k + 1] + CG3 * zh[k + 2]);
            }
        }

        Ok(Grid {
            itot,
            jtot,
            ktot,
            igc,
            jgc,
            kgc,
            icells,
            jcells,
            kcells,
            ijcells,
            ncells,
            istart,
            jstart,
            kstart,
            iend,
            jend,
            kend,
            xsize: params.xsize,
            ysize: params.ysize,
            zsize,
            dx,
            dy,
            dxi: 1.0 / dx,
            dyi: 1.0 / dy,
            utrans: params.utrans,
            vtrans: params.vtrans,
            spatial_order,
            z,
            zh,
            dz,
            dzi,
            dzh,
            dzhi,
            dzi4,
            dzhi4,
        })
    }

    #[inline]
    pub fn ijk(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.icells + k * self.ijcells
    }

    /// Fill the horizontal ghost cells from the periodic interior image.
    /// A single-row domain copies its one row into all y ghosts.
    pub fn boundary_cyclic(&self, data: &mut [f64]) {
        debug_assert_eq!(data.len(), self.ncells);

        for k in 0..self.kcells {
            for j in 0..self.jcells {
                for i in 0..self.igc {
                    data[self.ijk(i, j, k)] = data[self.ijk(self.iend - self.igc + i, j, k)];
                    data[self.ijk(self.iend + i, j, k)] = data[self.ijk(self.istart + i, j, k)];
                }
            }
        }

        if self.jtot == 1 {
            for k in 0..self.kcells {
                for j in 0..self.jgc {
                    for i in 0..self.icells {
                        data[self.ijk(i, j, k)] = data[self.ijk(i, self.jstart, k)];
                        data[self.ijk(i, self.jend + j, k)] = data[self.ijk(i, self.jstart, k)];
                    }
                }
            }
        } else {
            for k in 0..self.kcells {
                for j in 0..self.jgc {
                    for i in 0..self.icells {
                        data[self.ijk(i, j, k)] = data[self.ijk(i, self.jend - self.jgc + j, k)];
                        data[self.ijk(i, self.jend + j, k)] = data[self.ijk(i, self.jstart + j, k)];
                    }
                }
            }
        }
    }

    /// Reduction seams. This build runs one process, so both are the
    /// identity; a decomposed build turns them into collectives.
    pub fn get_sum(&self, v: f64) -> f64 {
        v
    }

    pub fn get_max(&self, v: f64) -> f64 {
        v
    }
}
