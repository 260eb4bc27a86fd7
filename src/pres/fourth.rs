//! 4th-order Fourier–heptadiagonal pressure solver.
//!
//! The vertical operator is the 4th-order divergence of the 4th-order
//! staggered gradient, with the vertical velocity mirrored over the walls.
//! Per wavenumber pair one heptadiagonal system of `kmax + 4` rows is
//! solved: two ghost rows under the bottom wall, the `kmax` interior rows
//! with the horizontal eigenvalue added to the main diagonal, and two ghost
//! rows above the top wall. The input and output kernels are monomorphized
//! over the `DIM3` flag so a single-row domain pays no y-direction work.

use {
    super::Pres,
    crate::{
        constants::{CG0, CG1, CG2, CG3, CGI},
        fields::Fields,
        grid::Grid,
        rfft::Fft2d,
    },
    std::f64::consts::PI,
};

pub struct Pres4 {
    /// Modified wavenumbers of the 4th-order horizontal Laplacian, mirrored
    /// around the Nyquist index.
    pub(crate) bmati: Vec<f64>,
    pub(crate) bmatj: Vec<f64>,

    /// The seven diagonals of the vertical operator on the interior rows.
    pub(crate) m1: Vec<f64>,
    pub(crate) m2: Vec<f64>,
    pub(crate) m3: Vec<f64>,
    pub(crate) m4: Vec<f64>,
    pub(crate) m5: Vec<f64>,
    pub(crate) m6: Vec<f64>,
    pub(crate) m7: Vec<f64>,

    fft: Fft2d,
}

impl Pres4 {
    pub fn new(grid: &Grid) -> Self {
        Pres4 {
            bmati: vec![0.0; grid.itot],
            bmatj: vec![0.0; grid.jtot],
            m1: vec![0.0; grid.ktot],
            m2: vec![0.0; grid.ktot],
            m3: vec![0.0; grid.ktot],
            m4: vec![0.0; grid.ktot],
            m5: vec![0.0; grid.ktot],
            m6: vec![0.0; grid.ktot],
            m7: vec![0.0; grid.ktot],
            fft: Fft2d::new(grid.itot, grid.jtot),
        }
    }

    /// Transform the right-hand side, run the per-column heptadiagonal
    /// solves, transform back. Operates in place on the compact grid.
    ///
    /// The column systems are assembled into slabs of `jslice` rows so the
    /// inner loops stay contiguous in i. The slab buffers live for one call
    /// only; eight of them of `iblock·jslice·(kmax+4)` values each.
    pub(crate) fn solve(&self, p: &mut [f64], grid: &Grid) {
        self.fft.forward(p);

        let kmax = grid.ktot;
        let iblock = grid.itot;
        let jblock = grid.jtot;

        let jslice = 1;
        let nj = jblock / jslice;

        let jj = iblock;
        let kk = iblock * jblock;

        let kki1 = iblock * jslice;
        let kki2 = 2 * kki1;
        let kki3 = 3 * kki1;

        let ns = iblock * jslice * (kmax + 4);
        let mut m1t = vec![0.0; ns];
        let mut m2t = vec![0.0; ns];
        let mut m3t = vec![0.0; ns];
        let mut m4t = vec![0.0; ns];
        let mut m5t = vec![0.0; ns];
        let mut m6t = vec![0.0; ns];
        let mut m7t = vec![0.0; ns];
        let mut pt = vec![0.0; ns];

        for n in 0..nj {
            for j in 0..jslice {
                for i in 0..iblock {
                    let ik = i + j * jj;

                    // Zero-gradient ghost rows under the bottom wall,
                    // mirroring the pressure over the wall face.
                    m1t[ik] = 0.0;
                    m2t[ik] = 0.0;
                    m3t[ik] = 0.0;
                    m4t[ik] = 1.0;
                    m5t[ik] = 0.0;
                    m6t[ik] = 0.0;
                    m7t[ik] = -1.0;
                    pt[ik] = 0.0;

                    m1t[ik + kki1] = 0.0;
                    m2t[ik + kki1] = 0.0;
                    m3t[ik + kki1] = 0.0;
                    m4t[ik + kki1] = 1.0;
                    m5t[ik + kki1] = -1.0;
                    m6t[ik + kki1] = 0.0;
                    m7t[ik + kki1] = 0.0;
                    pt[ik + kki1] = 0.0;
                }
            }

            for k in 0..kmax {
                for j in 0..jslice {
                    // One process owns the whole block; a decomposed
                    // transform adds the swapped block offsets to both
                    // indices here.
                    let jindex = n * jslice + j;
                    for i in 0..iblock {
                        let iindex = i;

                        let ijk = i + (j + n * jslice) * jj + k * kk;
                        let ik = i + j * jj + k * kki1;
                        m1t[ik + kki2] = self.m1[k];
                        m2t[ik + kki2] = self.m2[k];
                        m3t[ik + kki2] = self.m3[k];
                        m4t[ik + kki2] = self.m4[k] + self.bmati[iindex] + self.bmatj[jindex];
                        m5t[ik + kki2] = self.m5[k];
                        m6t[ik + kki2] = self.m6[k];
                        m7t[ik + kki2] = self.m7[k];
                        pt[ik + kki2] = p[ijk];
                    }
                }
            }

            for j in 0..jslice {
                let jindex = n * jslice + j;
                for i in 0..iblock {
                    let iindex = i;
                    let ik = i + j * jj + kmax * kki1;

                    if iindex == 0 && jindex == 0 {
                        // The zero mode carries the mean: pin the pressure
                        // extrapolated to the top wall to zero.
                        m1t[ik + kki2] = 0.0;
                        m2t[ik + kki2] = -1.0 / 3.0;
                        m3t[ik + kki2] = 2.0;
                        m4t[ik + kki2] = 1.0;

                        m1t[ik + kki3] = -2.0;
                        m2t[ik + kki3] = 9.0;
                        m3t[ik + kki3] = 0.0;
                        m4t[ik + kki3] = 1.0;
                    } else {
                        // Zero-gradient ghost rows above the top wall.
                        m1t[ik + kki2] = 0.0;
                        m2t[ik + kki2] = 0.0;
                        m3t[ik + kki2] = -1.0;
                        m4t[ik + kki2] = 1.0;

                        m1t[ik + kki3] = -1.0;
                        m2t[ik + kki3] = 0.0;
                        m3t[ik + kki3] = 0.0;
                        m4t[ik + kki3] = 1.0;
                    }
                }
            }

            for j in 0..jslice {
                for i in 0..iblock {
                    let ik = i + j * jj + kmax * kki1;
                    m5t[ik + kki2] = 0.0;
                    m6t[ik + kki2] = 0.0;
                    m7t[ik + kki2] = 0.0;
                    pt[ik + kki2] = 0.0;

                    m5t[ik + kki3] = 0.0;
                    m6t[ik + kki3] = 0.0;
                    m7t[ik + kki3] = 0.0;
                    pt[ik + kki3] = 0.0;
                }
            }

            hdma(
                &mut m1t, &mut m2t, &mut m3t, &mut m4t, &mut m5t, &mut m6t, &mut m7t, &mut pt,
                kmax, iblock, jslice,
            );

            for k in 0..kmax {
                for j in 0..jslice {
                    for i in 0..iblock {
                        let ik = i + j * jj + k * kki1;
                        let ijk = i + (j + n * jslice) * jj + k * kk;
                        p[ijk] = pt[ik + kki2];
                    }
                }
            }
        }

        self.fft.backward(p);
    }
}

impl Pres for Pres4 {
    fn set_values(&mut self, grid: &Grid) {
        let itot = grid.itot;
        let jtot = grid.jtot;
        let kmax = grid.ktot;
        let kstart = grid.kstart;

        let dxidxi = grid.dxi * grid.dxi;
        let dyidyi = grid.dyi * grid.dyi;

        for j in 0..jtot / 2 + 1 {
            let arg = 2.0 * PI * j as f64 / jtot as f64;
            self.bmatj[j] = (2.0 * (1.0 / 576.0) * (3.0 * arg).cos()
                - 2.0 * (54.0 / 576.0) * (2.0 * arg).cos()
                + 2.0 * (783.0 / 576.0) * arg.cos()
                - 1460.0 / 576.0)
                * dyidyi;
        }
        for j in jtot / 2 + 1..jtot {
            self.bmatj[j] = self.bmatj[jtot - j];
        }

        for i in 0..itot / 2 + 1 {
            let arg = 2.0 * PI * i as f64 / itot as f64;
            self.bmati[i] = (2.0 * (1.0 / 576.0) * (3.0 * arg).cos()
                - 2.0 * (54.0 / 576.0) * (2.0 * arg).cos()
                + 2.0 * (783.0 / 576.0) * arg.cos()
                - 1460.0 / 576.0)
                * dxidxi;
        }
        for i in itot / 2 + 1..itot {
            self.bmati[i] = self.bmati[itot - i];
        }

        let dzi4 = &grid.dzi4;
        let dzhi4 = &grid.dzhi4;

        // Bottom row: w is mirrored over the wall, which folds the flux at
        // the ghost face into the neighbouring diagonals.
        let k = 0;
        let kc = kstart + k;
        self.m1[k] = 0.0;
        self.m2[k] = (-27.0 * dzhi4[kc]) * dzi4[kc];
        self.m3[k] = (-1.0 * dzhi4[kc + 1] + 729.0 * dzhi4[kc] + 27.0 * dzhi4[kc + 1]) * dzi4[kc];
        self.m4[k] = (27.0 * dzhi4[kc + 1]
            - 729.0 * dzhi4[kc]
            - 729.0 * dzhi4[kc + 1]
            - 1.0 * dzhi4[kc + 2])
            * dzi4[kc];
        self.m5[k] = (-27.0 * dzhi4[kc + 1]
            + 27.0 * dzhi4[kc]
            + 729.0 * dzhi4[kc + 1]
            + 27.0 * dzhi4[kc + 2])
            * dzi4[kc];
        self.m6[k] = (1.0 * dzhi4[kc + 1] - 27.0 * dzhi4[kc + 1] - 27.0 * dzhi4[kc + 2]) * dzi4[kc];
        self.m7[k] = (1.0 * dzhi4[kc + 2]) * dzi4[kc];

        for k in 1..kmax - 1 {
            let kc = kstart + k;
            self.m1[k] = (1.0 * dzhi4[kc - 1]) * dzi4[kc];
            self.m2[k] = (-27.0 * dzhi4[kc - 1] - 27.0 * dzhi4[kc]) * dzi4[kc];
            self.m3[k] =
                (27.0 * dzhi4[kc - 1] + 729.0 * dzhi4[kc] + 27.0 * dzhi4[kc + 1]) * dzi4[kc];
            self.m4[k] = (-1.0 * dzhi4[kc - 1]
                - 729.0 * dzhi4[kc]
                - 729.0 * dzhi4[kc + 1]
                - 1.0 * dzhi4[kc + 2])
                * dzi4[kc];
            self.m5[k] =
                (27.0 * dzhi4[kc] + 729.0 * dzhi4[kc + 1] + 27.0 * dzhi4[kc + 2]) * dzi4[kc];
            self.m6[k] = (-27.0 * dzhi4[kc + 1] - 27.0 * dzhi4[kc + 2]) * dzi4[kc];
            self.m7[k] = (1.0 * dzhi4[kc + 2]) * dzi4[kc];
        }

        // Top row, with the mirror over the top wall.
        let k = kmax - 1;
        let kc = kstart + k;
        self.m1[k] = (1.0 * dzhi4[kc - 1]) * dzi4[kc];
        self.m2[k] = (-27.0 * dzhi4[kc - 1] - 27.0 * dzhi4[kc] + 1.0 * dzhi4[kc]) * dzi4[kc];
        self.m3[k] = (27.0 * dzhi4[kc - 1] + 729.0 * dzhi4[kc] + 27.0 * dzhi4[kc + 1]
            - 27.0 * dzhi4[kc])
            * dzi4[kc];
        self.m4[k] = (-1.0 * dzhi4[kc - 1] - 729.0 * dzhi4[kc] - 729.0 * dzhi4[kc + 1]
            + 27.0 * dzhi4[kc])
            * dzi4[kc];
        self.m5[k] = (27.0 * dzhi4[kc] + 729.0 * dzhi4[kc + 1] - 1.0 * dzhi4[kc]) * dzi4[kc];
        self.m6[k] = (-27.0 * dzhi4[kc + 1]) * dzi4[kc];
        self.m7[k] = 0.0;
    }

    fn exec(&mut self, fields: &mut Fields, grid: &Grid, dt: f64) {
        grid.boundary_cyclic(&mut fields.ut.data);
        if grid.jtot > 1 {
            grid.boundary_cyclic(&mut fields.vt.data);
        }

        let mut work = vec![0.0; grid.itot * grid.jtot * grid.ktot];
        {
            let Fields {
                u, v, w, ut, vt, wt, ..
            } = fields;
            if grid.jtot > 1 {
                input::<true>(
                    &mut work, &u.data, &v.data, &w.data, &ut.data, &vt.data, &mut wt.data,
                    grid, dt,
                );
            } else {
                input::<false>(
                    &mut work, &u.data, &v.data, &w.data, &ut.data, &vt.data, &mut wt.data,
                    grid, dt,
                );
            }
        }

        self.solve(&mut work, grid);

        // Back onto the ghosted grid.
        let p = &mut fields.p.data;
        for k in 0..grid.ktot {
            for j in 0..grid.jtot {
                for i in 0..grid.itot {
                    p[grid.ijk(i + grid.igc, j + grid.jgc, k + grid.kgc)] =
                        work[i + j * grid.itot + k * grid.itot * grid.jtot];
                }
            }
        }

        // Two zero-gradient ghost levels at each wall.
        let kk1 = grid.ijcells;
        let kk2 = 2 * grid.ijcells;
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                let ijk = grid.ijk(i, j, grid.kstart);
                p[ijk - kk1] = p[ijk];
                p[ijk - kk2] = p[ijk + kk1];
            }
        }
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                let ijk = grid.ijk(i, j, grid.kend - 1);
                p[ijk + kk1] = p[ijk];
                p[ijk + kk2] = p[ijk - kk1];
            }
        }

        grid.boundary_cyclic(p);

        let Fields { ut, vt, wt, p, .. } = fields;
        if grid.jtot > 1 {
            output::<true>(&mut ut.data, &mut vt.data, &mut wt.data, &p.data, grid);
        } else {
            output::<false>(&mut ut.data, &mut vt.data, &mut wt.data, &p.data, grid);
        }
    }

    fn check_divergence(&self, fields: &Fields, grid: &Grid) -> f64 {
        let ii1 = 1;
        let ii2 = 2;
        let jj1 = grid.icells;
        let jj2 = 2 * grid.icells;
        let kk1 = grid.ijcells;
        let kk2 = 2 * grid.ijcells;

        let dxi = grid.dxi;
        let dyi = grid.dyi;

        let (u, v, w) = (&fields.u.data, &fields.v.data, &fields.w.data);

        let mut divmax: f64 = 0.0;
        for k in grid.kstart..grid.kend {
            for j in grid.jstart..grid.jend {
                for i in grid.istart..grid.iend {
                    let ijk = i + j * jj1 + k * kk1;
                    let div = (CG0 * u[ijk - ii1]
                        + CG1 * u[ijk]
                        + CG2 * u[ijk + ii1]
                        + CG3 * u[ijk + ii2])
                        * CGI
                        * dxi
                        + (CG0 * v[ijk - jj1]
                            + CG1 * v[ijk]
                            + CG2 * v[ijk + jj1]
                            + CG3 * v[ijk + jj2])
                            * CGI
                            * dyi
                        + (CG0 * w[ijk - kk1]
                            + CG1 * w[ijk]
                            + CG2 * w[ijk + kk1]
                            + CG3 * w[ijk + kk2])
                            * grid.dzi4[k];
                    divmax = divmax.max(div.abs());
                }
            }
        }

        grid.get_max(divmax)
    }
}

/// Build the right-hand side `∇·(u̇ + u/dt)` on the compact grid. Writes the
/// wall mirrors into the `wt` ghost levels first; the `w` ghost levels are
/// expected to hold their mirrored values already, maintained by the
/// boundary scheme.
#[allow(clippy::too_many_arguments)]
fn input<const DIM3: bool>(
    p: &mut [f64],
    u: &[f64],
    v: &[f64],
    w: &[f64],
    ut: &[f64],
    vt: &[f64],
    wt: &mut [f64],
    grid: &Grid,
    dt: f64,
) {
    let ii1 = 1;
    let ii2 = 2;
    let jj1 = grid.icells;
    let jj2 = 2 * grid.icells;
    let kk1 = grid.ijcells;
    let kk2 = 2 * grid.ijcells;

    let jjp = grid.itot;
    let kkp = grid.itot * grid.jtot;

    let kmax = grid.ktot;
    let (igc, jgc, kgc) = (grid.igc, grid.jgc, grid.kgc);

    let dxi = grid.dxi;
    let dyi = grid.dyi;
    let dti = 1.0 / dt;

    // Mirror the wt ghost faces over the walls.
    for j in 0..grid.jtot {
        for i in 0..grid.itot {
            let ijk = i + igc + (j + jgc) * jj1 + kgc * kk1;
            wt[ijk - kk1] = -wt[ijk + kk1];
        }
    }
    for j in 0..grid.jtot {
        for i in 0..grid.itot {
            let ijk = i + igc + (j + jgc) * jj1 + (kmax + kgc) * kk1;
            wt[ijk + kk1] = -wt[ijk - kk1];
        }
    }

    for k in 0..kmax {
        for j in 0..grid.jtot {
            for i in 0..grid.itot {
                let ijkp = i + j * jjp + k * kkp;
                let ijk = i + igc + (j + jgc) * jj1 + (k + kgc) * kk1;
                p[ijkp] = (CG0 * (ut[ijk - ii1] + u[ijk - ii1] * dti)
                    + CG1 * (ut[ijk] + u[ijk] * dti)
                    + CG2 * (ut[ijk + ii1] + u[ijk + ii1] * dti)
                    + CG3 * (ut[ijk + ii2] + u[ijk + ii2] * dti))
                    * CGI
                    * dxi;
                if DIM3 {
                    p[ijkp] += (CG0 * (vt[ijk - jj1] + v[ijk - jj1] * dti)
                        + CG1 * (vt[ijk] + v[ijk] * dti)
                        + CG2 * (vt[ijk + jj1] + v[ijk + jj1] * dti)
                        + CG3 * (vt[ijk + jj2] + v[ijk + jj2] * dti))
                        * CGI
                        * dyi;
                }
                p[ijkp] += (CG0 * (wt[ijk - kk1] + w[ijk - kk1] * dti)
                    + CG1 * (wt[ijk] + w[ijk] * dti)
                    + CG2 * (wt[ijk + kk1] + w[ijk + kk1] * dti)
                    + CG3 * (wt[ijk + kk2] + w[ijk + kk2] * dti))
                    * grid.dzi4[k + kgc];
            }
        }
    }
}

/// Subtract the pressure gradient from the tendencies. The wall rows of
/// `wt` stay untouched: the mirrored pressure makes the discrete wall
/// gradient vanish identically.
fn output<const DIM3: bool>(ut: &mut [f64], vt: &mut [f64], wt: &mut [f64], p: &[f64], grid: &Grid) {
    let ii1 = 1;
    let ii2 = 2;
    let jj1 = grid.icells;
    let jj2 = 2 * grid.icells;
    let kk1 = grid.ijcells;
    let kk2 = 2 * grid.ijcells;

    let dxi = grid.dxi;
    let dyi = grid.dyi;

    for j in grid.jstart..grid.jend {
        for i in grid.istart..grid.iend {
            let ijk = i + j * jj1 + grid.kstart * kk1;
            ut[ijk] -=
                (CG0 * p[ijk - ii2] + CG1 * p[ijk - ii1] + CG2 * p[ijk] + CG3 * p[ijk + ii1])
                    * CGI
                    * dxi;
            if DIM3 {
                vt[ijk] -=
                    (CG0 * p[ijk - jj2] + CG1 * p[ijk - jj1] + CG2 * p[ijk] + CG3 * p[ijk + jj1])
                        * CGI
                        * dyi;
            }
        }
    }

    for k in grid.kstart + 1..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                let ijk = i + j * jj1 + k * kk1;
                ut[ijk] -=
                    (CG0 * p[ijk - ii2] + CG1 * p[ijk - ii1] + CG2 * p[ijk] + CG3 * p[ijk + ii1])
                        * CGI
                        * dxi;
                if DIM3 {
                    vt[ijk] -= (CG0 * p[ijk - jj2]
                        + CG1 * p[ijk - jj1]
                        + CG2 * p[ijk]
                        + CG3 * p[ijk + jj1])
                        * CGI
                        * dyi;
                }
                wt[ijk] -=
                    (CG0 * p[ijk - kk2] + CG1 * p[ijk - kk1] + CG2 * p[ijk] + CG3 * p[ijk + kk1])
                        * grid.dzhi4[k];
            }
        }
    }
}

/// LU factorization and the two substitution sweeps of the heptadiagonal
/// system, vectorizable over the `iblock·jslice` leading dimension.
#[allow(clippy::too_many_arguments)]
pub(crate) fn hdma(
    m1: &mut [f64],
    m2: &mut [f64],
    m3: &mut [f64],
    m4: &mut [f64],
    m5: &mut [f64],
    m6: &mut [f64],
    m7: &mut [f64],
    p: &mut [f64],
    kmax: usize,
    iblock: usize,
    jslice: usize,
) {
    let jj = iblock;

    let kk1 = iblock * jslice;
    let kk2 = 2 * kk1;
    let kk3 = 3 * kk1;

    // LU factorization.
    for j in 0..jslice {
        for i in 0..iblock {
            let ik = i + j * jj;
            m1[ik] = 1.0;
            m2[ik] = 1.0;
            m3[ik] = 1.0 / m4[ik];
            m4[ik] = 1.0;
            m5[ik] *= m3[ik];
            m6[ik] *= m3[ik];
            m7[ik] *= m3[ik];
        }
    }

    for j in 0..jslice {
        for i in 0..iblock {
            let ik = i + j * jj + kk1;
            m1[ik] = 1.0;
            m2[ik] = 1.0;
            m3[ik] /= m4[ik - kk1];
            m4[ik] -= m3[ik] * m5[ik - kk1];
            m5[ik] -= m3[ik] * m6[ik - kk1];
            m6[ik] -= m3[ik] * m7[ik - kk1];
        }
    }

    for j in 0..jslice {
        for i in 0..iblock {
            let ik = i + j * jj + kk2;
            m1[ik] = 1.0;
            m2[ik] /= m4[ik - kk2];
            m3[ik] = (m3[ik] - m2[ik] * m5[ik - kk2]) / m4[ik - kk1];
            m4[ik] = m4[ik] - m3[ik] * m5[ik - kk1] - m2[ik] * m6[ik - kk2];
            m5[ik] = m5[ik] - m3[ik] * m6[ik - kk1] - m2[ik] * m7[ik - kk2];
            m6[ik] -= m3[ik] * m7[ik - kk1];
        }
    }

    for k in 3..kmax + 2 {
        for j in 0..jslice {
            for i in 0..iblock {
                let ik = i + j * jj + k * kk1;
                m1[ik] /= m4[ik - kk3];
                m2[ik] = (m2[ik] - m1[ik] * m5[ik - kk3]) / m4[ik - kk2];
                m3[ik] = (m3[ik] - m2[ik] * m5[ik - kk2] - m1[ik] * m6[ik - kk3]) / m4[ik - kk1];
                m4[ik] =
                    m4[ik] - m3[ik] * m5[ik - kk1] - m2[ik] * m6[ik - kk2] - m1[ik] * m7[ik - kk3];
                m5[ik] = m5[ik] - m3[ik] * m6[ik - kk1] - m2[ik] * m7[ik - kk2];
                m6[ik] -= m3[ik] * m7[ik - kk1];
            }
        }
    }

    let k = kmax + 1;
    for j in 0..jslice {
        for i in 0..iblock {
            let ik = i + j * jj + k * kk1;
            m7[ik] = 1.0;
        }
    }

    let k = kmax + 2;
    for j in 0..jslice {
        for i in 0..iblock {
            let ik = i + j * jj + k * kk1;
            m1[ik] /= m4[ik - kk3];
            m2[ik] = (m2[ik] - m1[ik] * m5[ik - kk3]) / m4[ik - kk2];
            m3[ik] = (m3[ik] - m2[ik] * m5[ik - kk2] - m1[ik] * m6[ik - kk3]) / m4[ik - kk1];
            m4[ik] = m4[ik] - m3[ik] * m5[ik - kk1] - m2[ik] * m6[ik - kk2] - m1[ik] * m7[ik - kk3];
            m5[ik] = m5[ik] - m3[ik] * m6[ik - kk1] - m2[ik] * m7[ik - kk2];
            m6[ik] = 1.0;
            m7[ik] = 1.0;
        }
    }

    let k = kmax + 3;
    for j in 0..jslice {
        for i in 0..iblock {
            let ik = i + j * jj + k * kk1;
            m1[ik] /= m4[ik - kk3];
            m2[ik] = (m2[ik] - m1[ik] * m5[ik - kk3]) / m4[ik - kk2];
            m3[ik] = (m3[ik] - m2[ik] * m5[ik - kk2] - m1[ik] * m6[ik - kk3]) / m4[ik - kk1];
            m4[ik] = m4[ik] - m3[ik] * m5[ik - kk1] - m2[ik] * m6[ik - kk2] - m1[ik] * m7[ik - kk3];
            m5[ik] = 1.0;
            m6[ik] = 1.0;
            m7[ik] = 1.0;
        }
    }

    // Forward substitution, Ly = p.
    for j in 0..jslice {
        for i in 0..iblock {
            let ik = i + j * jj;
            p[ik] *= m3[ik];
            p[ik + kk1] -= p[ik] * m3[ik + kk1];
            p[ik + kk2] = p[ik + kk2] - p[ik + kk1] * m3[ik + kk2] - p[ik] * m2[ik + kk2];
        }
    }

    for k in 3..kmax + 4 {
        for j in 0..jslice {
            for i in 0..iblock {
                let ik = i + j * jj + k * kk1;
                p[ik] = p[ik] - p[ik - kk1] * m3[ik] - p[ik - kk2] * m2[ik] - p[ik - kk3] * m1[ik];
            }
        }
    }

    // Backward substitution, Ux = y.
    let k = kmax + 3;
    for j in 0..jslice {
        for i in 0..iblock {
            let ik = i + j * jj + k * kk1;
            p[ik] /= m4[ik];
            p[ik - kk1] = (p[ik - kk1] - p[ik] * m5[ik - kk1]) / m4[ik - kk1];
            p[ik - kk2] = (p[ik - kk2] - p[ik - kk1] * m5[ik - kk2] - p[ik] * m6[ik - kk2])
                / m4[ik - kk2];
        }
    }

    for k in (0..=kmax).rev() {
        for j in 0..jslice {
            for i in 0..iblock {
                let ik = i + j * jj + k * kk1;
                p[ik] = (p[ik] - p[ik + kk1] * m5[ik] - p[ik + kk2] * m6[ik] - p[ik + kk3] * m7[ik])
                    / m4[ik];
            }
        }
    }
}
