//! 2nd-order Fourier–tridiagonal pressure solver.

use {
    super::Pres,
    crate::{fields::Fields, grid::Grid, rfft::Fft2d},
    std::f64::consts::PI,
};

pub struct Pres2 {
    /// Modified wavenumbers of the 2nd-order horizontal Laplacian, mirrored
    /// around the Nyquist index.
    pub(crate) bmati: Vec<f64>,
    pub(crate) bmatj: Vec<f64>,

    /// Sub- and superdiagonal of the vertical operator, premultiplied by
    /// the cell thickness.
    pub(crate) a: Vec<f64>,
    pub(crate) c: Vec<f64>,

    fft: Fft2d,
}

impl Pres2 {
    pub fn new(grid: &Grid) -> Self {
        Pres2 {
            bmati: vec![0.0; grid.itot],
            bmatj: vec![0.0; grid.jtot],
            a: vec![0.0; grid.ktot],
            c: vec![0.0; grid.ktot],
            fft: Fft2d::new(grid.itot, grid.jtot),
        }
    }

    /// Build the Poisson right-hand side `∇·(u̇ + u/dt)` on the compact
    /// (ghost-free) grid.
    fn input(&self, p: &mut [f64], fields: &Fields, grid: &Grid, dt: f64) {
        let ii = 1;
        let jj = grid.icells;
        let kk = grid.ijcells;

        let jjp = grid.itot;
        let kkp = grid.itot * grid.jtot;

        let dxi = grid.dxi;
        let dyi = grid.dyi;
        let dti = 1.0 / dt;

        let (u, v, w) = (&fields.u.data, &fields.v.data, &fields.w.data);
        let (ut, vt, wt) = (&fields.ut.data, &fields.vt.data, &fields.wt.data);

        for k in 0..grid.ktot {
            for j in 0..grid.jtot {
                for i in 0..grid.itot {
                    let ijkp = i + j * jjp + k * kkp;
                    let ijk = grid.ijk(i + grid.igc, j + grid.jgc, k + grid.kgc);
                    p[ijkp] = ((ut[ijk + ii] + u[ijk + ii] * dti) - (ut[ijk] + u[ijk] * dti)) * dxi
                        + ((vt[ijk + jj] + v[ijk + jj] * dti) - (vt[ijk] + v[ijk] * dti)) * dyi
                        + ((wt[ijk + kk] + w[ijk + kk] * dti) - (wt[ijk] + w[ijk] * dti))
                            * grid.dzi[k + grid.kgc];
                }
            }
        }
    }

    /// Solve `∇²p = rhs` in place on the compact grid: forward transforms,
    /// one tridiagonal solve per wavenumber pair, backward transforms.
    pub(crate) fn solve(&self, p: &mut [f64], grid: &Grid) {
        self.fft.forward(p);

        let ktot = grid.ktot;
        let kgc = grid.kgc;
        let jj = grid.itot;
        let kk = grid.itot * grid.jtot;

        let mut b = vec![0.0; ktot];
        let mut xin = vec![0.0; ktot];
        let mut xout = vec![0.0; ktot];
        let mut gam = vec![0.0; ktot];

        for j in 0..grid.jtot {
            for i in 0..grid.itot {
                // One process owns the whole block; a decomposed transform
                // adds the swapped block offsets here.
                let iindex = i;
                let jindex = j;

                for k in 0..ktot {
                    let dzsq = grid.dz[k + kgc] * grid.dz[k + kgc];
                    b[k] = dzsq * (self.bmati[iindex] + self.bmatj[jindex])
                        - (self.a[k] + self.c[k]);
                    xin[k] = dzsq * p[i + j * jj + k * kk];
                }

                // Zero gradient at the bottom wall.
                b[0] += self.a[0];

                // The zero mode carries the mean: pin the pressure at the
                // top instead of prescribing another zero gradient.
                if iindex == 0 && jindex == 0 {
                    b[ktot - 1] -= self.c[ktot - 1];
                } else {
                    b[ktot - 1] += self.c[ktot - 1];
                }

                tdma(&self.a, &b, &self.c, &xin, &mut xout, &mut gam);

                for k in 0..ktot {
                    p[i + j * jj + k * kk] = xout[k];
                }
            }
        }

        self.fft.backward(p);
    }

    fn output(&self, fields: &mut Fields, grid: &Grid) {
        let ii = 1;
        let jj = grid.icells;
        let kk = grid.ijcells;

        let dxi = grid.dxi;
        let dyi = grid.dyi;

        let Fields { ut, vt, wt, p, .. } = fields;
        let (ut, vt, wt, p) = (&mut ut.data, &mut vt.data, &mut wt.data, &p.data);

        for k in grid.kstart..grid.kend {
            for j in grid.jstart..grid.jend {
                for i in grid.istart..grid.iend {
                    let ijk = i + j * jj + k * kk;
                    ut[ijk] -= (p[ijk] - p[ijk - ii]) * dxi;
                    vt[ijk] -= (p[ijk] - p[ijk - jj]) * dyi;
                    wt[ijk] -= (p[ijk] - p[ijk - kk]) * grid.dzhi[k];
                }
            }
        }
    }
}

impl Pres for Pres2 {
    fn set_values(&mut self, grid: &Grid) {
        let itot = grid.itot;
        let jtot = grid.jtot;

        let dxidxi = grid.dxi * grid.dxi;
        let dyidyi = grid.dyi * grid.dyi;

        for j in 0..jtot / 2 + 1 {
            self.bmatj[j] = 2.0 * ((2.0 * PI * j as f64 / jtot as f64).cos() - 1.0) * dyidyi;
        }
        for j in jtot / 2 + 1..jtot {
            self.bmatj[j] = self.bmatj[jtot - j];
        }

        for i in 0..itot / 2 + 1 {
            self.bmati[i] = 2.0 * ((2.0 * PI * i as f64 / itot as f64).cos() - 1.0) * dxidxi;
        }
        for i in itot / 2 + 1..itot {
            self.bmati[i] = self.bmati[itot - i];
        }

        for k in 0..grid.ktot {
            self.a[k] = grid.dz[k + grid.kgc] * grid.dzhi[k + grid.kgc];
            self.c[k] = grid.dz[k + grid.kgc] * grid.dzhi[k + grid.kgc + 1];
        }
    }

    fn exec(&mut self, fields: &mut Fields, grid: &Grid, dt: f64) {
        grid.boundary_cyclic(&mut fields.ut.data);
        grid.boundary_cyclic(&mut fields.vt.data);
        grid.boundary_cyclic(&mut fields.wt.data);

        let mut work = vec![0.0; grid.itot * grid.jtot * grid.ktot];
        self.input(&mut work, fields, grid, dt);
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

        grid.boundary_cyclic(p);

        // Zero-gradient ghost levels at both walls.
        let kk = grid.ijcells;
        for j in 0..grid.jcells {
            for i in 0..grid.icells {
                let ijk = grid.ijk(i, j, grid.kstart);
                p[ijk - kk] = p[ijk];
                let ijk = grid.ijk(i, j, grid.kend - 1);
                p[ijk + kk] = p[ijk];
            }
        }

        self.output(fields, grid);
    }

    fn check_divergence(&self, fields: &Fields, grid: &Grid) -> f64 {
        let ii = 1;
        let jj = grid.icells;
        let kk = grid.ijcells;

        let dxi = grid.dxi;
        let dyi = grid.dyi;

        let (u, v, w) = (&fields.u.data, &fields.v.data, &fields.w.data);

        let mut divmax: f64 = 0.0;
        for k in grid.kstart..grid.kend {
            for j in grid.jstart..grid.jend {
                for i in grid.istart..grid.iend {
                    let ijk = i + j * jj + k * kk;
                    let div = (u[ijk + ii] - u[ijk]) * dxi
                        + (v[ijk + jj] - v[ijk]) * dyi
                        + (w[ijk + kk] - w[ijk]) * grid.dzi[k];
                    divmax = divmax.max(div.abs());
                }
            }
        }

        grid.get_max(divmax)
    }
}

/// Thomas algorithm. `gam[0]` is never read back, but zeroing it keeps the
/// workspace fully initialized.
pub(crate) fn tdma(
    a: &[f64],
    b: &[f64],
    c: &[f64],
    xin: &[f64],
    xout: &mut [f64],
    gam: &mut [f64],
) {
    let size = b.len();

    gam[0] = 0.0;
    let mut tmp = b[0];
    xout[0] = xin[0] / tmp;

    for k in 1..size {
        gam[k] = c[k - 1] / tmp;
        tmp = b[k] - a[k] * gam[k];
        xout[k] = (xin[k] - a[k] * xout[k - 1]) / tmp;
    }

    for k in (0..size - 1).rev() {
        xout[k] -= gam[k + 1] * xout[k + 1];
    }
}
