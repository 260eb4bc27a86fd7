//! Real Fourier transforms for the pressure solvers.
//!
//! [`Rfft1d`] wraps a planned complex FFT pair into 1-D real transforms with
//! the half-complex storage order `[r0, r1, …, r(n/2), i((n+1)/2−1), …, i1]`.
//! With that ordering the index of a coefficient determines its wavenumber as
//! `min(k, n−k)`, which is what lets the solvers look up modified wavenumbers
//! through a mirrored table.
//!
//! [`Fft2d`] applies the 1-D transform along x and then along y over a
//! compact `itot × jtot × nlev` slab, mirroring the two network-crossing
//! transform passes of a decomposed run. The backward direction applies the
//! full `1/(itot·jtot)` normalization, so backward ∘ forward is the identity.

use {
    rayon::prelude::*,
    rustfft::{num_complex::Complex, Fft, FftPlanner},
    std::sync::Arc,
};

/// Planned forward/inverse pair of 1-D real transforms of fixed length.
///
/// Neither direction normalizes: a forward/inverse round trip scales the
/// signal by `n`, exactly like the FFTW R2HC/HC2R pair it stands in for.
#[derive(Clone)]
pub struct Rfft1d {
    n: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl Rfft1d {
    pub fn new(n: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            n,
            forward: planner.plan_fft_forward(n),
            inverse: planner.plan_fft_inverse(n),
        }
    }

    /// Physical to half-complex, in place.
    pub fn r2hc(&self, buf: &mut [f64]) {
        debug_assert_eq!(buf.len(), self.n);

        let mut c: Vec<Complex<f64>> = buf.iter().map(|&x| Complex::new(x, 0.0)).collect();
        self.forward.process(&mut c);

        buf[0] = c[0].re;
        for k in 1..=self.n / 2 {
            buf[k] = c[k].re;
        }
        for k in 1..(self.n + 1) / 2 {
            buf[self.n - k] = c[k].im;
        }
    }

    /// Half-complex to physical, in place. Scales by `n`.
    pub fn hc2r(&self, buf: &mut [f64]) {
        debug_assert_eq!(buf.len(), self.n);
        let n = self.n;

        let mut c = vec![Complex::new(0.0, 0.0); n];
        c[0] = Complex::new(buf[0], 0.0);
        for k in 1..(n + 1) / 2 {
            c[k] = Complex::new(buf[k], buf[n - k]);
            c[n - k] = c[k].conj();
        }
        if n % 2 == 0 && n > 1 {
            c[n / 2] = Complex::new(buf[n / 2], 0.0);
        }

        self.inverse.process(&mut c);

        for (x, e) in buf.iter_mut().zip(&c) {
            *x = e.re;
        }
    }
}

/// Two-pass 2-D real transform over a compact x-fastest slab.
pub struct Fft2d {
    itot: usize,
    jtot: usize,
    xfft: Rfft1d,
    yfft: Rfft1d,
}

impl Fft2d {
    pub fn new(itot: usize, jtot: usize) -> Self {
        Self {
            itot,
            jtot,
            xfft: Rfft1d::new(itot),
            yfft: Rfft1d::new(jtot),
        }
    }

    /// Forward transform along x for every (j, level) row, then along y for
    /// every (i, level) pencil. `data` holds whole `itot × jtot` planes
    /// contiguously; any number of vertical levels is accepted.
    pub fn forward(&self, data: &mut [f64]) {
        debug_assert_eq!(data.len() % (self.itot * self.jtot), 0);

        data.par_chunks_mut(self.itot)
            .for_each(|row| self.xfft.r2hc(row));

        if self.jtot > 1 {
            let (itot, jtot) = (self.itot, self.jtot);
            data.par_chunks_mut(itot * jtot).for_each(|plane| {
                let mut col = vec![0.0; jtot];
                for i in 0..itot {
                    for j in 0..jtot {
                        col[j] = plane[i + j * itot];
                    }
                    self.yfft.r2hc(&mut col);
                    for j in 0..jtot {
                        plane[i + j * itot] = col[j];
                    }
                }
            });
        }
    }

    /// Exact inverse of [`forward`](Self::forward), including the
    /// `1/(itot·jtot)` normalization.
    pub fn backward(&self, data: &mut [f64]) {
        debug_assert_eq!(data.len() % (self.itot * self.jtot), 0);

        if self.jtot > 1 {
            let (itot, jtot) = (self.itot, self.jtot);
            data.par_chunks_mut(itot * jtot).for_each(|plane| {
                let mut col = vec![0.0; jtot];
                for i in 0..itot {
                    for j in 0..jtot {
                        col[j] = plane[i + j * itot];
                    }
                    self.yfft.hc2r(&mut col);
                    for j in 0..jtot {
                        plane[i + j * itot] = col[j];
                    }
                }
            });
        }

        let norm = 1.0 / (self.itot * self.jtot) as f64;
        data.par_chunks_mut(self.itot).for_each(|row| {
            self.xfft.hc2r(row);
            for x in row.iter_mut() {
                *x *= norm;
            }
        });
    }
}

#[cfg(test)]
mod test {
    use {super::*, crate::utils::assert_approx_eq_slice, approx::assert_abs_diff_eq, std::f64::consts::PI};

    #[test]
    fn cosine_mode_lands_in_the_real_slot() {
        let n = 16;
        let fft = Rfft1d::new(n);
        let mut buf: Vec<f64> = (0..n)
            .map(|j| (2.0 * PI * 3.0 * j as f64 / n as f64).cos())
            .collect();
        fft.r2hc(&mut buf);

        for (k, &x) in buf.iter().enumerate() {
            let expected = if k == 3 { n as f64 / 2.0 } else { 0.0 };
            assert_abs_diff_eq!(x, expected, epsilon = 1.0E-12);
        }
    }

    #[test]
    fn sine_mode_lands_in_the_mirrored_slot() {
        let n = 16;
        let fft = Rfft1d::new(n);
        let mut buf: Vec<f64> = (0..n)
            .map(|j| (2.0 * PI * 2.0 * j as f64 / n as f64).sin())
            .collect();
        fft.r2hc(&mut buf);

        for (k, &x) in buf.iter().enumerate() {
            let expected = if k == n - 2 { -(n as f64) / 2.0 } else { 0.0 };
            assert_abs_diff_eq!(x, expected, epsilon = 1.0E-12);
        }
    }

    #[test]
    fn round_trip_scales_by_n() {
        // 24 = 2^3 * 3 exercises the mixed-radix path.
        let n = 24;
        let fft = Rfft1d::new(n);
        let orig: Vec<f64> = (0..n).map(|j| ((j * j + 3) % 17) as f64 - 8.0).collect();

        let mut buf = orig.clone();
        fft.r2hc(&mut buf);
        fft.hc2r(&mut buf);
        for x in buf.iter_mut() {
            *x /= n as f64;
        }

        assert_approx_eq_slice(&buf, &orig);
    }

    #[test]
    fn plane_round_trip_is_the_identity() {
        let (itot, jtot, nlev) = (8, 6, 2);
        let fft = Fft2d::new(itot, jtot);
        let orig: Vec<f64> = (0..itot * jtot * nlev)
            .map(|n| ((n * 7 + 1) % 23) as f64 - 11.0)
            .collect();

        let mut data = orig.clone();
        fft.forward(&mut data);
        fft.backward(&mut data);

        assert_approx_eq_slice(&data, &orig);
    }

    #[test]
    fn single_row_domain_skips_the_y_pass() {
        let (itot, jtot) = (16, 1);
        let fft = Fft2d::new(itot, jtot);
        let orig: Vec<f64> = (0..itot).map(|n| (n as f64 * 0.7).sin()).collect();

        let mut data = orig.clone();
        fft.forward(&mut data);
        fft.backward(&mut data);

        assert_approx_eq_slice(&data, &orig);
    }
}
