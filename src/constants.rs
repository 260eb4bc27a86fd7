//! Coefficients of the 4th-order staggered finite-difference scheme.
//!
//! `CI*` interpolate a staggered quantity to the opposite staggered location
//! with a 4-point stencil, `CG*` form the staggered first derivative whose
//! effective spacing carries the factor `CGI`. The vertical metric arrays on
//! [`crate::grid::Grid`] fold `CGI` into `dzi4`/`dzhi4`, so vertical
//! derivatives multiply the `CG*` sum by the metric alone.

pub const CI0: f64 = -1.0 / 16.0;
pub const CI1: f64 = 9.0 / 16.0;
pub const CI2: f64 = 9.0 / 16.0;
pub const CI3: f64 = -1.0 / 16.0;

pub const CG0: f64 = 1.0;
pub const CG1: f64 = -27.0;
pub const CG2: f64 = 27.0;
pub const CG3: f64 = -1.0;
pub const CGI: f64 = 1.0 / 24.0;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn interpolation_weights_are_a_partition_of_unity() {
        assert_eq!(CI0 + CI1 + CI2 + CI3, 1.0);
    }

    #[test]
    fn gradient_weights_annihilate_constants() {
        assert_eq!(CG0 + CG1 + CG2 + CG3, 0.0);
        // Unit-slope linear field on a unit-spaced staggered grid: stencil
        // offsets are -3/2, -1/2, 1/2, 3/2.
        let d = (CG0 * -1.5 + CG1 * -0.5 + CG2 * 0.5 + CG3 * 1.5) * CGI;
        assert!((d - 1.0).abs() < 1.0e-15);
    }
}
