//! Pressure solvers enforcing the divergence-free constraint.
//!
//! Both variants follow the same direct method: assemble the Poisson
//! right-hand side from the provisional tendencies, transform it with the
//! 2-D real FFT, solve one banded system per horizontal wavenumber pair in
//! the vertical, transform back and subtract the pressure gradient from the
//! tendencies. The 2nd-order solver reduces the vertical operator to a
//! tridiagonal system, the 4th-order one to a heptadiagonal system with two
//! ghost rows per wall.


pub mod fourth;
pub mod second;

pub use {fourth::Pres4, second::Pres2};

use crate::{
    fields::Fields,
    grid::{Grid, SpatialOrder},
};

/// One projection step per call to [`exec`](Pres::exec); the solve is direct
/// and unconditional, so there is nothing to iterate or to fail.
pub trait Pres {
    /// Precompute the modified wavenumbers and the vertical operator
    /// coefficients. Must run once after construction, before `exec`.
    fn set_values(&mut self, grid: &Grid);

    /// Project the provisional tendencies onto the divergence-free space,
    /// leaving the pressure in `fields.p`.
    fn exec(&mut self, fields: &mut Fields, grid: &Grid, dt: f64);

    /// Advisory diagnostic: `max |∇·u|` over the interior.
    fn check_divergence(&self, fields: &Fields, grid: &Grid) -> f64;
}

/// Pick the solver matching the spatial order of the grid.
pub fn from_grid(grid: &Grid) -> Box<dyn Pres> {
    match grid.spatial_order {
        SpatialOrder::Second => Box::new(Pres2::new(grid)),
        SpatialOrder::Fourth => Box::new(Pres4::new(grid)),
    }
}
