use {
    anyhow::Result,
    clap::Parser,
    log::{error, info},
    simplelog::{ColorChoice, Config as LogConfig, LevelFilter, TermLogger, TerminalMode},
    std::{fs::File, path::PathBuf},
    stratus::{
        error::Error,
        fields::Fields,
        force::Force,
        grid::Grid,
        parameters::Parameters,
        pres::{self, Pres},
    },
};

/// Pressure-projection and momentum-forcing core of an incompressible
/// rotating-flow solver on a structured staggered grid.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to the file containing the simulation parameters.
    #[arg(short, long)]
    parameters: PathBuf,
}

#[quit::main]
fn main() {
    let args = Args::parse();

    TermLogger::init(
        LevelFilter::Debug,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("Failed to initialize logger");

    let params = {
        let file = File::open(&args.parameters).unwrap_or_else(|e| {
            error!("Failed to open {}: \"{}\"", args.parameters.display(), e);
            quit::with_code(1);
        });

        let params = serde_yaml::from_reader::<_, Parameters>(file).unwrap_or_else(|e| {
            error!(
                "Failed to parse parameters from {}: \"{}\"",
                args.parameters.display(),
                e
            );
            quit::with_code(1);
        });

        info!(
            "Loaded simulation parameters from \"{}\"",
            args.parameters.display()
        );

        params
    };

    run(&params).unwrap_or_else(|e| {
        error!("Error: \"{}\"", e);
        quit::with_code(1);
    });
}

fn run(params: &Parameters) -> Result<()> {
    let grid = Grid::new(&params.grid)?;
    let mut fields = Fields::new(&grid, &params.fields.scalars)?;

    let mut force = Force::new(&params.force, &grid, &mut fields)?;
    force.create(params, &grid, &fields)?;

    let mut pres = pres::from_grid(&grid);
    pres.set_values(&grid);

    init_fields(&mut fields, &grid, params);
    boundary(&mut fields, &grid);

    let dt = params.time.dt;
    let mut t = 0.0;
    let mut step = 0u64;

    info!(
        "Starting time loop: dt = {}, endtime = {}",
        dt, params.time.endtime
    );

    while t < params.time.endtime {
        fields.clear_tendencies();
        fields.update_means(&grid);
        force.update_time_dep(t);
        force.exec(&mut fields, &grid, dt);
        pres.exec(&mut fields, &grid, dt);

        euler_step(&mut fields, dt);
        boundary(&mut fields, &grid);

        t += dt;
        step += 1;

        let divmax = pres.check_divergence(&fields, &grid);
        if !divmax.is_finite() {
            return Err(Error::Numerics(format!(
                "divergence is no longer finite at step {}",
                step
            ))
            .into());
        }
        info!("step {:5}, t = {:9.4}, divmax = {:13.6E}", step, t, divmax);
    }

    let mut bulk = 0.0;
    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                bulk += fields.u.data[grid.ijk(i, j, k)] * grid.dz[k];
            }
        }
    }
    bulk /= grid.itot as f64 * grid.jtot as f64 * grid.zsize;
    info!("Finished: bulk u = {}", bulk + grid.utrans);

    Ok(())
}

/// Deterministic values in (-0.5, 0.5).
fn rnd(state: &mut u64) -> f64 {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    (*state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
}

/// Height-linear scalar profiles and a reproducible perturbation on the
/// velocities. The interior w faces are de-meaned per level so no net mass
/// crosses any face.
fn init_fields(fields: &mut Fields, grid: &Grid, params: &Parameters) {
    let mut state = params.fields.rndseed | 1;
    let amp = params.fields.rndamp;

    for f in [&mut fields.u, &mut fields.v] {
        for k in grid.kstart..grid.kend {
            for j in grid.jstart..grid.jend {
                for i in grid.istart..grid.iend {
                    f.data[grid.ijk(i, j, k)] = amp * rnd(&mut state);
                }
            }
        }
    }

    for k in grid.kstart + 1..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                fields.w.data[grid.ijk(i, j, k)] = amp * rnd(&mut state);
            }
        }
        let mut mean = 0.0;
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                mean += fields.w.data[grid.ijk(i, j, k)];
            }
        }
        mean /= (grid.itot * grid.jtot) as f64;
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                fields.w.data[grid.ijk(i, j, k)] -= mean;
            }
        }
    }

    for s in fields.sp.values_mut() {
        for k in grid.kstart..grid.kend {
            for j in grid.jstart..grid.jend {
                for i in grid.istart..grid.iend {
                    s.data[grid.ijk(i, j, k)] = grid.z[k] / grid.zsize + amp * rnd(&mut state);
                }
            }
        }
    }
}

/// The boundary scheme in its simplest form: cyclic halos, no-penetration
/// walls with mirrored w ghosts, zero-gradient ghost levels elsewhere.
fn boundary(fields: &mut Fields, grid: &Grid) {
    grid.boundary_cyclic(&mut fields.u.data);
    grid.boundary_cyclic(&mut fields.v.data);
    grid.boundary_cyclic(&mut fields.w.data);
    for s in fields.sp.values_mut() {
        grid.boundary_cyclic(&mut s.data);
    }

    let kk = grid.ijcells;
    for j in 0..grid.jcells {
        for i in 0..grid.icells {
            let bot = grid.ijk(i, j, grid.kstart);
            let top = grid.ijk(i, j, grid.kend);
            fields.w.data[bot] = 0.0;
            fields.w.data[top] = 0.0;
            for g in 1..=grid.kgc {
                fields.w.data[bot - g * kk] = -fields.w.data[bot + g * kk];
            }
            // One ghost face fits above the top wall.
            for g in 1..grid.kgc {
                fields.w.data[top + g * kk] = -fields.w.data[top - g * kk];
            }
        }
    }

    let Fields { u, v, sp, .. } = fields;
    for f in [u, v].into_iter().chain(sp.values_mut()) {
        for j in 0..grid.jcells {
            for i in 0..grid.icells {
                let bot = grid.ijk(i, j, grid.kstart);
                let top = grid.ijk(i, j, grid.kend - 1);
                for g in 1..=grid.kgc {
                    f.data[bot - g * kk] = f.data[bot];
                    f.data[top + g * kk] = f.data[top];
                }
            }
        }
    }
}

fn euler_step(fields: &mut Fields, dt: f64) {
    let Fields {
        u, v, w, ut, vt, wt, sp, st, ..
    } = fields;

    for (x, t) in [(u, ut), (v, vt), (w, wt)] {
        for (xv, tv) in x.data.iter_mut().zip(&t.data) {
            *xv += dt * *tv;
        }
    }

    for (name, s) in sp.iter_mut() {
        if let Some(ts) = st.get(name) {
            for (xv, tv) in s.data.iter_mut().zip(&ts.data) {
                *xv += dt * *tv;
            }
        }
    }
}
