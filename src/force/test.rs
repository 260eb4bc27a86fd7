use {super::*, crate::parameters::GridParameters, approx::assert_abs_diff_eq};

fn uniform_grid(itot: usize, jtot: usize, ktot: usize, order: usize) -> Grid {
    Grid::new(&GridParameters {
        itot,
        jtot,
        ktot,
        xsize: itot as f64,
        ysize: jtot as f64,
        zsize: ktot as f64,
        spatial_order: order,
        ..GridParameters::default()
    })
    .unwrap()
}

fn scalar_fields(grid: &Grid) -> Fields {
    Fields::new(grid, &["s".to_string()]).unwrap()
}

/// Deterministic values in (-0.5, 0.5).
fn rnd(state: &mut u64) -> f64 {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    (*state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
}

fn force_params(f: impl FnOnce(&mut ForceParameters)) -> ForceParameters {
    let mut params = ForceParameters::default();
    f(&mut params);
    params
}

#[test]
fn uflux_controller_hits_target_in_one_step() {
    let grid = uniform_grid(8, 8, 8, 2);
    let mut fields = scalar_fields(&grid);
    fields.u.data.fill(5.0);

    let force = Force::new(
        &force_params(|p| {
            p.swlspres = "uflux".to_string();
            p.uflux = Some(10.0);
        }),
        &grid,
        &mut fields,
    )
    .unwrap();

    force.exec(&mut fields, &grid, 1.0);

    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                assert_abs_diff_eq!(fields.ut.data[grid.ijk(i, j, k)], 5.0, epsilon = 1.0e-12);
            }
        }
    }
}

#[test]
fn uflux_controller_is_dead_beat_on_a_random_state() {
    let grid = Grid::new(&GridParameters {
        itot: 8,
        jtot: 8,
        ktot: 8,
        xsize: 8.0,
        ysize: 8.0,
        zsize: 8.0,
        utrans: 0.3,
        ..GridParameters::default()
    })
    .unwrap();
    let mut fields = scalar_fields(&grid);

    let mut state = 42;
    for e in fields.u.data.iter_mut() {
        *e = rnd(&mut state);
    }
    for e in fields.ut.data.iter_mut() {
        *e = rnd(&mut state);
    }

    let uflux = 2.5;
    let dt = 0.2;
    let force = Force::new(
        &force_params(|p| {
            p.swlspres = "uflux".to_string();
            p.uflux = Some(uflux);
        }),
        &grid,
        &mut fields,
    )
    .unwrap();

    force.exec(&mut fields, &grid, dt);

    // Bulk mean of u + dt*ut plus the translation velocity equals the target.
    let mut bulk = 0.0;
    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                let ijk = grid.ijk(i, j, k);
                bulk += (fields.u.data[ijk] + dt * fields.ut.data[ijk]) * grid.dz[k];
            }
        }
    }
    bulk /= grid.itot as f64 * grid.jtot as f64 * grid.zsize;

    assert_abs_diff_eq!(bulk + grid.utrans, uflux, epsilon = 1.0e-12);
}

#[test]
fn geostrophically_balanced_state_feels_no_force() {
    let grid = uniform_grid(6, 6, 4, 2);
    let mut fields = scalar_fields(&grid);

    let ug: Vec<f64> = (0..grid.ktot).map(|k| 1.0 + 0.2 * k as f64).collect();
    let vg: Vec<f64> = (0..grid.ktot).map(|k| -0.5 + 0.1 * k as f64).collect();

    for k in grid.kstart..grid.kend {
        for j in 0..grid.jcells {
            for i in 0..grid.icells {
                fields.u.data[grid.ijk(i, j, k)] = ug[k - grid.kgc];
                fields.v.data[grid.ijk(i, j, k)] = vg[k - grid.kgc];
            }
        }
    }

    let mut force = Force::new(
        &force_params(|p| {
            p.swlspres = "geo".to_string();
            p.fc = Some(1.0e-4);
        }),
        &grid,
        &mut fields,
    )
    .unwrap();

    let mut params = Parameters::default();
    params.profiles.insert("ug".to_string(), ug);
    params.profiles.insert("vg".to_string(), vg);
    force.create(&params, &grid, &fields).unwrap();

    force.exec(&mut fields, &grid, 0.1);

    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                assert_abs_diff_eq!(fields.ut.data[grid.ijk(i, j, k)], 0.0, epsilon = 1.0e-13);
                assert_abs_diff_eq!(fields.vt.data[grid.ijk(i, j, k)], 0.0, epsilon = 1.0e-13);
            }
        }
    }
}

fn coriolis_skew_symmetry(order: usize) {
    let grid = uniform_grid(8, 8, 4, order);
    let mut fields = scalar_fields(&grid);

    let mut state = 7;
    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                fields.u.data[grid.ijk(i, j, k)] = rnd(&mut state);
                fields.v.data[grid.ijk(i, j, k)] = rnd(&mut state);
            }
        }
    }
    grid.boundary_cyclic(&mut fields.u.data);
    grid.boundary_cyclic(&mut fields.v.data);

    let mut force = Force::new(
        &force_params(|p| {
            p.swlspres = "geo".to_string();
            p.fc = Some(1.3);
        }),
        &grid,
        &mut fields,
    )
    .unwrap();

    let mut params = Parameters::default();
    params.profiles.insert("ug".to_string(), vec![0.0; grid.ktot]);
    params.profiles.insert("vg".to_string(), vec![0.0; grid.ktot]);
    force.create(&params, &grid, &fields).unwrap();

    force.exec(&mut fields, &grid, 0.1);

    // The interpolations to the opposite staggered points are discrete
    // adjoints, so the rotation does no net work on the periodic interior.
    let mut work = 0.0;
    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                let ijk = grid.ijk(i, j, k);
                work += fields.u.data[ijk] * fields.ut.data[ijk]
                    + fields.v.data[ijk] * fields.vt.data[ijk];
            }
        }
    }

    assert_abs_diff_eq!(work, 0.0, epsilon = 1.0e-10);
}

#[test]
fn coriolis_2nd_is_skew_symmetric() {
    coriolis_skew_symmetry(2);
}

#[test]
fn coriolis_4th_is_skew_symmetric() {
    coriolis_skew_symmetry(4);
}

#[test]
fn large_scale_source_adds_the_profile() {
    let grid = uniform_grid(4, 4, 4, 2);
    let mut fields = scalar_fields(&grid);
    fields.st.get_mut("s").unwrap().data.fill(0.7);

    let sls: Vec<f64> = (0..grid.ktot).map(|k| 1.0 + k as f64).collect();

    let mut force = Force::new(
        &force_params(|p| {
            p.swls = "1".to_string();
            p.lslist = vec!["s".to_string()];
        }),
        &grid,
        &mut fields,
    )
    .unwrap();

    let mut params = Parameters::default();
    params.profiles.insert("sls".to_string(), sls.clone());
    force.create(&params, &grid, &fields).unwrap();

    force.exec(&mut fields, &grid, 0.1);

    let st = &fields.st["s"].data;
    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                assert_abs_diff_eq!(
                    st[grid.ijk(i, j, k)],
                    0.7 + sls[k - grid.kgc],
                    epsilon = 1.0e-13
                );
            }
        }
    }
}

fn subsidence_tendency(wls_value: f64) -> (Grid, Fields) {
    let grid = uniform_grid(4, 4, 8, 2);
    let mut fields = scalar_fields(&grid);

    // Scalar equal to the cell height, so the mean gradient between two
    // levels is exactly the metric spacing.
    let s = fields.sp.get_mut("s").unwrap();
    for k in 0..grid.kcells {
        for j in 0..grid.jcells {
            for i in 0..grid.icells {
                s.data[grid.ijk(i, j, k)] = grid.z[k];
            }
        }
    }

    let mut force = Force::new(
        &force_params(|p| {
            p.swwls = "1".to_string();
        }),
        &grid,
        &mut fields,
    )
    .unwrap();

    let mut params = Parameters::default();
    params
        .profiles
        .insert("wls".to_string(), vec![wls_value; grid.ktot]);
    force.create(&params, &grid, &fields).unwrap();

    assert!(fields.mean_profiles_enabled());
    fields.update_means(&grid);
    force.exec(&mut fields, &grid, 0.1);

    (grid, fields)
}

#[test]
fn subsidence_downwind_of_positive_wls() {
    let (grid, fields) = subsidence_tendency(1.0);

    let st = &fields.st["s"].data;
    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                assert_abs_diff_eq!(st[grid.ijk(i, j, k)], -1.0, epsilon = 1.0e-12);
            }
        }
    }
}

#[test]
fn subsidence_downwind_of_negative_wls() {
    let (grid, fields) = subsidence_tendency(-1.0);

    let st = &fields.st["s"].data;
    for k in grid.kstart..grid.kend {
        for j in grid.jstart..grid.jend {
            for i in grid.istart..grid.iend {
                assert_abs_diff_eq!(st[grid.ijk(i, j, k)], 1.0, epsilon = 1.0e-12);
            }
        }
    }
}

fn timedep_force(grid: &Grid, fields: &mut Fields) -> Force {
    let mut force = Force::new(
        &force_params(|p| {
            p.swls = "1".to_string();
            p.lslist = vec!["s".to_string()];
            p.swtimedep = "1".to_string();
            p.timedeplist = vec!["s".to_string()];
        }),
        grid,
        fields,
    )
    .unwrap();

    let mut params = Parameters::default();
    params
        .profiles
        .insert("sls".to_string(), vec![0.0; grid.ktot]);
    params.timedep.time = vec![0.0, 10.0];
    let mut table = vec![0.0; grid.ktot];
    table.extend((0..grid.ktot).map(|k| k as f64));
    params.timedep.profiles.insert("sls".to_string(), table);
    force.create(&params, grid, fields).unwrap();

    force
}

#[test]
fn timedep_profiles_interpolate_linearly() {
    let grid = uniform_grid(4, 4, 4, 2);
    let mut fields = scalar_fields(&grid);
    let mut force = timedep_force(&grid, &mut fields);

    force.update_time_dep(2.5);

    let prof = &force.lsprofs["s"];
    for k in 0..grid.ktot {
        assert_abs_diff_eq!(prof[k + grid.kgc], 0.25 * k as f64, epsilon = 1.0e-13);
    }
}

#[test]
fn timedep_profiles_clamp_to_the_table_ends() {
    let grid = uniform_grid(4, 4, 4, 2);
    let mut fields = scalar_fields(&grid);
    let mut force = timedep_force(&grid, &mut fields);

    for t in [0.0, -5.0] {
        force.update_time_dep(t);
        let prof = &force.lsprofs["s"];
        for k in 0..grid.ktot {
            assert_abs_diff_eq!(prof[k + grid.kgc], 0.0, epsilon = 1.0e-13);
        }
    }

    for t in [10.0, 50.0] {
        force.update_time_dep(t);
        let prof = &force.lsprofs["s"];
        for k in 0..grid.ktot {
            assert_abs_diff_eq!(prof[k + grid.kgc], k as f64, epsilon = 1.0e-13);
        }
    }
}

#[test]
fn illegal_switches_are_counted() {
    let grid = uniform_grid(4, 4, 4, 2);
    let mut fields = scalar_fields(&grid);

    let err = Force::new(
        &force_params(|p| {
            p.swlspres = "bogus".to_string();
            p.swls = "2".to_string();
            p.swwls = "x".to_string();
        }),
        &grid,
        &mut fields,
    )
    .unwrap_err();

    match err {
        Error::Config { section, nerror } => {
            assert_eq!(section, "force");
            assert_eq!(nerror, 3);
        }
        _ => panic!("expected a configuration error"),
    }
}

#[test]
fn uflux_requires_a_target() {
    let grid = uniform_grid(4, 4, 4, 2);
    let mut fields = scalar_fields(&grid);

    let err = Force::new(
        &force_params(|p| {
            p.swlspres = "uflux".to_string();
        }),
        &grid,
        &mut fields,
    )
    .unwrap_err();

    assert!(matches!(err, Error::Config { nerror: 1, .. }));
}

#[test]
fn unknown_lslist_scalar_is_rejected() {
    let grid = uniform_grid(4, 4, 4, 2);
    let mut fields = scalar_fields(&grid);

    let mut force = Force::new(
        &force_params(|p| {
            p.swls = "1".to_string();
            p.lslist = vec!["q".to_string()];
        }),
        &grid,
        &mut fields,
    )
    .unwrap();

    // Unknown scalar plus its missing profile column.
    let err = force
        .create(&Parameters::default(), &grid, &fields)
        .unwrap_err();
    assert!(matches!(err, Error::Config { nerror: 2, .. }));
}

#[test]
fn timedep_table_must_match_the_time_axis() {
    let grid = uniform_grid(4, 4, 4, 2);
    let mut fields = scalar_fields(&grid);

    let mut force = Force::new(
        &force_params(|p| {
            p.swls = "1".to_string();
            p.lslist = vec!["s".to_string()];
            p.swtimedep = "1".to_string();
            p.timedeplist = vec!["s".to_string()];
        }),
        &grid,
        &mut fields,
    )
    .unwrap();

    let mut params = Parameters::default();
    params
        .profiles
        .insert("sls".to_string(), vec![0.0; grid.ktot]);
    params.timedep.time = vec![0.0, 10.0, 20.0];
    params
        .timedep
        .profiles
        .insert("sls".to_string(), vec![0.0; 2 * grid.ktot]);

    let err = force.create(&params, &grid, &fields).unwrap_err();
    assert!(matches!(err, Error::Config { nerror: 1, .. }));
}

#[test]
fn unmatched_timedeplist_entries_only_warn() {
    let grid = uniform_grid(4, 4, 4, 2);
    let mut fields = scalar_fields(&grid);

    let mut force = Force::new(
        &force_params(|p| {
            p.swls = "1".to_string();
            p.lslist = vec!["s".to_string()];
            p.swtimedep = "1".to_string();
            p.timedeplist = vec!["zz".to_string()];
        }),
        &grid,
        &mut fields,
    )
    .unwrap();

    let mut params = Parameters::default();
    params
        .profiles
        .insert("sls".to_string(), vec![0.0; grid.ktot]);
    force.create(&params, &grid, &fields).unwrap();
}
