use {serde::Deserialize, std::collections::BTreeMap};

/// Simulation parameters
#[derive(Debug, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub grid: GridParameters,
    pub fields: FieldsParameters,
    pub time: TimeParameters,
    pub force: ForceParameters,
    /// Vertical input columns of length `ktot`, keyed by profile name
    /// (`ug`, `vg`, `wls`, `<scalar>ls`).
    pub profiles: BTreeMap<String, Vec<f64>>,
    pub timedep: TimeDepParameters,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridParameters {
    /// Number of grid cells in x
    pub itot: usize,
    /// Number of grid cells in y (1 gives a two-dimensional run)
    pub jtot: usize,
    /// Number of grid cells in z
    pub ktot: usize,
    /// Domain size in x
    pub xsize: f64,
    /// Domain size in y
    pub ysize: f64,
    /// Domain size in z
    pub zsize: f64,
    /// Spatial order of the discretization (2 or 4)
    pub spatial_order: usize,
    /// Galilean translation velocity in x
    pub utrans: f64,
    /// Galilean translation velocity in y
    pub vtrans: f64,
    /// Cell-center heights, length `ktot`; uniform spacing when absent
    pub z: Option<Vec<f64>>,
}

impl Default for GridParameters {
    fn default() -> Self {
        GridParameters {
            itot: 32,
            jtot: 32,
            ktot: 32,
            xsize: 1.0,
            ysize: 1.0,
            zsize: 1.0,
            spatial_order: 2,
            utrans: 0.0,
            vtrans: 0.0,
            z: None,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldsParameters {
    /// Names of the prognostic scalars
    pub scalars: Vec<String>,
    /// Amplitude of the initial velocity perturbation
    pub rndamp: f64,
    /// Seed of the perturbation generator
    pub rndseed: u64,
}

impl Default for FieldsParameters {
    fn default() -> Self {
        FieldsParameters {
            scalars: vec!["s".to_string()],
            rndamp: 0.001,
            rndseed: 2,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimeParameters {
    /// Simulation time step size
    pub dt: f64,
    /// Total duration of the simulation
    pub endtime: f64,
}

impl Default for TimeParameters {
    fn default() -> Self {
        TimeParameters {
            dt: 0.025,
            endtime: 1.0,
        }
    }
}

/// The `[force]` section. The string switches are validated into tagged
/// modes by `Force::new`, which reports every illegal combination before
/// failing.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForceParameters {
    /// Large-scale pressure forcing: "0", "uflux" or "geo"
    pub swlspres: String,
    /// Target bulk streamwise velocity, required for swlspres = "uflux"
    pub uflux: Option<f64>,
    /// Coriolis parameter, required for swlspres = "geo"
    pub fc: Option<f64>,
    /// Large-scale scalar source profiles: "0" or "1"
    pub swls: String,
    /// Scalars receiving a large-scale source, required for swls = "1"
    pub lslist: Vec<String>,
    /// Large-scale subsidence advection: "0" or "1"
    pub swwls: String,
    /// Time-dependent large-scale profiles: "0" or "1"
    pub swtimedep: String,
    /// Scalars whose ls-profile varies in time
    pub timedeplist: Vec<String>,
}

impl Default for ForceParameters {
    fn default() -> Self {
        ForceParameters {
            swlspres: "0".to_string(),
            uflux: None,
            fc: None,
            swls: "0".to_string(),
            lslist: Vec::new(),
            swwls: "0".to_string(),
            swtimedep: "0".to_string(),
            timedeplist: Vec::new(),
        }
    }
}

/// Time-dependent profile tables. All profiles share the single monotone
/// `time` column; each table is a flattened row-major `[T × ktot]` matrix
/// keyed by the profile name.
#[derive(Debug, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct TimeDepParameters {
    pub time: Vec<f64>,
    pub profiles: BTreeMap<String, Vec<f64>>,
}
