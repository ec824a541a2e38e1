use crate::StrError;
use russell_lab::Vector;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the primary state of an incremental analysis
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FemState {
    /// Loading factor ℓ
    pub ell: f64,

    /// Primary unknowns {U}
    ///
    /// (neq_total)
    pub u: Vector,

    /// Cumulated (for one increment) primary unknowns {ΔU}
    ///
    /// (neq_total)
    pub ddu: Vector,
}

impl FemState {
    /// Allocates a new instance with zeroed vectors
    pub fn new(neq_total: usize) -> Result<Self, StrError> {
        if neq_total < 1 {
            return Err("neq_total must be ≥ 1");
        }
        Ok(FemState {
            ell: 0.0,
            u: Vector::new(neq_total),
            ddu: Vector::new(neq_total),
        })
    }

    /// Reads a JSON file containing the state
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(path).map_err(|_| "cannot open the state file")?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|_| "cannot parse the state file")
    }

    /// Writes a JSON file with the state
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create the directory for the state file")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create the state file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write the state file")?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
