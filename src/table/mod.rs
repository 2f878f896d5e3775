use std::fs::File;
use std::path::Path;
use std::convert::AsRef;
use std::io::{self, BufReader};
use thiserror::Error;
use crate::sample::*;

pub mod csv;

#[derive(Debug, Error)]
pub enum TableError {

    #[error("Could not open table: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Field at row {row}, column {column} is not a valid number")]
    Parse { row : usize, column : usize },

    #[error("Invalid sample at row {row}: {source}")]
    Sample { row : usize, source : SampleError }

}

/// Loads a labelled digit table, one image per line (label followed by
/// PIXELS intensities in [0,255]), with an optional header line.
pub fn open<P>(path : P) -> Result<Vec<TrainingSample>, TableError>
where
    P : AsRef<Path>
{
    let f = File::open(path)?;
    csv::parse_samples(BufReader::new(f))
}
