use ::csv;
use std::io::Read;
use crate::sample::*;
use super::TableError;

/// Digit tables might carry a header line ("label,1x1,1x2,...") or start
/// straight with data. The csv crate treats the first row as a header by default,
/// so we read without headers and skip the first record when its label
/// field is not a number.
fn is_header(record : &csv::StringRecord) -> bool {
    match record.get(0) {
        Some(field) => field.trim().parse::<usize>().is_err(),
        None => false
    }
}

/// Parses one record as a label followed by PIXELS intensities in [0,255].
/// The row index is one-based relative to the file, for error reporting.
pub fn parse_record(record : &csv::StringRecord, row : usize) -> Result<TrainingSample, TableError> {
    if record.len() != PIXELS + 1 {
        return Err(TableError::Sample {
            row,
            source : SampleError::ShapeMismatch { expected : PIXELS, found : record.len().saturating_sub(1) }
        });
    }
    let label = record[0].trim().parse::<usize>()
        .map_err(|_| TableError::Parse { row, column : 0 })?;
    let mut px = Vec::with_capacity(PIXELS);
    for (column, field) in record.iter().enumerate().skip(1) {
        let p = field.trim().parse::<u8>()
            .map_err(|_| TableError::Parse { row, column })?;
        px.push(p);
    }
    let sample = Sample::from_intensities(&px[..])
        .map_err(|source| TableError::Sample { row, source })?;
    TrainingSample::new(sample, label)
        .map_err(|source| TableError::Sample { row, source })
}

/// Reads every labelled image from the CSV content behind the reader.
pub fn parse_samples<R>(reader : R) -> Result<Vec<TrainingSample>, TableError>
where
    R : Read
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut samples = Vec::new();
    for (ix, row_record) in csv_reader.records().enumerate() {
        let record = row_record?;
        if ix == 0 && is_header(&record) {
            continue;
        }
        samples.push(parse_record(&record, ix + 1)?);
    }
    Ok(samples)
}
