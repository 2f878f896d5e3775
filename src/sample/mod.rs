use nalgebra::*;
use thiserror::Error;
use std::convert::TryFrom;

/// Side of the square digit images.
pub const SIDE : usize = 28;

/// Number of intensities in a flattened image.
pub const PIXELS : usize = SIDE * SIDE;

/// Number of digit labels (0 through 9).
pub const LABELS : usize = 10;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SampleError {

    #[error("Expected {expected} intensities but found {found}")]
    ShapeMismatch { expected : usize, found : usize },

    #[error("Intensity {value} at position {index} outside [0,1]")]
    Intensity { index : usize, value : f64 },

    #[error("Label {0} outside [0,9]")]
    Label(usize)

}

/// A flattened 28x28 grayscale image, where 1.0 is ink and 0.0 is background.
/// The intensities are held as a column vector, so the sample can be projected
/// by any basis with PIXELS columns. Shape and range are checked at construction,
/// which means every Sample is safe to project.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    px : DVector<f64>
}

impl Sample {

    pub fn new(px : Vec<f64>) -> Result<Self, SampleError> {
        if px.len() != PIXELS {
            return Err(SampleError::ShapeMismatch { expected : PIXELS, found : px.len() });
        }
        for (index, value) in px.iter().enumerate() {
            if !(*value >= 0.0 && *value <= 1.0) {
                return Err(SampleError::Intensity { index, value : *value });
            }
        }
        Ok(Self { px : DVector::from_vec(px) })
    }

    /// Builds a sample from 8-bit intensities (255 is full ink).
    pub fn from_intensities(px : &[u8]) -> Result<Self, SampleError> {
        if px.len() != PIXELS {
            return Err(SampleError::ShapeMismatch { expected : PIXELS, found : px.len() });
        }
        Ok(Self { px : DVector::from_iterator(PIXELS, px.iter().map(|p| *p as f64 / 255.) ) })
    }

    /// Sample with every pixel at the same intensity.
    pub fn constant(value : f64) -> Result<Self, SampleError> {
        Self::new(vec![value; PIXELS])
    }

    pub fn as_slice(&self) -> &[f64] {
        self.px.as_slice()
    }

    pub fn vector(&self) -> &DVector<f64> {
        &self.px
    }

    /// Quantizes the intensities back to bytes, rounding to the nearest level.
    pub fn to_intensities(&self) -> Vec<u8> {
        self.px.iter().map(|p| (p * 255. + 0.5) as u8 ).collect()
    }

}

impl TryFrom<Vec<f64>> for Sample {

    type Error = SampleError;

    fn try_from(px : Vec<f64>) -> Result<Self, SampleError> {
        Sample::new(px)
    }

}

/// An image paired with its digit label. The label is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub sample : Sample,
    pub label : usize
}

impl TrainingSample {

    pub fn new(sample : Sample, label : usize) -> Result<Self, SampleError> {
        if label >= LABELS {
            return Err(SampleError::Label(label));
        }
        Ok(Self { sample, label })
    }

}

/// Number of samples carrying each label.
pub fn label_counts(data : &[TrainingSample]) -> [usize; LABELS] {
    let mut counts = [0; LABELS];
    for s in data.iter() {
        counts[s.label] += 1;
    }
    counts
}
