use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::convert::AsRef;
use rand::RngCore;
use thiserror::Error;
use crate::sample::*;
use crate::codec::DecodeError;
use crate::bayes::Bayes;
use crate::neighbors::Neighbors;

#[derive(Debug, Error)]
pub enum ClassifierError {

    #[error("No training samples carry label {0}")]
    EmptyClass(usize),

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error("Could not decode classifier: {0}")]
    Decode(#[from] DecodeError),

    #[error("Could not encode classifier: {0}")]
    Encode(#[source] io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown classifier '{0}'")]
    UnknownClassifier(String),

    #[error("Could not access classifier file: {0}")]
    Io(#[source] io::Error)

}

/// Contract shared by every digit classifier, so callers (the trainer binary or any
/// inference host) can be polymorphic over which algorithm sits behind it.
///
/// Training replaces the whole learned state or, on error, leaves it untouched.
/// Classification only reads the learned state, so a trained classifier can be shared
/// across threads and queried concurrently.
pub trait Classifier
where
    Self : Debug + Send + Sync
{

    /// Registry key under which this classifier is constructed and deserialized.
    fn name(&self) -> &'static str;

    /// Learns from data. The validation set is only used for reporting (and for
    /// hyperparameter selection by classifiers that need it).
    fn train(
        &mut self,
        data : &[TrainingSample],
        validation : &[TrainingSample],
        rng : &mut dyn RngCore
    ) -> Result<(), ClassifierError>;

    /// Returns the predicted label, always in [0, LABELS).
    fn classify(&self, s : &Sample) -> usize;

    /// Untyped archive of the learned state. See save(.) for an archive
    /// that remembers which classifier wrote it.
    fn serialize(&self) -> Result<Vec<u8>, ClassifierError>;

}

/// Fraction of the set classified correctly (zero for an empty set).
pub fn accuracy(classifier : &dyn Classifier, set : &[TrainingSample]) -> f64 {
    if set.is_empty() {
        return 0.0;
    }
    correct(classifier, set) as f64 / set.len() as f64
}

pub fn correct(classifier : &dyn Classifier, set : &[TrainingSample]) -> usize {
    set.iter().filter(|s| classifier.classify(&s.sample) == s.label ).count()
}

/// Classifies raw intensities coming from outside the crate (a file, a drawing
/// canvas), rejecting input of the wrong shape before it reaches the classifier.
pub fn classify_pixels(classifier : &dyn Classifier, px : Vec<f64>) -> Result<usize, ClassifierError> {
    let s = Sample::new(px)?;
    Ok(classifier.classify(&s))
}

/// Logs how many validation samples the freshly-trained classifier got right.
pub(crate) fn report_validation(classifier : &dyn Classifier, validation : &[TrainingSample]) {
    log::info!("Running cross validation...");
    let hits = correct(classifier, validation);
    log::info!("Got {}/{}", hits, validation.len());
}

/// Plain-text description of a classifier, and the functions that
/// build it either untrained or from its archive.
#[derive(Clone, Copy)]
pub struct ClassifierDesc {

    pub desc : &'static str,

    pub construct : fn() -> Box<dyn Classifier>,

    pub deserialize : fn(&[u8]) -> Result<Box<dyn Classifier>, ClassifierError>

}

/// All available classifiers, by registry key.
pub fn classifiers() -> BTreeMap<&'static str, ClassifierDesc> {
    let mut reg = BTreeMap::new();
    reg.insert(Bayes::NAME, ClassifierDesc {
        desc : "PCA-reduced naive bayes classification",
        construct : || Box::new(Bayes::default()),
        deserialize : |d| Ok(Box::new(Bayes::deserialize(d)?))
    });
    reg.insert(Neighbors::NAME, ClassifierDesc {
        desc : "K-nearest neighbors",
        construct : || Box::new(Neighbors::default()),
        deserialize : |d| Ok(Box::new(Neighbors::deserialize(d)?))
    });
    reg
}

pub fn construct(name : &str) -> Result<Box<dyn Classifier>, ClassifierError> {
    classifiers().get(name)
        .map(|desc| (desc.construct)() )
        .ok_or_else(|| ClassifierError::UnknownClassifier(name.to_string()) )
}

/// Typed archive: a length byte and the registry key of the classifier, followed
/// by the classifier's own archive.
pub fn save(classifier : &dyn Classifier) -> Result<Vec<u8>, ClassifierError> {
    let name = classifier.name().as_bytes();
    assert!(name.len() <= u8::max_value() as usize);
    let payload = classifier.serialize()?;
    let mut out = Vec::with_capacity(1 + name.len() + payload.len());
    out.push(name.len() as u8);
    out.extend_from_slice(name);
    out.extend_from_slice(&payload[..]);
    Ok(out)
}

/// Reads an archive written by save(.), dispatching to the deserializer of whichever
/// classifier wrote it.
pub fn load(data : &[u8]) -> Result<Box<dyn Classifier>, ClassifierError> {
    let (len, rest) = data.split_first().ok_or(DecodeError::Truncated)?;
    let len = *len as usize;
    if rest.len() < len {
        return Err(DecodeError::Truncated.into());
    }
    let name = std::str::from_utf8(&rest[..len])
        .map_err(|_| DecodeError::UnknownType(String::from_utf8_lossy(&rest[..len]).to_string()) )?;
    let desc = classifiers().get(name).copied()
        .ok_or_else(|| DecodeError::UnknownType(name.to_string()) )?;
    (desc.deserialize)(&rest[len..])
}

pub fn save_to_path<P>(classifier : &dyn Classifier, path : P) -> Result<(), ClassifierError>
where
    P : AsRef<Path>
{
    let data = save(classifier)?;
    let mut f = File::create(path).map_err(ClassifierError::Io)?;
    f.write_all(&data[..]).map_err(ClassifierError::Io)?;
    Ok(())
}

pub fn load_from_path<P>(path : P) -> Result<Box<dyn Classifier>, ClassifierError>
where
    P : AsRef<Path>
{
    let mut f = File::open(path).map_err(ClassifierError::Io)?;
    let mut data = Vec::new();
    f.read_to_end(&mut data).map_err(ClassifierError::Io)?;
    load(&data[..])
}
