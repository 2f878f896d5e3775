use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Serialize, Deserialize};
use std::cmp::Ordering;
use crate::sample::*;
use crate::codec::{self, DecodeError};
use crate::model::{self, Classifier, ClassifierError};

/// Number of templates kept per label.
pub const SAMPLE_COUNT : usize = 500;

/// Largest neighbourhood considered when choosing K.
pub const MAX_K : usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborsConfig {

    pub sample_count : usize,

    pub max_k : usize

}

impl Default for NeighborsConfig {

    fn default() -> Self {
        Self { sample_count : SAMPLE_COUNT, max_k : MAX_K }
    }

}

/// K-nearest-neighbour classifier. Keeps a random subset of each label's training
/// images (quantized to bytes) as templates and votes among the K templates closest
/// to the query in cosine distance. K itself is chosen to maximize hits over the
/// validation set.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbors {

    config : NeighborsConfig,

    templates : Vec<Vec<Vec<u8>>>,

    k : usize

}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NeighborsArchive {
    templates : Vec<Vec<Vec<u8>>>,
    k : usize
}

impl Default for Neighbors {

    fn default() -> Self {
        Self::new(NeighborsConfig::default())
    }

}

impl Neighbors {

    pub const NAME : &'static str = "neighbors";

    pub fn new(config : NeighborsConfig) -> Self {
        Self { config, templates : vec![Vec::new(); LABELS], k : 1 }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn templates(&self, label : usize) -> &[Vec<u8>] {
        &self.templates[label][..]
    }

    /// Labels of every template, nearest first.
    fn ranked_labels(&self, s : &Sample) -> Vec<usize> {
        let mut ranked : Vec<(f64, usize)> = self.templates.iter()
            .enumerate()
            .flat_map(|(label, tpls)| tpls.iter().map(move |t| (1.0 - cosine_similarity(s, t), label) ) )
            .collect();
        ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal) );
        ranked.into_iter().map(|(_, label)| label ).collect()
    }

    pub fn deserialize(d : &[u8]) -> Result<Self, ClassifierError> {
        let archive : NeighborsArchive = codec::decode(d)?;
        if archive.templates.len() != LABELS {
            return Err(DecodeError::Shape(format!("{} template sets, expected {}", archive.templates.len(), LABELS)).into());
        }
        if archive.templates.iter().flatten().any(|t| t.len() != PIXELS ) {
            return Err(DecodeError::Shape(format!("template without {} pixels", PIXELS)).into());
        }
        if archive.k == 0 {
            return Err(DecodeError::Value("k must be positive".into()).into());
        }
        let config = NeighborsConfig::default();
        Ok(Self { config, templates : archive.templates, k : archive.k })
    }

}

/// Cosine similarity between the sample and a byte template; zero when either has
/// no ink at all.
pub fn cosine_similarity(s : &Sample, template : &[u8]) -> f64 {
    let (mut dot, mut s_mag, mut t_mag) = (0.0, 0.0, 0.0);
    for (x, t) in s.as_slice().iter().zip(template.iter()) {
        let y = *t as f64 / 255.;
        dot += x * y;
        s_mag += x * x;
        t_mag += y * y;
    }
    if s_mag == 0.0 || t_mag == 0.0 {
        return 0.0;
    }
    dot / (s_mag * t_mag).sqrt()
}

/// Label with most votes; ties go to the lowest label.
fn majority(labels : &[usize]) -> usize {
    let mut votes = [0usize; LABELS];
    for l in labels.iter() {
        votes[*l] += 1;
    }
    let mut best = 0;
    for (label, v) in votes.iter().enumerate() {
        if *v > votes[best] {
            best = label;
        }
    }
    best
}

impl Classifier for Neighbors {

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn train(
        &mut self,
        data : &[TrainingSample],
        validation : &[TrainingSample],
        rng : &mut dyn RngCore
    ) -> Result<(), ClassifierError> {
        if self.config.max_k == 0 {
            return Err(ClassifierError::InvalidConfig("max_k must be positive".into()));
        }
        log::info!("Choosing samples...");
        let mut templates = vec![Vec::new(); LABELS];
        for (label, tpls) in templates.iter_mut().enumerate() {
            let mut all : Vec<Vec<u8>> = data.iter()
                .filter(|s| s.label == label )
                .map(|s| s.sample.to_intensities() )
                .collect();
            if all.is_empty() {
                return Err(ClassifierError::EmptyClass(label));
            }
            all.shuffle(rng);
            all.truncate(self.config.sample_count);
            *tpls = all;
        }

        log::info!("Selecting K value...");
        let candidate = Neighbors { config : self.config, templates, k : 1 };
        let mut k_scores = vec![0usize; self.config.max_k + 1];
        for s in validation.iter() {
            let ranked = candidate.ranked_labels(&s.sample);
            for k in 1..=self.config.max_k.min(ranked.len()) {
                if majority(&ranked[..k]) == s.label {
                    k_scores[k] += 1;
                }
            }
        }
        let mut best_k = 1;
        for k in 1..=self.config.max_k {
            if k_scores[k] > k_scores[best_k] {
                best_k = k;
            }
        }
        log::info!("For k={} score is {}/{}...", best_k, k_scores[best_k], validation.len());

        self.templates = candidate.templates;
        self.k = best_k;
        model::report_validation(&*self, validation);
        Ok(())
    }

    fn classify(&self, s : &Sample) -> usize {
        let ranked = self.ranked_labels(s);
        let k = self.k.min(ranked.len());
        majority(&ranked[..k])
    }

    fn serialize(&self) -> Result<Vec<u8>, ClassifierError> {
        let archive = NeighborsArchive { templates : self.templates.clone(), k : self.k };
        codec::encode(&archive).map_err(ClassifierError::Encode)
    }

}
