use structopt::*;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use anyhow::{self, Context};
use rand::SeedableRng;
use rand::rngs::StdRng;
use digits::model::{self, Classifier};
use digits::bayes::{Bayes, BayesConfig};
use digits::neighbors::{Neighbors, NeighborsConfig};
use digits::table;

/// Train, persist and evaluate handwritten digit classifiers
#[derive(StructOpt, Debug)]
pub enum Digits {

    /// Lists the available classifiers
    List,

    /// Trains a classifier and writes its archive to output.
    Train {

        classifier : String,

        output : PathBuf,

        /// Labelled training images (CSV: label followed by 784 intensities in [0,255])
        #[structopt(short, long)]
        data : PathBuf,

        /// Labelled images used to report accuracy (and to choose hyperparameters)
        #[structopt(short, long)]
        validation : PathBuf,

        /// Seed for reproducible training; drawn from entropy when absent
        #[structopt(short, long)]
        seed : Option<u64>,

        /// JSON file with classifier hyperparameters
        #[structopt(short, long)]
        config : Option<PathBuf>
    },

    /// Classifies every image of a labelled table and reports the accuracy.
    Classify {

        model : PathBuf,

        data : PathBuf,

        /// Print the predicted label of every image
        #[structopt(short, long)]
        labels : bool
    }

}

fn load_config<T>(path : &Path) -> anyhow::Result<T>
where
    T : serde::de::DeserializeOwned
{
    let f = File::open(path).with_context(|| format!("Could not open config {}", path.display()) )?;
    let cfg = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("Invalid config {}", path.display()) )?;
    Ok(cfg)
}

fn build_classifier(name : &str, config : &Option<PathBuf>) -> anyhow::Result<Box<dyn Classifier>> {
    match (name, config) {
        (_, None) => Ok(model::construct(name)?),
        (Bayes::NAME, Some(path)) => {
            let cfg : BayesConfig = load_config(path)?;
            Ok(Box::new(Bayes::new(cfg)))
        },
        (Neighbors::NAME, Some(path)) => {
            let cfg : NeighborsConfig = load_config(path)?;
            Ok(Box::new(Neighbors::new(cfg)))
        },
        (other, Some(_)) => Err(model::ClassifierError::UnknownClassifier(other.to_string()).into())
    }
}

fn print_classifiers() {
    println!("Available classifiers:");
    for (name, desc) in model::classifiers().iter() {
        println!(" {} - {}", name, desc.desc);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match Digits::from_args() {
        Digits::List => {
            print_classifiers();
            Ok(())
        },
        Digits::Train { classifier, output, data, validation, seed, config } => {
            let mut classifier = build_classifier(&classifier, &config)?;
            let data = table::open(&data)
                .with_context(|| format!("Could not load training data {}", data.display()) )?;
            let validation = table::open(&validation)
                .with_context(|| format!("Could not load validation data {}", validation.display()) )?;
            log::info!("Loaded {} training and {} validation images", data.len(), validation.len());
            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy()
            };
            classifier.train(&data[..], &validation[..], &mut rng)?;
            model::save_to_path(&*classifier, &output)
                .with_context(|| format!("Failed to save {}", output.display()) )?;
            Ok(())
        },
        Digits::Classify { model : model_path, data, labels } => {
            let classifier = model::load_from_path(&model_path)
                .with_context(|| format!("Could not load model {}", model_path.display()) )?;
            let data = table::open(&data)
                .with_context(|| format!("Could not load images {}", data.display()) )?;
            if labels {
                for s in data.iter() {
                    println!("{}", classifier.classify(&s.sample));
                }
            }
            let hits = model::correct(&*classifier, &data[..]);
            let fraction = if data.is_empty() { 0.0 } else { hits as f64 / data.len() as f64 };
            println!("Got {}/{} ({:.4})", hits, data.len(), fraction);
            Ok(())
        }
    }
}
