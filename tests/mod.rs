use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rayon::prelude::*;
use digits::*;
use digits::bayes::*;
use digits::model;

const EPS : f64 = 1E-6;

fn small_config() -> BayesConfig {
    BayesConfig { features : 4, eig_iterations : 30, cov_samples : 120, ..BayesConfig::default() }
}

/// Image with every pixel drawn uniformly from [lo, hi).
fn cluster_point<R : Rng>(rng : &mut R, lo : f64, hi : f64) -> Sample {
    Sample::new((0..PIXELS).map(|_| rng.gen_range(lo, hi) ).collect()).unwrap()
}

/// Near-duplicate striped images, a different stripe per label.
fn stripe_point<R : Rng>(rng : &mut R, label : usize) -> Sample {
    let px = (0..PIXELS).map(|i| {
        let noise = rng.gen_range(0.0, 1E-3);
        if i % 8 == label - 2 { 1.0 - noise } else { noise }
    }).collect();
    Sample::new(px).unwrap()
}

/// Two separable clusters (label 0 near blank images, label 1 near full-ink images),
/// plus a handful of near-duplicates for each remaining label.
fn clusters(rng : &mut StdRng, per_cluster : usize, per_stripe : usize) -> Vec<TrainingSample> {
    let mut data = Vec::new();
    for _ in 0..per_cluster {
        data.push(TrainingSample::new(cluster_point(rng, 0.0, 0.1), 0).unwrap());
        data.push(TrainingSample::new(cluster_point(rng, 0.9, 1.0), 1).unwrap());
    }
    for label in 2..LABELS {
        for _ in 0..per_stripe {
            data.push(TrainingSample::new(stripe_point(rng, label), label).unwrap());
        }
    }
    data
}

fn validation(rng : &mut StdRng, n : usize) -> Vec<TrainingSample> {
    (0..n).flat_map(|_| vec![
        TrainingSample::new(cluster_point(rng, 0.0, 0.1), 0).unwrap(),
        TrainingSample::new(cluster_point(rng, 0.9, 1.0), 1).unwrap()
    ]).collect()
}

fn trained(seed : u64) -> (Bayes, StdRng) {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = clusters(&mut rng, 60, 3);
    let valid = validation(&mut rng, 20);
    let mut bayes = Bayes::new(small_config());
    bayes.train(&data[..], &valid[..], &mut rng).unwrap();
    (bayes, rng)
}

#[test]
fn separable_clusters() {
    let (bayes, mut rng) = trained(1);
    let valid = validation(&mut rng, 50);
    assert!(model::accuracy(&bayes, &valid[..]) > 0.9);
    let fresh = cluster_point(&mut rng, 0.0, 0.1);
    assert_eq!(bayes.classify(&fresh), 0);
    let fresh = cluster_point(&mut rng, 0.9, 1.0);
    assert_eq!(bayes.classify(&fresh), 1);
}

#[test]
fn trained_state_shape() {
    let (bayes, _) = trained(2);
    assert_eq!(bayes.basis().shape(), (4, PIXELS));
    assert_eq!(bayes.classes().len(), LABELS);
    assert!(bayes.classes().iter().all(|c| c.len() == 4 ));
    assert_eq!(bayes.pooled().len(), 4);
    let gram = bayes.basis() * bayes.basis().transpose();
    assert!((gram - DMatrix::<f64>::identity(4, 4)).amax() < EPS);
}

#[test]
fn variances_stay_positive() {
    let (bayes, _) = trained(3);
    for g in bayes.classes().iter().flatten().chain(bayes.pooled().iter()) {
        assert!(g.variance > 0.0);
        assert!(g.variance.is_finite());
    }

    // Every image is identical, so every projected feature is constant.
    let mut rng = StdRng::seed_from_u64(4);
    let data : Vec<_> = (0..LABELS)
        .map(|l| TrainingSample::new(Sample::constant(0.5).unwrap(), l).unwrap() )
        .collect();
    let mut flat = Bayes::new(small_config());
    flat.train(&data[..], &[], &mut rng).unwrap();
    for g in flat.classes().iter().flatten().chain(flat.pooled().iter()) {
        assert_eq!(g.variance, flat.config().variance_floor);
    }
}

#[test]
fn labels_are_always_in_range() {
    let (bayes, mut rng) = trained(5);
    let mut probes = vec![
        Sample::constant(0.0).unwrap(),
        Sample::constant(1.0).unwrap(),
        Sample::constant(0.5).unwrap()
    ];
    probes.extend((0..20).map(|_| cluster_point(&mut rng, 0.0, 1.0) ));
    for p in probes.iter() {
        assert!(bayes.classify(p) < LABELS);
    }
}

#[test]
fn mid_gray_is_deterministic() {
    let (bayes, _) = trained(6);
    let gray = Sample::constant(0.5).unwrap();
    let first = bayes.classify(&gray);
    for _ in 0..20 {
        assert_eq!(bayes.classify(&gray), first);
    }
}

#[test]
fn archive_round_trip() {
    let (bayes, mut rng) = trained(7);
    let restored = Bayes::deserialize(&bayes.serialize().unwrap()[..]).unwrap();
    assert_eq!(restored.basis(), bayes.basis());
    assert_eq!(restored.classes(), bayes.classes());
    assert_eq!(restored.pooled(), bayes.pooled());
    let probes = validation(&mut rng, 20);
    for p in probes.iter() {
        assert_eq!(restored.classify(&p.sample), bayes.classify(&p.sample));
    }
}

#[test]
fn typed_archive_through_file() {
    let (bayes, mut rng) = trained(8);
    let path = std::env::temp_dir().join(format!("digits-bayes-{}.bin", std::process::id()));
    model::save_to_path(&bayes, &path).unwrap();
    let loaded = model::load_from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded.name(), "bayes");
    for p in validation(&mut rng, 10).iter() {
        assert_eq!(loaded.classify(&p.sample), bayes.classify(&p.sample));
    }
}

#[test]
fn concurrent_classification() {
    let (bayes, mut rng) = trained(9);
    let probes = validation(&mut rng, 50);
    let sequential : Vec<_> = probes.iter().map(|p| bayes.classify(&p.sample) ).collect();
    let parallel : Vec<_> = probes.par_iter().map(|p| bayes.classify(&p.sample) ).collect();
    assert_eq!(sequential, parallel);
}

#[test]
fn same_seed_same_model() {
    let (a, _) = trained(10);
    let (b, _) = trained(10);
    assert_eq!(a.basis(), b.basis());
    assert_eq!(a.classes(), b.classes());
}

/// Every label gets its own stripe of ink over a faint noisy background.
fn stripes(rng : &mut StdRng, per_label : usize) -> Vec<TrainingSample> {
    let mut data = Vec::new();
    for _ in 0..per_label {
        for label in 0..LABELS {
            let px = (0..PIXELS).map(|i| {
                if i % LABELS == label { rng.gen_range(0.9, 1.0) } else { rng.gen_range(0.0, 0.1) }
            }).collect();
            data.push(TrainingSample::new(Sample::new(px).unwrap(), label).unwrap());
        }
    }
    data
}

#[test]
fn classifiers_are_interchangeable() {
    let mut rng = StdRng::seed_from_u64(11);
    let data = stripes(&mut rng, 20);
    let valid = stripes(&mut rng, 5);
    for (name, desc) in model::classifiers().iter() {
        let mut c = (desc.construct)();
        if *name == Bayes::NAME {
            c = Box::new(Bayes::new(BayesConfig { features : LABELS, ..small_config() }));
        }
        c.train(&data[..], &valid[..], &mut rng).unwrap();
        assert!(model::accuracy(&*c, &valid[..]) > 0.9, "{} underperformed", name);
        let restored = model::load(&model::save(&*c).unwrap()[..]).unwrap();
        assert_eq!(restored.name(), *name);
        for p in valid.iter() {
            assert_eq!(restored.classify(&p.sample), c.classify(&p.sample));
        }
    }
}
