//! Dataviews in a temporary workspace, scored by a randomly initialised
//! sequence model that is checkpointed and reloaded from safetensors.

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use lipread::config::{DecodeConfig, DecodeStrategy, ModelConfig, RnnType};
use lipread::dataview::{Example, batches, load_tier, tier_stats};
use lipread::evaluate::evaluate_examples;
use lipread::model::{BestCheckpoint, LipReader};
use lipread::recognize::Recognizer;
use lipread::vision::{FaceBox, Landmarks, mean_shape};
use lipread::{DatasetTier, Workspace};
use tempfile::TempDir;

fn example(id: &str, transcript: &str, frames: usize) -> Example {
    Example {
        id: id.to_string(),
        transcript: transcript.to_string(),
        fps: 25,
        faces: vec![FaceBox::new(20.0, 20.0, 80.0, 80.0); frames],
        landmarks: vec![mean_shape().denormalized(&FaceBox::new(20.0, 20.0, 80.0, 80.0)); frames],
    }
}

fn workspace() -> (TempDir, Workspace) {
    let dir = TempDir::new().unwrap();
    let workspace = Workspace::new(dir.path());
    workspace.ensure_layout().unwrap();
    for (tier, ex) in [
        (DatasetTier::Nano, example("s1_bbaf2n", "bin blue at f two now", 6)),
        (DatasetTier::Nano, example("s1_lgaz8p", "lay green at z eight please", 4)),
        (DatasetTier::Micro, example("s2_pria3s", "place red in a three soon", 5)),
    ] {
        ex.save(&workspace.dataview_dir(tier)).unwrap();
    }
    (dir, workspace)
}

fn small_model() -> ModelConfig {
    ModelConfig {
        rnn_type: RnnType::Gru,
        hidden_size: 16,
        ..ModelConfig::default()
    }
}

#[test]
fn tiers_are_counted_and_all_spans_them() {
    let (_dir, workspace) = workspace();
    let stats = tier_stats(&workspace).unwrap();

    let nano = stats.iter().find(|s| s.tier == DatasetTier::Nano).unwrap();
    assert_eq!((nano.examples, nano.frames), (2, 10));
    let all = stats.iter().find(|s| s.tier == DatasetTier::All).unwrap();
    assert_eq!((all.examples, all.frames), (3, 15));

    assert_eq!(load_tier(&workspace, DatasetTier::All).unwrap().len(), 3);
    assert!(load_tier(&workspace, DatasetTier::Large).unwrap().is_empty());
}

#[test]
fn examples_batch_with_their_lengths() {
    let (_dir, workspace) = workspace();
    let examples = load_tier(&workspace, DatasetTier::All).unwrap();
    let batches = batches(&examples, 2, true).unwrap();
    assert_eq!(batches.len(), 2);
    // nano files first, in name order, then micro
    assert_eq!(batches[0].lengths, vec![6, 4]);
    assert_eq!(batches[0].max_len, 6);
    assert_eq!(batches[0].feature_dim, Landmarks::feature_dim(true));
    assert_eq!(batches[1].lengths, vec![5]);
    assert_eq!(batches[1].ids, vec!["s2_pria3s".to_string()]);
}

#[test]
fn random_model_scores_every_example() {
    let (_dir, workspace) = workspace();
    let examples = load_tier(&workspace, DatasetTier::Nano).unwrap();

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let reader = LipReader::new(
        &small_model(),
        DecodeConfig::default(),
        Landmarks::feature_dim(false),
        vb,
    )
    .unwrap();

    let report = evaluate_examples(&examples, &reader, None, false);
    assert_eq!(report.scores.len(), 2);
    assert!(report.failures.is_empty());
    for score in &report.scores {
        assert!((0.0..=1.0).contains(&score.confidence));
        assert!(score.cer.is_finite());
    }
    assert_eq!(report.words.reference_len, 12);
}

#[test]
fn checkpoint_reloads_to_the_same_hypotheses() {
    let (dir, workspace) = workspace();
    let examples = load_tier(&workspace, DatasetTier::Nano).unwrap();
    let features = examples[0].features(false);

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let decode = DecodeConfig {
        strategy: DecodeStrategy::CtcBeam,
        beam_width: 4,
        ..DecodeConfig::default()
    };
    let reader = LipReader::new(&small_model(), decode.clone(), Landmarks::feature_dim(false), vb)
        .unwrap();
    let before = reader.recognize(&features).unwrap();

    let path = dir.path().join("weights").join("run1").join("lipreader.safetensors");
    let mut checkpoint = BestCheckpoint::new(&path);
    assert!(checkpoint.report(0.8, &varmap).unwrap());
    assert!(!checkpoint.report(0.8, &varmap).unwrap());
    assert!(path.is_file());

    let reloaded =
        LipReader::load(&path, &small_model(), decode, Landmarks::feature_dim(false)).unwrap();
    let after = reloaded.recognize(&features).unwrap();
    assert_eq!(before.text, after.text);
    assert!((before.confidence - after.confidence).abs() < 1e-5);
}
