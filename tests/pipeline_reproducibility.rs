// End-to-end runs of both pipelines into temporary directories.
// Two runs with the same seed must leave identical artifacts.

use std::fs;
use std::path::Path;

use clinic_trainer::application::{
    train_tabular_use_case::{TabularTrainConfig, TrainTabularUseCase},
    train_text_use_case::{TextTrainConfig, TrainTextUseCase},
};
use clinic_trainer::data::{assembler::assemble_text, vocabulary::Vocabulary};
use clinic_trainer::domain::example::{LabeledTextExample, TriageLabel};
use clinic_trainer::infra::exporter::ExportMode;
use clinic_trainer::ml::trainer::FitConfig;
use rstest::rstest;
use serde_json::Value;
use tempfile::tempdir;

const TRIAGE: &str = r#"[
  {"text": "Severe chest pain radiating to the left arm", "label": "Urgent"},
  {"text": "Requesting a repeat prescription for inhaler", "label": "Routine"},
  {"text": "Slight rash, watch for spreading",             "label": "Monitor"},
  {"text": "Heavy bleeding that will not stop",            "label": "Urgent"},
  {"text": "Book the yearly blood test",                   "label": "Routine"},
  {"text": "Occasional dizziness when standing up",        "label": "Monitor"},
  {"text": "Not breathing properly, lips turning blue",    "label": "Urgent"},
  {"text": "Update contact details and address",           "label": "Routine"}
]"#;

const SURVEY: &str = "\
Age,Gender,family_history,benefits,remote_work,treatment
29,Male,No,Yes,No,No
35,female,Yes,Don't know,Yes,Yes
17,Male,No,No,No,No
41,F,Yes,Yes,,Yes
52,Trans-female,No,No,Yes,No
23,m,Yes,Don't know,No,Yes
38,Woman,No,Yes,Yes,No
200,Male,Yes,Yes,Yes,Yes
27,Male,Yes,No,No,Yes
";

fn read(dir: &Path, file: &str) -> Vec<u8> {
    fs::read(dir.join(file)).unwrap_or_else(|e| panic!("cannot read {file}: {e}"))
}

fn text_run(root: &Path, name: &str, mode: ExportMode) -> std::path::PathBuf {
    let dataset = root.join("triage.json");
    if !dataset.exists() {
        fs::write(&dataset, TRIAGE).unwrap();
    }
    let cfg = TextTrainConfig {
        dataset,
        output_dir:  root.join(name),
        fit:         FitConfig { epochs: 3, ..FitConfig::text() },
        export_mode: mode,
        ..TextTrainConfig::default()
    };
    let report = TrainTextUseCase::new(cfg.clone()).execute().unwrap();
    assert!(report.is_complete());
    cfg.output_dir
}

fn tabular_run(root: &Path, name: &str) -> std::path::PathBuf {
    let dataset = root.join("survey.csv");
    if !dataset.exists() {
        fs::write(&dataset, SURVEY).unwrap();
    }
    let cfg = TabularTrainConfig {
        dataset,
        output_dir:           root.join(name),
        categorical_features: vec!["family_history".into(), "benefits".into(), "remote_work".into()],
        fit:                  FitConfig { epochs: 3, batch_size: 4, ..FitConfig::tabular() },
        ..TabularTrainConfig::default()
    };
    let report = TrainTabularUseCase::new(cfg.clone()).execute().unwrap();
    assert_eq!(report.examples, 7);
    cfg.output_dir
}

#[rstest]
#[case::native(ExportMode::Native)]
#[case::manual(ExportMode::Manual)]
fn test_text_runs_are_byte_identical(#[case] mode: ExportMode) {
    let root = tempdir().unwrap();
    let a = text_run(root.path(), "a", mode);
    let b = text_run(root.path(), "b", mode);

    assert_eq!(read(&a, "weights.bin"), read(&b, "weights.bin"));
    assert_eq!(read(&a, "metadata.json"), read(&b, "metadata.json"));
    assert_eq!(read(&a, "metrics.csv"), read(&b, "metrics.csv"));
}

#[test]
fn test_native_and_manual_runs_agree_on_weights() {
    let root = tempdir().unwrap();
    let native = text_run(root.path(), "native", ExportMode::Native);
    let manual = text_run(root.path(), "manual", ExportMode::Manual);

    assert!(native.join("model.mpk").exists());
    assert!(!manual.join("model.mpk").exists());
    assert_eq!(read(&native, "weights.bin"), read(&manual, "weights.bin"));
    assert_eq!(read(&native, "model.json"), read(&manual, "model.json"));
}

#[test]
fn test_tabular_runs_are_byte_identical() {
    let root = tempdir().unwrap();
    let a = tabular_run(root.path(), "a");
    let b = tabular_run(root.path(), "b");

    assert_eq!(read(&a, "weights.bin"), read(&b, "weights.bin"));
    assert_eq!(read(&a, "metadata.json"), read(&b, "metadata.json"));

    let meta: Value = serde_json::from_slice(&read(&a, "metadata.json")).unwrap();
    assert_eq!(
        meta["features"],
        serde_json::json!(["Age", "Gender", "family_history", "benefits", "remote_work"])
    );
    assert_eq!(meta["inputShape"], serde_json::json!([5]));
    assert_eq!(meta["mappings"]["benefits"]["Don't know"], 1);
}

#[test]
fn test_model_json_input_matches_metadata() {
    let root = tempdir().unwrap();
    let out  = tabular_run(root.path(), "run");

    let meta:  Value = serde_json::from_slice(&read(&out, "metadata.json")).unwrap();
    let model: Value = serde_json::from_slice(&read(&out, "model.json")).unwrap();
    let first = &model["modelTopology"]["config"]["layers"][0]["config"];
    assert_eq!(first["batch_input_shape"][1], meta["inputShape"][0]);

    let kernel = &model["weightsManifest"][0]["weights"][0];
    assert_eq!(kernel["shape"][0], meta["inputShape"][0]);

    // weights.bin holds exactly the parameters the manifest lists
    let expected: u64 = model["weightsManifest"][0]["weights"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["shape"].as_array().unwrap().iter().map(|d| d.as_u64().unwrap()).product::<u64>())
        .sum();
    assert_eq!(read(&out, "weights.bin").len() as u64, expected * 4);
}

#[test]
fn test_text_end_to_end_scenario() {
    let examples = vec![
        LabeledTextExample::new("Severe chest pain", TriageLabel::Urgent),
        LabeledTextExample::new("Mild ache in my leg", TriageLabel::Monitor),
    ];
    let vocab = Vocabulary::build(&examples);
    let set   = assemble_text(&examples, &vocab, 20);

    // ache chest leg mild pain severe ("in" and "my" are too short)
    assert_eq!(vocab.len(), 6);
    assert_eq!(vocab.lookup("in"), 0);
    assert_eq!(set.features.shape(), [2, 20]);
    assert_eq!(set.labels, vec![0, 2]);
    assert_eq!(&set.features.row(1)[..4], &[4.0, 1.0, 3.0, 0.0]);
}
