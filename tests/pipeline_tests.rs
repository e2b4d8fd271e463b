//! End-to-end tests over the fitted pipeline and classifier seam.

use fraud_scoring::{
    models::{check_feature_arity, Classifier},
    pipeline::options::PipelineOptions,
    FeaturePipeline, Transaction,
};

/// Deterministic stand-in for the ONNX artifact: flags large scaled
/// amounts as fraud.
struct ThresholdClassifier;

impl Classifier for ThresholdClassifier {
    fn predict(&self, rows: &[Vec<f32>]) -> anyhow::Result<Vec<i64>> {
        Ok(rows
            .iter()
            .map(|row| if row.get(1).copied().unwrap_or(0.0) > 1.0 { 1 } else { 0 })
            .collect())
    }
}

fn raw_row(transaction_id: &str, timestamp: &str) -> Transaction {
    let mut tx = Transaction::new(transaction_id, "CustomerId_908", 2200.0, timestamp);
    tx.batch_id = "BatchId_79110".to_string();
    tx.account_id = "AccountId_571".to_string();
    tx.subscription_id = "SubscriptionId_873".to_string();
    tx
}

fn fitted_pipeline() -> FeaturePipeline {
    let rows = vec![
        raw_row("TransactionId_16559", "2018-11-15T05:54:12Z"),
        raw_row("TransactionId_79455", "2018-11-15T05:55:12Z"),
        Transaction::new("TransactionId_3", "CustomerId_1", -50.0, "2018-11-16T09:00:00Z"),
        Transaction::new("TransactionId_4", "CustomerId_2", 500.0, "2018-12-01T22:30:00Z"),
    ];
    let mut pipeline = FeaturePipeline::new(PipelineOptions::default());
    pipeline.fit(&rows).unwrap();
    pipeline
}

#[test]
fn two_near_identical_rows_yield_two_binary_predictions() {
    // Two real-shaped rows differing only in transaction id and timestamp
    // (one minute apart).
    let pipeline = fitted_pipeline();
    let classifier = ThresholdClassifier;

    let batch = vec![
        raw_row("TransactionId_16559", "2018-11-15T05:54:12Z"),
        raw_row("TransactionId_79455", "2018-11-15T05:55:12Z"),
    ];

    let matrix = pipeline.transform(&batch).unwrap();
    let predictions = classifier.predict(&matrix.to_f32_rows()).unwrap();

    assert_eq!(predictions.len(), 2);
    for p in predictions {
        assert!(p == 0 || p == 1);
    }
}

#[test]
fn transform_is_reproducible_across_persisted_fits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");

    let pipeline = fitted_pipeline();
    pipeline.save(&path).unwrap();
    let reloaded = FeaturePipeline::load(&path).unwrap();

    let batch = vec![raw_row("TransactionId_16559", "2018-11-15T05:54:12Z")];
    let once = reloaded.transform(&batch).unwrap();
    let twice = reloaded.transform(&batch).unwrap();

    assert_eq!(once, twice);
    assert_eq!(once, pipeline.transform(&batch).unwrap());
}

#[test]
fn unrelated_json_body_is_rejected_before_transform() {
    // A record with only unrelated fields must fail schema validation,
    // never produce a transform result.
    let bad = r#"{"foo": 1, "bar": 2}"#;
    assert!(serde_json::from_str::<Transaction>(bad).is_err());
}

#[test]
fn unseen_category_still_matches_classifier_arity() {
    let pipeline = fitted_pipeline();
    let width = pipeline.output_columns().unwrap().len();
    check_feature_arity(&ThresholdClassifier, width).unwrap();

    let mut tx = raw_row("TransactionId_x", "2019-03-01T12:00:00Z");
    tx.provider_id = Some("ProviderId_never_seen".to_string());
    tx.channel_id = None;

    let matrix = pipeline.transform(&[tx]).unwrap();
    assert_eq!(matrix.rows[0].len(), width);
}
