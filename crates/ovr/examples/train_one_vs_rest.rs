//! One-vs-Rest training on LIBFFM data.
//!
//! Reads a small in-memory LIBFFM dataset (or the file given as the first
//! argument), trains one logistic regression per class in parallel, prints
//! the predictions and saves the fitted model to a temporary directory.
//!
//! Run with:
//! ```bash
//! RUST_LOG=info cargo run --example train_one_vs_rest [data.ffm]
//! ```

use std::sync::Arc;

use ovr::{
    LibFfmOptions, LibFfmReader, LogisticRegression, LogisticRegressionConfig, MlWritable,
    OneVsRest, OneVsRestConfig, OneVsRestModel,
};

const SAMPLE: &str = "\
0 0:0:1.0 3:1:0.2
0 0:0:0.8 1:0:0.1
0 0:0:0.9 3:1:0.1
1 1:0:1.0 3:1:0.3
1 1:0:0.9 2:1:0.1
1 0:0:0.1 1:0:0.8
2 2:1:1.0
2 2:1:0.9 3:1:0.2
2 1:0:0.1 2:1:0.8
";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // =========================================================================
    // Load data
    // =========================================================================
    let options = LibFfmOptions::from_pairs([("numFeatures", "4"), ("numFields", "2")])
        .expect("Invalid LIBFFM options");
    let reader = LibFfmReader::new(options);
    let data = match std::env::args().nth(1) {
        Some(path) => reader.read_path(&path).expect("Failed to read LIBFFM file"),
        None => reader.read(SAMPLE.as_bytes()).expect("Failed to parse sample"),
    };
    println!("Loaded {} rows", data.n_rows());

    // =========================================================================
    // Train
    // =========================================================================
    let classifier = LogisticRegression::new(
        LogisticRegressionConfig::builder()
            .max_iter(50)
            .reg_lambda(0.1)
            .build()
            .expect("Invalid classifier configuration"),
    );
    let config = OneVsRestConfig::builder()
        .parallelism(4)
        .build()
        .expect("Invalid configuration");
    let model = OneVsRest::new(Arc::new(classifier), config)
        .fit(&data)
        .expect("Training failed");
    println!(
        "Trained {} sub-models over {} features",
        model.num_classes(),
        model.num_features()
    );

    // =========================================================================
    // Predict
    // =========================================================================
    let scored = model.transform(&data).expect("Scoring failed");
    let labels = scored.doubles("label").expect("label column");
    let predictions = scored.doubles("prediction").expect("prediction column");
    let correct = labels
        .iter()
        .zip(predictions.iter())
        .filter(|(l, p)| l == p)
        .count();
    println!("Training accuracy: {}/{}", correct, labels.len());

    // =========================================================================
    // Save and reload
    // =========================================================================
    let dir = std::env::temp_dir().join(format!("ovr-example-{}", model.uid()));
    model.save_with(&dir, true).expect("Save failed");
    let reloaded = OneVsRestModel::load(&dir).expect("Load failed");
    let again = reloaded.transform(&data).expect("Scoring failed");
    assert_eq!(again.doubles("prediction").ok(), Some(predictions));
    println!("Saved and reloaded model from {}", dir.display());
}
