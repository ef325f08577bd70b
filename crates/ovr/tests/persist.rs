//! Directory persistence of One-vs-Rest estimators and models.

mod common;

use std::fs;
use std::sync::Arc;

use common::{clustered, test_registry, three_class, TableClassifier};
use ovr::data::Attribute;
use ovr::persist::{Metadata, MlWritable, PersistError, Registry};
use ovr::{LogisticRegression, OneVsRest, OneVsRestConfig, OneVsRestModel};

fn fitted() -> OneVsRestModel {
    OneVsRest::new(
        Arc::new(LogisticRegression::default()),
        OneVsRestConfig::default(),
    )
    .fit(&clustered())
    .unwrap()
}

#[test]
fn model_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ovr_model");
    let model = fitted();
    model.save(&path).unwrap();

    for entry in ["metadata", "classifier/metadata", "model_0/data", "model_2/metadata"] {
        assert!(path.join(entry).is_file(), "missing {entry}");
    }
    assert!(!path.join("model_3").exists());

    let loaded = OneVsRestModel::load(&path).unwrap();
    assert_eq!(loaded.uid(), model.uid());
    assert_eq!(loaded.parent(), model.parent());
    assert_eq!(loaded.num_classes(), 3);
    assert_eq!(loaded.num_features(), 3);
    assert_eq!(loaded.label_metadata(), model.label_metadata());
    assert_eq!(loaded.columns(), model.columns());
    assert_eq!(
        loaded.classifier().unwrap().class_name(),
        LogisticRegression::CLASS_NAME
    );

    let data = clustered();
    let expected = model.transform(&data).unwrap();
    let actual = loaded.transform(&data).unwrap();
    assert_eq!(
        actual.doubles("prediction").unwrap(),
        expected.doubles("prediction").unwrap()
    );
    assert_eq!(
        actual.vectors("rawPrediction").unwrap(),
        expected.vectors("rawPrediction").unwrap()
    );
}

#[test]
fn model_metadata_layout() {
    let dir = tempfile::tempdir().unwrap();
    let model = fitted().with_prediction_col("label_hat");
    model.save(dir.path().join("m")).unwrap();

    let metadata = Metadata::read(&dir.path().join("m")).unwrap();
    assert_eq!(metadata.class, OneVsRestModel::CLASS_NAME);
    assert_eq!(metadata.uid, model.uid());
    assert_eq!(metadata.extra_field::<usize>("numClasses").unwrap(), 3);
    let label_json: String = metadata.extra_field("labelMetadata").unwrap();
    assert_eq!(
        Attribute::from_json(&label_json).unwrap(),
        Attribute::nominal("label", 3)
    );
    assert_eq!(metadata.param_map["predictionCol"], "label_hat");
    assert!(metadata.param_map.get("classifier").is_none());
    assert_eq!(metadata.default_param_map["predictionCol"], "prediction");

    // Sub-models record the binary label they were fitted on.
    for i in 0..3 {
        let sub = Metadata::read(&dir.path().join("m").join(format!("model_{i}"))).unwrap();
        assert_eq!(sub.param_map["labelCol"], format!("mc2b${i}"));
        assert_eq!(sub.param_map["featuresCol"], "features");
    }
}

#[test]
fn estimator_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ovr");
    let ovr = OneVsRest::new(
        Arc::new(LogisticRegression::default()),
        OneVsRestConfig::builder()
            .parallelism(3)
            .raw_prediction_col("scores")
            .build()
            .unwrap(),
    );
    ovr.save(&path).unwrap();
    assert!(path.join("classifier").join("metadata").is_file());

    let loaded = OneVsRest::load(&path).unwrap();
    assert_eq!(loaded.uid(), ovr.uid());
    assert_eq!(loaded.config(), ovr.config());
    assert_eq!(loaded.classifier().uid(), ovr.classifier().uid());

    // The reloaded estimator trains like the original.
    let a = ovr.fit(&three_class()).unwrap().transform(&three_class()).unwrap();
    let b = loaded
        .fit(&three_class())
        .unwrap()
        .transform(&three_class())
        .unwrap();
    assert_eq!(a.vectors("scores").unwrap(), b.vectors("scores").unwrap());
}

#[test]
fn save_refuses_existing_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model");
    let model = fitted();
    model.save(&path).unwrap();

    assert!(matches!(
        model.save(&path),
        Err(PersistError::PathExists(p)) if p == path
    ));

    // Overwriting replaces stale content.
    fs::write(path.join("stale"), b"x").unwrap();
    model.save_with(&path, true).unwrap();
    assert!(!path.join("stale").exists());
    assert!(OneVsRestModel::load(&path).is_ok());
}

#[test]
fn non_writable_sub_models_are_rejected_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model");
    let model = OneVsRest::new(
        Arc::new(TableClassifier::new(vec![0.1, 0.2, 0.3])),
        OneVsRestConfig::default(),
    )
    .fit(&three_class())
    .unwrap();

    let err = model.save(&path).unwrap_err();
    match err {
        PersistError::Unsupported {
            component,
            uid,
            type_name,
        } => {
            assert_eq!(component, "classifier");
            assert_eq!(uid, "table_1");
            assert!(type_name.ends_with("TableClassifier"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!path.exists());
}

#[test]
fn non_writable_classifier_rejects_estimator_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ovr");
    let ovr = OneVsRest::new(
        Arc::new(TableClassifier::new(vec![0.0])),
        OneVsRestConfig::default(),
    );
    assert!(matches!(
        ovr.save(&path),
        Err(PersistError::Unsupported { .. })
    ));
    assert!(!path.exists());
}

#[test]
fn custom_classes_need_registration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model");
    let model = OneVsRest::new(
        Arc::new(TableClassifier::new(vec![0.3, 0.9]).writable()),
        OneVsRestConfig::default(),
    )
    .fit(&three_class().with_column("label", vec![0.0, 1.0, 1.0]).unwrap())
    .unwrap();
    model.save(&path).unwrap();

    assert!(matches!(
        OneVsRestModel::load(&path),
        Err(PersistError::UnknownClass(c)) if c == TableClassifier::CLASS_NAME
    ));

    let loaded = OneVsRestModel::load_with(&path, &test_registry()).unwrap();
    assert_eq!(loaded.num_classes(), 2);
    let scored = loaded.transform(&three_class()).unwrap();
    assert_eq!(scored.doubles("prediction").unwrap().to_vec(), vec![1.0; 3]);
}

#[test]
fn model_without_classifier_dir_still_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model");
    let model = fitted();
    model.save(&path).unwrap();
    fs::remove_dir_all(path.join("classifier")).unwrap();

    let loaded = OneVsRestModel::load(&path).unwrap();
    assert!(loaded.classifier().is_none());
    assert_eq!(loaded.num_classes(), model.num_classes());

    // And saves again without one.
    let again = dir.path().join("again");
    loaded.save(&again).unwrap();
    assert!(!again.join("classifier").exists());
}

#[test]
fn loading_checks_class_and_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ovr");
    OneVsRest::new(
        Arc::new(LogisticRegression::default()),
        OneVsRestConfig::default(),
    )
    .save(&path)
    .unwrap();

    assert!(matches!(
        OneVsRestModel::load(&path),
        Err(PersistError::ClassMismatch { .. })
    ));
    assert!(matches!(
        OneVsRest::load(dir.path().join("nothing")),
        Err(PersistError::MissingMetadata(_))
    ));
    assert!(matches!(
        OneVsRest::load_with(&path, &Registry::empty()),
        Err(PersistError::UnknownClass(_))
    ));
}

#[test]
fn invalid_saved_parallelism_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ovr");
    OneVsRest::new(
        Arc::new(LogisticRegression::default()),
        OneVsRestConfig::default(),
    )
    .save(&path)
    .unwrap();

    let mut metadata = Metadata::read(&path).unwrap();
    metadata.param_map["parallelism"] = serde_json::json!(0);
    metadata.write(&path).unwrap();

    assert!(matches!(
        OneVsRest::load(&path),
        Err(PersistError::Config(_))
    ));
}
