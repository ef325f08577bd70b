//! LIBFFM options and reading from disk.

mod common;

use std::io::Write;
use std::sync::Arc;

use proptest::prelude::*;

use ovr::data::io::{CaseInsensitiveMap, FEATURES_COL, FIELDS_COL};
use ovr::data::FeatureVector;
use ovr::{LibFfmError, LibFfmOptions, LibFfmReader, LogisticRegression, OneVsRest, OneVsRestConfig};

fn options_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    let key = prop_oneof![
        Just("numFeatures"),
        Just("NUMFIELDS"),
        Just("vectortype"),
        Just("keyType"),
        Just("unrelated"),
    ];
    let value = prop_oneof![
        Just("sparse".to_string()),
        Just("dense".to_string()),
        Just("int".to_string()),
        Just("long".to_string()),
        (-5i64..50).prop_map(|n| n.to_string()),
    ];
    prop::collection::vec((key.prop_map(str::to_string), value), 0..6)
}

proptest! {
    #[test]
    fn normalized_options_parse_to_themselves(pairs in options_strategy()) {
        let map: CaseInsensitiveMap = pairs.into_iter().collect();
        // Mismatched values are rejected, which is fine for this property.
        if let Ok(options) = LibFfmOptions::new(&map) {
            let again = LibFfmOptions::new(&options.to_map()).unwrap();
            prop_assert_eq!(again, options);
        }
    }

    #[test]
    fn non_positive_sizes_are_unset(n in -1000i64..=0) {
        let options = LibFfmOptions::from_pairs([("numFeatures", n.to_string())]).unwrap();
        prop_assert_eq!(options.num_features(), None);
    }
}

#[test]
fn later_keys_win_regardless_of_case() {
    let options = LibFfmOptions::from_pairs([
        ("vectorType", "dense"),
        ("VectorType", "sparse"),
        ("numfeatures", "3"),
        ("NumFeatures", "8"),
    ])
    .unwrap();
    assert!(options.is_sparse());
    assert_eq!(options.num_features(), Some(8));
}

#[test]
fn reads_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "0 0:0:1.0 1:2:0.5").unwrap();
    writeln!(file, "1 1:1:1.0").unwrap();
    writeln!(file, "2 0:3:2.0").unwrap();

    let options =
        LibFfmOptions::from_pairs([("numFeatures", "5"), ("vectorType", "dense")]).unwrap();
    let frame = LibFfmReader::new(options).read_path(file.path()).unwrap();

    assert_eq!(frame.n_rows(), 3);
    let features = frame.vectors(FEATURES_COL).unwrap();
    assert_eq!(features[0], FeatureVector::dense(vec![1.0, 0.0, 0.5, 0.0, 0.0]));
    assert_eq!(features[2].size(), 5);
    assert_eq!(
        frame.vectors(FIELDS_COL).unwrap()[0],
        FeatureVector::dense(vec![0.0, 0.0, 1.0, 0.0, 0.0])
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = LibFfmReader::default()
        .read_path(dir.path().join("absent.ffm"))
        .unwrap_err();
    assert!(matches!(err, LibFfmError::Io(_)));
}

#[test]
fn long_keys_accept_wide_indices() {
    let line = format!("1 0:{}:1", i32::MAX as u64 + 1);
    let options = LibFfmOptions::from_pairs([("keyType", "long")]).unwrap();
    let frame = LibFfmReader::new(options).read(line.as_bytes()).unwrap();
    let features = frame.vectors(FEATURES_COL).unwrap();
    assert_eq!(features[0].size(), i32::MAX as usize + 2);
    assert_eq!(features[0].num_active(), 1);
}

#[test]
fn libffm_data_trains_one_vs_rest() {
    common::init_logging();
    let text = "\
0 0:0:1.0
0 0:0:0.9 1:1:0.1
1 1:1:1.0
1 0:0:0.1 1:1:0.9
2 2:2:1.0
2 1:1:0.1 2:2:0.9
";
    let options = LibFfmOptions::from_pairs([("numFeatures", "3")]).unwrap();
    let frame = LibFfmReader::new(options).read(text.as_bytes()).unwrap();

    let model = OneVsRest::new(
        Arc::new(LogisticRegression::default()),
        OneVsRestConfig::default(),
    )
    .fit(&frame)
    .unwrap();
    let predictions = model.transform(&frame).unwrap();
    assert_eq!(
        predictions.doubles("prediction").unwrap().to_vec(),
        vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0]
    );
}
