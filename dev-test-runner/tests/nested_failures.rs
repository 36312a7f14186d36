use std::collections::BTreeMap;

use chrono::DateTime;
use dev_test_runner::metrics::{Report, Sample};
use pretty_assertions::assert_eq;
use rqlgen::runtime::{Codec, CodecError};

fn sample(label: &str) -> Sample {
    Sample {
        label: label.into(),
        count: 1,
        ratio: 0.5,
        codes: vec!["3".into()],
        limits: BTreeMap::new(),
        taken: DateTime::from_timestamp(1_700_000_000, 0).unwrap().naive_utc(),
        stamps: vec![],
        healthy: true,
    }
}

fn broken(label: &str) -> Sample {
    Sample { codes: vec!["3".into(), "oops".into()], ..sample(label) }
}

fn report() -> Report {
    Report {
        headline: sample("now"),
        history: vec![sample("a"), sample("b")],
        by_host: BTreeMap::from([("web-1".to_owned(), sample("web"))]),
    }
}

fn inner_error() -> CodecError {
    CodecError::conversion("String", "array_number", "Sample", "codes")
}

#[test]
fn healthy_report_round_trips() {
    let original = report();
    let mut decoded = Report::default();
    decoded.decode(original.encode().unwrap()).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn nested_record_error_propagates_unchanged() {
    let bad = Report { headline: broken("now"), ..report() };
    assert_eq!(bad.encode().unwrap_err(), inner_error());
}

#[test]
fn array_element_error_propagates_unchanged() {
    let bad = Report { history: vec![sample("a"), broken("b"), sample("c")], ..report() };
    assert_eq!(bad.encode().unwrap_err(), inner_error());
}

#[test]
fn map_value_error_propagates_unchanged() {
    let mut bad = report();
    bad.by_host.insert("web-2".into(), broken("web"));
    assert_eq!(bad.encode().unwrap_err(), inner_error());
}
