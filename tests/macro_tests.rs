//! Integration tests for the `declario!` macro.

use std::collections::BTreeMap;

use classio::codec::YamlCodec;
use classio::pack::Reader;
use classio::{declario, Codec, DeclarationError, Declared, Error, Frame, Series};

use tempfile::tempdir;

declario! {
    /// An experiment with its configuration and data.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Experiment {
        pub documentation: String,
        pub config: BTreeMap<String, String>,
        pub df: Frame,
    }
    codecs {
        "config" => YamlCodec,
    }
}

declario! {
    #[derive(Debug)]
    struct Labels {
        target: Series,
    }
}

/// Implements no operation at all.
#[derive(Debug)]
struct NameOnly;

impl Codec for NameOnly {
    fn name(&self) -> &'static str {
        "name_only"
    }
}

declario! {
    struct Misconfigured {
        documentation: String,
    }
    codecs {
        "documentation" => NameOnly,
    }
}

fn experiment() -> Experiment {
    Experiment {
        documentation: "Iris data".into(),
        config: BTreeMap::from([("a".to_string(), "1".to_string())]),
        df: Frame::from_columns([("petal_width", vec![0.2, 0.2, 1.3])]).expect("frame"),
    }
}

#[test]
fn test_macro_declares_attributes_in_field_order() {
    let names: Vec<_> = Experiment::attributes().iter().map(|a| a.name().to_string()).collect();
    assert_eq!(names, vec!["documentation", "config", "df"]);
}

#[test]
fn test_macro_codecs_block() {
    let io = Experiment::declare().expect("declare");
    assert_eq!(io.codec("config").map(|c| c.name()), Some("yaml"));
    assert_eq!(io.codec("documentation").map(|c| c.name()), Some("text"));
    assert!(std::ptr::eq(io, Experiment::declare().expect("declare")), "decorated more than once");
}

#[test]
fn test_macro_save_and_load() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("experiment.cpack");

    let original = experiment();
    original.save(&path).expect("save");

    let reader = Reader::open(&path).expect("open");
    assert_eq!(reader.len(), 3);
    drop(reader);

    assert_eq!(Experiment::load(&path).expect("load"), original);
    assert_eq!(Experiment::from_file(&path).expect("load"), original);
}

#[test]
fn test_macro_without_codecs_block() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("labels.cpack");

    let labels = Labels { target: Series::new(vec!["setosa", "versicolor"]) };
    labels.save(&path).expect("save");
    assert_eq!(Labels::load(&path).expect("load").target, labels.target);
}

#[test]
fn test_macro_surfaces_declaration_errors() {
    let err = Misconfigured::declare().unwrap_err();
    assert!(matches!(err, DeclarationError::ProtocolViolation { ref codec, .. } if codec == "name_only"));

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("never.cpack");
    let value = Misconfigured { documentation: "x".into() };
    let err = value.save(&path).unwrap_err();
    assert!(matches!(err, Error::Declaration(DeclarationError::ProtocolViolation { .. })));
    assert!(!path.exists());
    assert!(matches!(Misconfigured::load(&path), Err(Error::Declaration(_))));
}
