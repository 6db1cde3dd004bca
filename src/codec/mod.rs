//! Attribute codecs.
//!
//! A [`Codec`] turns one attribute [`Value`] into the bytes of an archive entry
//! and back. Codecs are stateless and shared as `Arc<dyn Codec>`; the
//! decorator never mutates them.
//!
//! Built-in codecs:
//! - [`TextCodec`] - UTF-8 text
//! - [`JsonCodec`] / [`YamlCodec`] - string-keyed mappings
//! - [`FrameCodec`] / [`SeriesCodec`] - columnar tables, zlib-compressed
//! - [`ArrayCodec`] / [`TensorModelCodec`] - safetensors
//! - [`SchemaJsonCodec`], [`SchemaYamlCodec`], [`SchemaJsonVariantCodec`] -
//!   schema models, validated against the declared model on load

mod array;
mod error;
mod frame;
mod schema;
mod text;

pub use array::{ArrayCodec, TensorModelCodec};
pub use error::{Error, Result};
pub use frame::{FrameCodec, SeriesCodec};
pub use schema::{SchemaJsonCodec, SchemaJsonVariantCodec, SchemaYamlCodec};
pub use text::{JsonCodec, TextCodec, YamlCodec};

use std::fmt::Debug;
use std::io::{Read, Write};

use crate::annotation::Annotation;
use crate::util::DeclarationError;
use crate::value::Value;

/// Operations a codec implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// Writes values.
    pub save: bool,
    /// Reads values without a model.
    pub load: bool,
    /// Reads values given the declared model.
    pub load_with_model: bool,
}

impl Capabilities {
    /// Save and load, no model needed.
    pub const FULL: Self = Self {
        save: true,
        load: true,
        load_with_model: false,
    };

    /// Save, and load only given the declared model.
    pub const MODEL: Self = Self {
        save: true,
        load: false,
        load_with_model: true,
    };

    /// Nothing.
    pub const NONE: Self = Self {
        save: false,
        load: false,
        load_with_model: false,
    };

    /// Operation names a save/load codec lacks.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.save {
            missing.push("save");
        }
        if !self.load && !self.load_with_model {
            missing.push("load");
        }
        missing
    }
}

/// Save/load capability bundle for one data shape.
pub trait Codec: Send + Sync + Debug {
    /// Short codec name.
    fn name(&self) -> &'static str;

    /// Operations this codec implements. Codecs must declare what they
    /// override; the default bodies below only report `Unsupported`.
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    /// Write `data` to `dst`.
    fn save(&self, data: &Value, dst: &mut dyn Write) -> Result<()> {
        let _ = (data, dst);
        Err(Error::Unsupported { codec: self.name(), operation: "save" })
    }

    /// Read a value from `src`.
    fn load(&self, src: &mut dyn Read) -> Result<Value> {
        let _ = src;
        Err(Error::Unsupported { codec: self.name(), operation: "load" })
    }

    /// Read a value from `src`, given the attribute's declared model.
    fn load_with_model(&self, src: &mut dyn Read, model: &Annotation) -> Result<Value> {
        let _ = model;
        self.load(src)
    }
}

/// Check that `codec`, given for `attribute`, implements both save and load.
pub fn check_protocol(attribute: &str, codec: &dyn Codec) -> std::result::Result<(), DeclarationError> {
    let missing = codec.capabilities().missing();
    if missing.is_empty() {
        return Ok(());
    }
    Err(DeclarationError::ProtocolViolation {
        attribute: attribute.to_string(),
        codec: codec.name().to_string(),
        missing: missing.join(" and "),
    })
}

fn mismatch(codec: &'static str, expected: &'static str, actual: &Value) -> Error {
    Error::ValueMismatch { codec, expected, actual: actual.kind() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct SaveOnly;

    impl Codec for SaveOnly {
        fn name(&self) -> &'static str {
            "save_only"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities { save: true, load: false, load_with_model: false }
        }
    }

    #[derive(Debug)]
    struct Inert;

    impl Codec for Inert {
        fn name(&self) -> &'static str {
            "inert"
        }
    }

    #[test]
    fn test_protocol_check() {
        assert!(check_protocol("config", &TextCodec).is_ok());
        assert!(check_protocol("metadata", &SchemaJsonCodec).is_ok());

        let err = check_protocol("config", &SaveOnly).unwrap_err();
        assert_eq!(
            err,
            DeclarationError::ProtocolViolation {
                attribute: "config".into(),
                codec: "save_only".into(),
                missing: "load".into(),
            }
        );

        let err = check_protocol("df", &Inert).unwrap_err();
        assert!(matches!(err, DeclarationError::ProtocolViolation { missing, .. } if missing == "save and load"));
    }

    #[test]
    fn test_builtin_capabilities() {
        let full: [&dyn Codec; 7] = [
            &TextCodec,
            &JsonCodec::new(),
            &YamlCodec,
            &FrameCodec::default(),
            &SeriesCodec::default(),
            &ArrayCodec,
            &TensorModelCodec,
        ];
        for codec in full {
            assert_eq!(codec.capabilities(), Capabilities::FULL, "{}", codec.name());
        }
        let model: [&dyn Codec; 3] = [&SchemaJsonCodec, &SchemaYamlCodec, &SchemaJsonVariantCodec];
        for codec in model {
            assert_eq!(codec.capabilities(), Capabilities::MODEL, "{}", codec.name());
        }
        assert_eq!(Inert.capabilities(), Capabilities::NONE);
    }

    #[test]
    fn test_default_operations_unsupported() {
        let mut out = Vec::new();
        let err = SaveOnly.save(&Value::Text("x".into()), &mut out).unwrap_err();
        assert!(matches!(err, Error::Unsupported { codec: "save_only", operation: "save" }));

        let err = SaveOnly.load_with_model(&mut &b""[..], &Annotation::Text).unwrap_err();
        assert!(matches!(err, Error::Unsupported { operation: "load", .. }));
    }
}
