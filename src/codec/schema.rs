//! Codecs for schema-validated models.
//!
//! Documents are written as-is and, on load, validated against the model
//! declared for the attribute. Loading without a model fails with
//! [`Error::ModelRequired`].

use std::io::{Read, Write};

use super::{mismatch, Capabilities, Codec, Error, Result};
use crate::annotation::Annotation;
use crate::value::Value;

fn document<'a>(codec: &'static str, data: &'a Value) -> Result<&'a serde_json::Value> {
    match data {
        Value::Document(document) => Ok(document),
        other => Err(mismatch(codec, "document", other)),
    }
}

fn validate(codec: &'static str, model: &Annotation, document: serde_json::Value) -> Result<Value> {
    let schema = model.as_model().ok_or(Error::ModelRequired { codec })?;
    Ok(Value::Document(schema.validate(document)?))
}

/// Protocol A models, as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaJsonCodec;

impl Codec for SchemaJsonCodec {
    fn name(&self) -> &'static str {
        "schema_json"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::MODEL
    }

    fn save(&self, data: &Value, dst: &mut dyn Write) -> Result<()> {
        serde_json::to_writer(dst, document(self.name(), data)?)?;
        Ok(())
    }

    fn load(&self, _src: &mut dyn Read) -> Result<Value> {
        Err(Error::ModelRequired { codec: self.name() })
    }

    fn load_with_model(&self, src: &mut dyn Read, model: &Annotation) -> Result<Value> {
        let document: serde_json::Value = serde_json::from_reader(src)?;
        validate(self.name(), model, document)
    }
}

/// Protocol B models with a YAML serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaYamlCodec;

impl Codec for SchemaYamlCodec {
    fn name(&self) -> &'static str {
        "schema_yaml"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::MODEL
    }

    fn save(&self, data: &Value, dst: &mut dyn Write) -> Result<()> {
        serde_yaml::to_writer(dst, document(self.name(), data)?)?;
        Ok(())
    }

    fn load(&self, _src: &mut dyn Read) -> Result<Value> {
        Err(Error::ModelRequired { codec: self.name() })
    }

    fn load_with_model(&self, src: &mut dyn Read, model: &Annotation) -> Result<Value> {
        let document: serde_json::Value = serde_yaml::from_reader(src)?;
        validate(self.name(), model, document)
    }
}

/// Protocol B models with a JSON serializer, written indented.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaJsonVariantCodec;

impl Codec for SchemaJsonVariantCodec {
    fn name(&self) -> &'static str {
        "schema_json_variant"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::MODEL
    }

    fn save(&self, data: &Value, dst: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(dst, document(self.name(), data)?)?;
        Ok(())
    }

    fn load(&self, _src: &mut dyn Read) -> Result<Value> {
        Err(Error::ModelRequired { codec: self.name() })
    }

    fn load_with_model(&self, src: &mut dyn Read, model: &Annotation) -> Result<Value> {
        let document: serde_json::Value = serde_json::from_reader(src)?;
        validate(self.name(), model, document)
    }
}
