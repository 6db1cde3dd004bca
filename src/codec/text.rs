//! Text and mapping codecs.

use std::io::{Read, Write};

use super::{mismatch, Capabilities, Codec, Result};
use crate::value::Value;

/// Plain UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn name(&self) -> &'static str {
        "text"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn save(&self, data: &Value, dst: &mut dyn Write) -> Result<()> {
        match data {
            Value::Text(text) => Ok(dst.write_all(text.as_bytes())?),
            other => Err(mismatch(self.name(), "text", other)),
        }
    }

    fn load(&self, src: &mut dyn Read) -> Result<Value> {
        let mut text = String::new();
        src.read_to_string(&mut text)?;
        Ok(Value::Text(text))
    }
}

fn from_document(document: serde_json::Value) -> Value {
    match document {
        serde_json::Value::Object(map) => Value::Mapping(map),
        other => Value::Document(other),
    }
}

/// Mappings as JSON documents.
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Indented output.
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Compact, single-line output.
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// Set indented output.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn save(&self, data: &Value, dst: &mut dyn Write) -> Result<()> {
        let document = match data {
            Value::Mapping(map) => serde_json::Value::Object(map.clone()),
            Value::Document(document) => document.clone(),
            other => return Err(mismatch(self.name(), "mapping", other)),
        };
        if self.pretty {
            serde_json::to_writer_pretty(&mut *dst, &document)?;
        } else {
            serde_json::to_writer(&mut *dst, &document)?;
        }
        Ok(())
    }

    fn load(&self, src: &mut dyn Read) -> Result<Value> {
        let document: serde_json::Value = serde_json::from_reader(src)?;
        Ok(from_document(document))
    }
}

/// Mappings as YAML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn save(&self, data: &Value, dst: &mut dyn Write) -> Result<()> {
        match data {
            Value::Mapping(map) => serde_yaml::to_writer(dst, map)?,
            Value::Document(document) => serde_yaml::to_writer(dst, document)?,
            other => return Err(mismatch(self.name(), "mapping", other)),
        }
        Ok(())
    }

    fn load(&self, src: &mut dyn Read) -> Result<Value> {
        let document: serde_json::Value = serde_yaml::from_reader(src)?;
        Ok(from_document(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Error;
    use serde_json::json;

    fn mapping() -> Value {
        match json!({"a": "1", "nested": {"depth": 2}}) {
            serde_json::Value::Object(map) => Value::Mapping(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_text() -> Result<()> {
        let mut buf = Vec::new();
        TextCodec.save(&Value::Text("Iris data".into()), &mut buf)?;
        assert_eq!(buf, b"Iris data");
        assert_eq!(TextCodec.load(&mut buf.as_slice())?, Value::Text("Iris data".into()));
        Ok(())
    }

    #[test]
    fn test_text_rejects_other_values() {
        let mut buf = Vec::new();
        let err = TextCodec.save(&mapping(), &mut buf).unwrap_err();
        assert!(matches!(err, Error::ValueMismatch { codec: "text", expected: "text", actual: "mapping" }));
    }

    #[test]
    fn test_json_pretty_and_compact() -> Result<()> {
        let mut pretty = Vec::new();
        JsonCodec::new().save(&mapping(), &mut pretty)?;
        assert!(pretty.contains(&b'\n'));

        let mut compact = Vec::new();
        JsonCodec::compact().save(&mapping(), &mut compact)?;
        assert!(!compact.contains(&b'\n'));

        assert_eq!(JsonCodec::new().load(&mut compact.as_slice())?, mapping());
        Ok(())
    }

    #[test]
    fn test_yaml() -> Result<()> {
        let mut buf = Vec::new();
        YamlCodec.save(&mapping(), &mut buf)?;
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("nested:"));
        assert_eq!(YamlCodec.load(&mut buf.as_slice())?, mapping());
        Ok(())
    }
}
