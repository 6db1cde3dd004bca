//! Values exchanged between typed attributes and their codecs.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use ndarray::{Array2, ArrayD, Ix2};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::annotation::{Annotation, SchemaModel};
use crate::codec;
use crate::frame::{Frame, Series};
use crate::tensor::TensorModel;
use crate::util::{Error, Result};

/// A dynamically typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Mapping(serde_json::Map<String, serde_json::Value>),
    Frame(Frame),
    Series(Series),
    Array(ArrayD<f64>),
    /// Serialized form of a schema-model instance.
    Document(serde_json::Value),
    Tensors(TensorModel),
}

impl Value {
    /// Short name of the value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Mapping(_) => "mapping",
            Value::Frame(_) => "frame",
            Value::Series(_) => "series",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
            Value::Tensors(_) => "tensors",
        }
    }
}

fn mismatch(expected: &'static str, actual: &Value) -> Error {
    Error::ValueMismatch {
        expected,
        actual: actual.kind(),
    }
}

/// A type that can be declared as an attribute.
pub trait Attr: Sized {
    /// Declared type shape, used for codec inference.
    fn annotation() -> Annotation;

    /// Convert the current value for saving.
    fn to_value(&self) -> Result<Value>;

    /// Rebuild from a loaded value.
    fn from_value(value: Value) -> Result<Self>;
}

impl Attr for String {
    fn annotation() -> Annotation {
        Annotation::Text
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Text(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(text) => Ok(text),
            other => Err(mismatch("text", &other)),
        }
    }
}

fn to_mapping<T: Serialize>(value: &T) -> Result<Value> {
    match serde_json::to_value(value).map_err(codec::Error::from)? {
        serde_json::Value::Object(map) => Ok(Value::Mapping(map)),
        other => Err(mismatch("mapping", &Value::Document(other))),
    }
}

fn from_mapping<T: DeserializeOwned>(value: Value) -> Result<T> {
    match value {
        Value::Mapping(map) => {
            Ok(serde_json::from_value(serde_json::Value::Object(map)).map_err(codec::Error::from)?)
        }
        other => Err(mismatch("mapping", &other)),
    }
}

impl<V: Serialize + DeserializeOwned> Attr for BTreeMap<String, V> {
    fn annotation() -> Annotation {
        Annotation::Mapping
    }

    fn to_value(&self) -> Result<Value> {
        to_mapping(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        from_mapping(value)
    }
}

impl<V, S> Attr for HashMap<String, V, S>
where
    V: Serialize + DeserializeOwned,
    S: BuildHasher + Default,
{
    fn annotation() -> Annotation {
        Annotation::Mapping
    }

    fn to_value(&self) -> Result<Value> {
        to_mapping(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        from_mapping(value)
    }
}

impl Attr for serde_json::Map<String, serde_json::Value> {
    fn annotation() -> Annotation {
        Annotation::Mapping
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Mapping(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Mapping(map) => Ok(map),
            other => Err(mismatch("mapping", &other)),
        }
    }
}

impl Attr for Frame {
    fn annotation() -> Annotation {
        Annotation::Frame
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Frame(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Frame(frame) => Ok(frame),
            other => Err(mismatch("frame", &other)),
        }
    }
}

impl Attr for Series {
    fn annotation() -> Annotation {
        Annotation::Series
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Series(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Series(series) => Ok(series),
            other => Err(mismatch("series", &other)),
        }
    }
}

impl Attr for ArrayD<f64> {
    fn annotation() -> Annotation {
        Annotation::Array
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Array(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(array) => Ok(array),
            other => Err(mismatch("array", &other)),
        }
    }
}

impl Attr for Array2<f64> {
    fn annotation() -> Annotation {
        Annotation::Array
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Array(self.clone().into_dyn()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(array) => Ok(array.into_dimensionality::<Ix2>().map_err(codec::Error::from)?),
            other => Err(mismatch("array", &other)),
        }
    }
}

impl Attr for TensorModel {
    fn annotation() -> Annotation {
        Annotation::tensor_model()
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Tensors(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Tensors(model) => Ok(model),
            other => Err(mismatch("tensors", &other)),
        }
    }
}

impl<T: SchemaModel> Attr for T {
    fn annotation() -> Annotation {
        Annotation::model::<T>()
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Document(serde_json::to_value(self).map_err(codec::Error::from)?))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Document(document) => Ok(serde_json::from_value(document).map_err(codec::Error::from)?),
            other => Err(mismatch("document", &other)),
        }
    }
}

/// Attribute values of one instance, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    /// Convert and insert a typed attribute.
    pub fn set<T: Attr>(&mut self, name: impl Into<String>, value: &T) -> Result<()> {
        self.values.insert(name.into(), value.to_value()?);
        Ok(())
    }

    /// Builder-style [`Record::set`].
    pub fn with<T: Attr>(mut self, name: impl Into<String>, value: &T) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Look up a raw value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Remove a raw value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Remove a value and convert it to its attribute type.
    pub fn take<T: Attr>(&mut self, name: &str) -> Result<T> {
        let value = self
            .values
            .remove(name)
            .ok_or_else(|| Error::MissingValue(name.to_string()))?;
        T::from_value(value)
    }

    /// Attribute names present.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::ModelCapabilities;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Position {
        ticker: String,
        balance: i64,
    }

    impl SchemaModel for Position {
        const CAPABILITIES: ModelCapabilities = ModelCapabilities::YAML_MIXIN;
    }

    #[test]
    fn test_mapping_conversion() -> Result<()> {
        let config = BTreeMap::from([("a".to_string(), "1".to_string())]);
        let value = config.to_value()?;
        assert!(matches!(&value, Value::Mapping(map) if map["a"] == "1"));
        assert_eq!(BTreeMap::<String, String>::from_value(value)?, config);

        let params: HashMap<String, f64> = HashMap::from([("lr".to_string(), 0.01)]);
        assert_eq!(HashMap::<String, f64>::from_value(params.to_value()?)?, params);
        Ok(())
    }

    #[test]
    fn test_schema_model_conversion() -> Result<()> {
        let position = Position { ticker: "AAPL".into(), balance: 10 };
        let value = position.to_value()?;
        assert_eq!(value, Value::Document(serde_json::json!({"ticker": "AAPL", "balance": 10})));
        assert_eq!(Position::from_value(value)?, position);
        assert!(matches!(Position::annotation(), Annotation::Model(_)));
        Ok(())
    }

    #[test]
    fn test_array2_conversion() -> Result<()> {
        let matrix = ndarray::array![[1.0, 2.0], [3.0, 4.0]];
        let value = matrix.to_value()?;
        assert_eq!(Array2::<f64>::from_value(value)?, matrix);

        let vector = Value::Array(ndarray::ArrayD::zeros(ndarray::IxDyn(&[3])));
        assert!(matches!(Array2::<f64>::from_value(vector), Err(Error::Codec(codec::Error::Shape(_)))));
        Ok(())
    }

    #[test]
    fn test_kind_mismatch() {
        let err = String::from_value(Value::Mapping(Default::default())).unwrap_err();
        assert!(matches!(err, Error::ValueMismatch { expected: "text", actual: "mapping" }));
    }

    #[test]
    fn test_record_take() -> Result<()> {
        let mut record = Record::new().with("documentation", &"Iris data".to_string())?;
        assert_eq!(record.len(), 1);
        assert_eq!(record.take::<String>("documentation")?, "Iris data");
        assert!(matches!(record.take::<String>("documentation"), Err(Error::MissingValue(n)) if n == "documentation"));
        Ok(())
    }
}
