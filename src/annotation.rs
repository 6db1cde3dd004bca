//! Declared attribute type shapes.
//!
//! An [`Annotation`] is what codec inference looks at. Types describe
//! themselves through [`crate::Attr::annotation`]; schema models additionally
//! advertise their [`ModelCapabilities`].

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec;
use crate::tensor::{TENSOR_MODEL_MODULE, TENSOR_MODEL_NAME};

/// Capabilities a schema-model type exposes.
///
/// Protocol A models can validate themselves from JSON. Protocol B models carry
/// the dict-mixin marker and one or more `to_*` serializers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModelCapabilities {
    /// Validates an instance from a JSON document (protocol A).
    pub validate_json: bool,
    /// Carries the dict-mixin marker (protocol B).
    pub dict_mixin: bool,
    /// Serializes itself to YAML.
    pub to_yaml: bool,
    /// Serializes itself to JSON.
    pub to_json: bool,
}

impl ModelCapabilities {
    /// Protocol A: validate-from-JSON models.
    pub const VALIDATE_JSON: Self = Self {
        validate_json: true,
        dict_mixin: false,
        to_yaml: false,
        to_json: false,
    };

    /// Protocol B with a YAML serializer.
    pub const YAML_MIXIN: Self = Self {
        validate_json: false,
        dict_mixin: true,
        to_yaml: true,
        to_json: false,
    };

    /// Protocol B with a JSON serializer.
    pub const JSON_MIXIN: Self = Self {
        validate_json: false,
        dict_mixin: true,
        to_yaml: false,
        to_json: true,
    };

    /// No capabilities.
    pub const NONE: Self = Self {
        validate_json: false,
        dict_mixin: false,
        to_yaml: false,
        to_json: false,
    };
}

/// Validation hook: rebuild a typed model from its JSON document.
pub type ValidateFn = fn(serde_json::Value) -> Result<serde_json::Value, codec::Error>;

/// Schema of a model type: its name, capabilities and validator.
#[derive(Debug, Clone, Copy)]
pub struct ModelSchema {
    name: &'static str,
    capabilities: ModelCapabilities,
    validate: ValidateFn,
}

impl ModelSchema {
    /// Describe a schema model type.
    pub fn of<T: SchemaModel>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            capabilities: T::CAPABILITIES,
            validate: validate_document::<T>,
        }
    }

    /// Describe a model from its parts.
    pub fn new(name: &'static str, capabilities: ModelCapabilities, validate: ValidateFn) -> Self {
        Self { name, capabilities, validate }
    }

    /// Type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Advertised capabilities.
    pub fn capabilities(&self) -> ModelCapabilities {
        self.capabilities
    }

    /// Validate a document against the model, returning its normalized form.
    pub fn validate(&self, document: serde_json::Value) -> Result<serde_json::Value, codec::Error> {
        (self.validate)(document)
    }
}

impl PartialEq for ModelSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.capabilities == other.capabilities
    }
}

/// A serde-backed model type with declared capabilities.
pub trait SchemaModel: Serialize + DeserializeOwned {
    /// Capabilities inference sees on this type.
    const CAPABILITIES: ModelCapabilities;
}

fn validate_document<T: SchemaModel>(document: serde_json::Value) -> Result<serde_json::Value, codec::Error> {
    let model: T = serde_json::from_value(document).map_err(|e| codec::Error::Validation {
        model: std::any::type_name::<T>().to_string(),
        message: e.to_string(),
    })?;
    Ok(serde_json::to_value(model)?)
}

/// Declared type of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// Plain text.
    Text,
    /// String-keyed mapping.
    Mapping,
    /// Tabular frame.
    Frame,
    /// Single-column series.
    Series,
    /// N-dimensional f64 array.
    Array,
    /// Schema-validated model.
    Model(ModelSchema),
    /// Type from an interchange-format module.
    Interchange {
        module: &'static str,
        name: &'static str,
    },
    /// Union of several types.
    Union(Vec<Annotation>),
    /// Any other type, known only by name.
    Opaque(&'static str),
}

impl Annotation {
    /// Union of the given annotations.
    pub fn union(members: impl IntoIterator<Item = Annotation>) -> Self {
        Annotation::Union(members.into_iter().collect())
    }

    /// A type inference knows nothing about.
    pub fn opaque(name: &'static str) -> Self {
        Annotation::Opaque(name)
    }

    /// Annotation of a schema model type.
    pub fn model<T: SchemaModel>() -> Self {
        Annotation::Model(ModelSchema::of::<T>())
    }

    /// Annotation of [`crate::TensorModel`].
    pub fn tensor_model() -> Self {
        Annotation::Interchange {
            module: TENSOR_MODEL_MODULE,
            name: TENSOR_MODEL_NAME,
        }
    }

    /// Check if this is a union.
    pub fn is_union(&self) -> bool {
        matches!(self, Annotation::Union(_))
    }

    /// Model schema, if this annotates a schema model.
    pub fn as_model(&self) -> Option<&ModelSchema> {
        match self {
            Annotation::Model(schema) => Some(schema),
            _ => None,
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Text => write!(f, "String"),
            Annotation::Mapping => write!(f, "Mapping"),
            Annotation::Frame => write!(f, "Frame"),
            Annotation::Series => write!(f, "Series"),
            Annotation::Array => write!(f, "ArrayD<f64>"),
            Annotation::Model(schema) => write!(f, "{}", schema.name()),
            Annotation::Interchange { module, name } => write!(f, "{module}::{name}"),
            Annotation::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            Annotation::Opaque(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct Metadata {
        rmse: f64,
    }

    impl SchemaModel for Metadata {
        const CAPABILITIES: ModelCapabilities = ModelCapabilities::VALIDATE_JSON;
    }

    #[test]
    fn test_display() {
        assert_eq!(Annotation::Text.to_string(), "String");
        assert_eq!(Annotation::union([Annotation::Text, Annotation::Frame]).to_string(), "String | Frame");
        assert_eq!(Annotation::tensor_model().to_string(), "safetensors::TensorModel");
        assert_eq!(Annotation::opaque("Widget").to_string(), "Widget");
        assert!(Annotation::model::<Metadata>().to_string().ends_with("Metadata"));
    }

    #[test]
    fn test_model_schema_validate() {
        let schema = ModelSchema::of::<Metadata>();
        assert_eq!(schema.capabilities(), ModelCapabilities::VALIDATE_JSON);

        let ok = schema.validate(serde_json::json!({"rmse": 0.13})).unwrap();
        assert_eq!(ok, serde_json::json!({"rmse": 0.13}));

        let err = schema.validate(serde_json::json!({"rmse": "high"})).unwrap_err();
        assert!(matches!(err, codec::Error::Validation { .. }));
    }
}
