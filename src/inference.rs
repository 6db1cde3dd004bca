//! Default codec selection from declared attribute types.
//!
//! Predicates are tried in a fixed order and the first match wins:
//!
//! | Annotation                                   | Codec                      |
//! |----------------------------------------------|----------------------------|
//! | text                                         | [`TextCodec`]              |
//! | mapping                                      | [`JsonCodec`]              |
//! | frame                                        | [`FrameCodec`]             |
//! | series                                       | [`SeriesCodec`]            |
//! | array                                        | [`ArrayCodec`]             |
//! | model validating from JSON                   | [`SchemaJsonCodec`]        |
//! | `safetensors::TensorModel`                   | [`TensorModelCodec`]       |
//! | dict-mixin model with a YAML serializer      | [`SchemaYamlCodec`]        |
//! | dict-mixin model with a JSON serializer      | [`SchemaJsonVariantCodec`] |
//!
//! Anything else is an [`DeclarationError::UnresolvedCodec`].

use std::sync::Arc;

use crate::annotation::{Annotation, ModelCapabilities};
use crate::codec::{
    ArrayCodec, Codec, FrameCodec, JsonCodec, SchemaJsonCodec, SchemaJsonVariantCodec, SchemaYamlCodec,
    SeriesCodec, TensorModelCodec, TextCodec,
};
use crate::tensor::{TENSOR_MODEL_MODULE, TENSOR_MODEL_NAME};
use crate::util::DeclarationError;

fn capabilities(annotation: &Annotation) -> ModelCapabilities {
    annotation
        .as_model()
        .map_or(ModelCapabilities::NONE, |schema| schema.capabilities())
}

fn is_protocol_a(annotation: &Annotation) -> bool {
    capabilities(annotation).validate_json
}

fn is_yaml_mixin(annotation: &Annotation) -> bool {
    let caps = capabilities(annotation);
    caps.dict_mixin && caps.to_yaml
}

fn is_json_mixin(annotation: &Annotation) -> bool {
    let caps = capabilities(annotation);
    caps.dict_mixin && caps.to_json
}

fn is_tensor_model(annotation: &Annotation) -> bool {
    matches!(
        annotation,
        Annotation::Interchange { module, name } if *module == TENSOR_MODEL_MODULE && *name == TENSOR_MODEL_NAME
    )
}

/// Pick the default codec for an attribute.
pub fn infer_codec(name: &str, annotation: &Annotation) -> Result<Arc<dyn Codec>, DeclarationError> {
    let codec: Arc<dyn Codec> = match annotation {
        Annotation::Text => Arc::new(TextCodec),
        Annotation::Mapping => Arc::new(JsonCodec::new()),
        Annotation::Frame => Arc::new(FrameCodec::new()),
        Annotation::Series => Arc::new(SeriesCodec::new()),
        Annotation::Array => Arc::new(ArrayCodec),
        a if is_protocol_a(a) => Arc::new(SchemaJsonCodec),
        a if is_tensor_model(a) => Arc::new(TensorModelCodec),
        a if is_yaml_mixin(a) => Arc::new(SchemaYamlCodec),
        a if is_json_mixin(a) => Arc::new(SchemaJsonVariantCodec),
        _ => {
            return Err(DeclarationError::UnresolvedCodec {
                attribute: name.to_string(),
                annotation: annotation.to_string(),
            })
        }
    };
    tracing::trace!(attribute = name, %annotation, codec = codec.name(), "inferred codec");
    Ok(codec)
}

/// Whether loading an attribute of this type passes the model to its codec.
pub fn load_requires_model(annotation: &Annotation) -> bool {
    is_protocol_a(annotation) || is_yaml_mixin(annotation) || is_json_mixin(annotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{ModelSchema, SchemaModel};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Everything;

    impl SchemaModel for Everything {
        const CAPABILITIES: ModelCapabilities = ModelCapabilities {
            validate_json: true,
            dict_mixin: true,
            to_yaml: true,
            to_json: true,
        };
    }

    #[derive(Serialize, Deserialize)]
    struct Plain;

    impl SchemaModel for Plain {
        const CAPABILITIES: ModelCapabilities = ModelCapabilities::NONE;
    }

    fn mixin(capabilities: ModelCapabilities) -> Annotation {
        Annotation::Model(ModelSchema::new("Mixin", capabilities, |doc| Ok(doc)))
    }

    fn inferred(annotation: &Annotation) -> &'static str {
        infer_codec("x", annotation).map(|c| c.name()).unwrap_or("<none>")
    }

    #[test]
    fn test_builtin_shapes() {
        assert_eq!(inferred(&Annotation::Text), "text");
        assert_eq!(inferred(&Annotation::Mapping), "json");
        assert_eq!(inferred(&Annotation::Frame), "frame");
        assert_eq!(inferred(&Annotation::Series), "series");
        assert_eq!(inferred(&Annotation::Array), "array");
        assert_eq!(inferred(&Annotation::tensor_model()), "tensor_model");
    }

    #[test]
    fn test_model_precedence() {
        assert_eq!(inferred(&Annotation::model::<Everything>()), "schema_json");
        assert_eq!(inferred(&mixin(ModelCapabilities::YAML_MIXIN)), "schema_yaml");
        assert_eq!(inferred(&mixin(ModelCapabilities::JSON_MIXIN)), "schema_json_variant");

        let both = ModelCapabilities { to_json: true, ..ModelCapabilities::YAML_MIXIN };
        assert_eq!(inferred(&mixin(both)), "schema_yaml");

        let no_marker = ModelCapabilities { dict_mixin: false, ..ModelCapabilities::YAML_MIXIN };
        assert_eq!(inferred(&mixin(no_marker)), "<none>");
    }

    #[test]
    fn test_unresolved() {
        let err = infer_codec("widget", &Annotation::opaque("Widget")).unwrap_err();
        assert_eq!(
            err,
            DeclarationError::UnresolvedCodec { attribute: "widget".into(), annotation: "Widget".into() }
        );
        assert!(infer_codec("m", &Annotation::model::<Plain>()).is_err());

        let other_module = Annotation::Interchange { module: "onnx", name: "TensorModel" };
        assert!(infer_codec("m", &other_module).is_err());
    }

    #[test]
    fn test_load_requires_model() {
        assert!(load_requires_model(&Annotation::model::<Everything>()));
        assert!(load_requires_model(&mixin(ModelCapabilities::YAML_MIXIN)));
        assert!(load_requires_model(&mixin(ModelCapabilities::JSON_MIXIN)));
        assert!(!load_requires_model(&Annotation::model::<Plain>()));
        assert!(!load_requires_model(&Annotation::tensor_model()));
        assert!(!load_requires_model(&Annotation::Frame));
    }

    #[test]
    fn test_inference_is_deterministic() {
        for annotation in [Annotation::Text, Annotation::Frame, Annotation::model::<Everything>()] {
            assert_eq!(inferred(&annotation), inferred(&annotation));
        }
    }
}
