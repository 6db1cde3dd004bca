//! # classio
//!
//! Declarative per-attribute IO: save a struct's attributes into one archive
//! file, each attribute encoded by its own codec.
//!
//! Codecs are either given explicitly or inferred from the attribute's
//! declared type. Everything is validated once, when the type is decorated,
//! so save and load never hit a configuration error.
//!
//! ## Modules
//!
//! - [`declario`] - Decoration, codec mapping, save/load
//! - [`codec`] - The codec trait and built-in codecs
//! - [`inference`] - Default codec selection
//! - [`annotation`] - Declared type shapes and schema models
//! - [`value`] - Attribute values and records
//! - [`frame`] - Column-oriented frames and series
//! - [`tensor`] - Tensor models
//! - [`pack`] - Single-file multi-entry archive
//! - [`util`] - Errors
//!
//! ## Example
//!
//! ```ignore
//! use std::collections::BTreeMap;
//! use classio::codec::YamlCodec;
//! use classio::{declario, Frame};
//!
//! declario! {
//!     pub struct Experiment {
//!         pub documentation: String,
//!         pub config: BTreeMap<String, String>,
//!         pub df: Frame,
//!     }
//!     codecs {
//!         "config" => YamlCodec,
//!     }
//! }
//!
//! experiment.save("experiment.cpack")?;
//! let loaded = Experiment::from_file("experiment.cpack")?;
//! ```

pub mod annotation;
pub mod codec;
pub mod declario;
pub mod frame;
pub mod inference;
pub mod pack;
pub mod tensor;
pub mod util;
pub mod value;

#[doc(hidden)]
pub mod macros;

// Re-export commonly used types
pub use annotation::{Annotation, ModelCapabilities, ModelSchema, SchemaModel};
pub use codec::Codec;
pub use declario::{decorate, Attribute, CodecMapping, Declared, Declario, IoClass, ResolvedAttribute};
pub use frame::{Column, DType, Frame, Series};
pub use tensor::TensorModel;
pub use util::{DeclarationError, Error, Result};
pub use value::{Attr, Record, Value};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::annotation::{Annotation, ModelCapabilities, SchemaModel};
    pub use crate::codec::{Codec, JsonCodec, TextCodec, YamlCodec};
    pub use crate::declario::{decorate, Attribute, Declared, Declario, IoClass};
    pub use crate::frame::{Column, Frame, Series};
    pub use crate::tensor::TensorModel;
    pub use crate::util::{DeclarationError, Error, Result};
    pub use crate::value::{Attr, Record, Value};
    pub use crate::declario;
}
