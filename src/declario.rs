//! Declarative per-attribute IO.
//!
//! A [`Declared`] type lists its attributes and how to move them in and out of
//! a [`Record`]. [`Declario::decorate`] validates that list against the explicit
//! codecs, infers the rest, and returns an [`IoClass`] that saves and loads
//! instances as one archive with one entry per attribute.
//!
//! Validation happens once, at decoration time, in this order:
//!
//! 1. every explicit codec implements save and load
//! 2. no attribute is declared twice
//! 3. every attribute has a type annotation
//! 4. no annotation is a union, even where an explicit codec is given
//! 5. every explicit codec names a declared attribute
//! 6. every remaining attribute has an inferable codec

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use crate::annotation::Annotation;
use crate::codec::{check_protocol, Codec};
use crate::inference::{infer_codec, load_requires_model};
use crate::pack::{is_valid_name, Reader, Writer};
use crate::util::{DeclarationError, Error, Result};
use crate::value::{Attr, Record};

/// A declared attribute: its name and type annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    annotation: Option<Annotation>,
}

impl Attribute {
    /// Attribute annotated with the type `T`.
    pub fn of<T: Attr>(name: impl Into<String>) -> Self {
        Self::annotated(name, T::annotation())
    }

    /// Attribute with an explicit annotation.
    pub fn annotated(name: impl Into<String>, annotation: Annotation) -> Self {
        Self {
            name: name.into(),
            annotation: Some(annotation),
        }
    }

    /// Attribute without a type annotation.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
        }
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type annotation, if declared.
    pub fn annotation(&self) -> Option<&Annotation> {
        self.annotation.as_ref()
    }
}

/// A type whose attributes can be saved and loaded by an [`IoClass`].
pub trait Declared: Sized {
    /// Declared attributes, in constructor order.
    fn attributes() -> Vec<Attribute>;

    /// Current attribute values.
    fn to_record(&self) -> Result<Record>;

    /// Build an instance from loaded attribute values.
    fn from_record(record: Record) -> Result<Self>;
}

/// An attribute with its resolved codec.
#[derive(Debug, Clone)]
pub struct ResolvedAttribute {
    name: String,
    annotation: Annotation,
    codec: Arc<dyn Codec>,
    explicit: bool,
    requires_model: bool,
}

impl ResolvedAttribute {
    /// Attribute name, also its archive entry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// Codec used for this attribute.
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    /// Check if the codec was given explicitly rather than inferred.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// Check if loading passes the declared model to the codec.
    pub fn requires_model(&self) -> bool {
        self.requires_model
    }
}

/// Resolved attribute codecs, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct CodecMapping {
    attributes: Vec<ResolvedAttribute>,
}

impl CodecMapping {
    /// Iterate over resolved attributes.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedAttribute> {
        self.attributes.iter()
    }

    /// Look up an attribute.
    pub fn get(&self, name: &str) -> Option<&ResolvedAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Attribute names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Explicit codecs, applied when decorating a type.
#[derive(Debug, Clone, Default)]
pub struct Declario {
    io_modules: BTreeMap<String, Arc<dyn Codec>>,
}

impl Declario {
    /// No explicit codecs; every attribute is inferred.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(attribute, codec)` pairs.
    pub fn from_modules<K>(modules: impl IntoIterator<Item = (K, Arc<dyn Codec>)>) -> Self
    where
        K: Into<String>,
    {
        Self {
            io_modules: modules.into_iter().map(|(k, c)| (k.into(), c)).collect(),
        }
    }

    /// Use `codec` for the attribute `name`.
    pub fn with_codec(self, name: impl Into<String>, codec: impl Codec + 'static) -> Self {
        self.with_shared_codec(name, Arc::new(codec))
    }

    /// Use a shared `codec` for the attribute `name`.
    pub fn with_shared_codec(mut self, name: impl Into<String>, codec: Arc<dyn Codec>) -> Self {
        self.io_modules.insert(name.into(), codec);
        self
    }

    /// Explicit codecs by attribute name.
    pub fn io_modules(&self) -> &BTreeMap<String, Arc<dyn Codec>> {
        &self.io_modules
    }

    /// Validate `T`'s attributes and resolve their codecs.
    pub fn decorate<T: Declared>(&self) -> std::result::Result<IoClass<T>, DeclarationError> {
        let mapping = self.resolve(&T::attributes())?;
        tracing::debug!(
            type_name = std::any::type_name::<T>(),
            attributes = mapping.len(),
            explicit = self.io_modules.len(),
            "decorated"
        );
        Ok(IoClass {
            mapping,
            _type: PhantomData,
        })
    }

    /// Resolve codecs for an attribute list.
    pub fn resolve(&self, attributes: &[Attribute]) -> std::result::Result<CodecMapping, DeclarationError> {
        for (name, codec) in &self.io_modules {
            check_protocol(name, codec.as_ref())?;
        }

        let mut seen = HashSet::with_capacity(attributes.len());
        for attr in attributes {
            if !is_valid_name(&attr.name) {
                return Err(DeclarationError::InvalidAttributeName(attr.name.clone()));
            }
            if !seen.insert(attr.name.as_str()) {
                return Err(DeclarationError::DuplicateAttribute(attr.name.clone()));
            }
        }

        let mut annotated = Vec::with_capacity(attributes.len());
        for attr in attributes {
            let annotation = attr.annotation.as_ref().ok_or_else(|| DeclarationError::MissingTypeHint {
                attribute: attr.name.clone(),
            })?;
            annotated.push((attr.name.as_str(), annotation));
        }

        for (name, annotation) in &annotated {
            if annotation.is_union() {
                return Err(DeclarationError::UnsupportedUnionType {
                    attribute: name.to_string(),
                    annotation: annotation.to_string(),
                });
            }
        }

        let invalid: Vec<String> = self
            .io_modules
            .keys()
            .filter(|key| !seen.contains(key.as_str()))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(DeclarationError::InvalidAttributeKey { keys: invalid });
        }

        let mut resolved = Vec::with_capacity(annotated.len());
        for (name, annotation) in annotated {
            let (codec, explicit) = match self.io_modules.get(name) {
                Some(codec) => (Arc::clone(codec), true),
                None => (infer_codec(name, annotation)?, false),
            };
            resolved.push(ResolvedAttribute {
                name: name.to_string(),
                annotation: annotation.clone(),
                codec,
                explicit,
                requires_model: load_requires_model(annotation),
            });
        }
        Ok(CodecMapping { attributes: resolved })
    }
}

/// Decorate `T` with inferred codecs only.
pub fn decorate<T: Declared>() -> std::result::Result<IoClass<T>, DeclarationError> {
    Declario::new().decorate()
}

/// Archive IO for a decorated type.
pub struct IoClass<T> {
    mapping: CodecMapping,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for IoClass<T> {
    fn clone(&self) -> Self {
        Self {
            mapping: self.mapping.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for IoClass<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoClass")
            .field("type", &std::any::type_name::<T>())
            .field("mapping", &self.mapping)
            .finish()
    }
}

impl<T> IoClass<T> {
    /// Resolved codecs.
    pub fn mapping(&self) -> &CodecMapping {
        &self.mapping
    }

    /// Codec of one attribute.
    pub fn codec(&self, name: &str) -> Option<&Arc<dyn Codec>> {
        self.mapping.get(name).map(ResolvedAttribute::codec)
    }

    /// Resolved attributes, in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &ResolvedAttribute> {
        self.mapping.iter()
    }
}

impl<T: Declared> IoClass<T> {
    /// Save `value` to `path`, one archive entry per attribute.
    ///
    /// The archive only appears at `path` once every attribute is written.
    pub fn save(&self, value: &T, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let record = value.to_record()?;
        Writer::scoped(path, |writer| -> Result<()> {
            for attr in self.mapping.iter() {
                let data = record
                    .get(&attr.name)
                    .ok_or_else(|| Error::MissingValue(attr.name.clone()))?;
                let mut entry = writer.file(&attr.name)?;
                attr.codec.save(data, &mut entry)?;
                entry.finish()?;
                tracing::trace!(attribute = %attr.name, codec = attr.codec.name(), "saved attribute");
            }
            Ok(())
        })?;
        tracing::debug!(path = %path.display(), attributes = self.mapping.len(), "saved");
        Ok(())
    }

    /// Load an instance from `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<T> {
        let path = path.as_ref();
        let record = Reader::scoped(path, |reader| -> Result<Record> {
            let mut record = Record::new();
            for attr in self.mapping.iter() {
                let mut entry = reader.file(&attr.name)?;
                let value = if attr.requires_model {
                    attr.codec.load_with_model(&mut entry, &attr.annotation)?
                } else {
                    attr.codec.load(&mut entry)?
                };
                tracing::trace!(attribute = %attr.name, codec = attr.codec.name(), "loaded attribute");
                record.insert(attr.name.clone(), value);
            }
            Ok(record)
        })?;
        tracing::debug!(path = %path.display(), attributes = record.len(), "loaded");
        T::from_record(record)
    }

    /// Alias of [`IoClass::load`].
    pub fn from_file(&self, path: impl AsRef<Path>) -> Result<T> {
        self.load(path)
    }
}
