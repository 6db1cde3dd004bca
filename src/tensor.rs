//! Tensor models in the safetensors interchange format.

use std::collections::BTreeMap;

use ndarray::ArrayD;

/// Module that defines the interchange model type, as seen by inference.
pub const TENSOR_MODEL_MODULE: &str = "safetensors";

/// Type name of the interchange model, as seen by inference.
pub const TENSOR_MODEL_NAME: &str = "TensorModel";

/// A trained model graph: named f32 tensors plus string metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TensorModel {
    metadata: BTreeMap<String, String>,
    tensors: BTreeMap<String, ArrayD<f32>>,
}

impl TensorModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Add a tensor.
    pub fn with_tensor(mut self, name: impl Into<String>, tensor: ArrayD<f32>) -> Self {
        self.insert(name, tensor);
        self
    }

    /// Insert a tensor, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, tensor: ArrayD<f32>) -> Option<ArrayD<f32>> {
        self.tensors.insert(name.into(), tensor)
    }

    /// Look up a tensor.
    pub fn tensor(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.tensors.get(name)
    }

    /// All tensors by name.
    pub fn tensors(&self) -> &BTreeMap<String, ArrayD<f32>> {
        &self.tensors
    }

    /// Model metadata.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Number of tensors.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Check if the model has no tensors.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Total number of parameters across all tensors.
    pub fn num_parameters(&self) -> usize {
        self.tensors.values().map(|t| t.len()).sum()
    }
}
