//! Safetensors-backed codecs for arrays and tensor models.

use std::collections::HashMap;
use std::io::{Read, Write};

use ndarray::{ArrayD, IxDyn};
use safetensors::tensor::{SafeTensors, TensorView};
use safetensors::Dtype;

use super::{mismatch, Capabilities, Codec, Error, Result};
use crate::tensor::TensorModel;
use crate::value::Value;

/// Tensor name an array is stored under.
const ARRAY_TENSOR: &str = "array";

fn read_all(src: &mut dyn Read) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    src.read_to_end(&mut buffer)?;
    Ok(buffer)
}

fn expect_dtype(name: &str, view: &TensorView<'_>, dtype: Dtype) -> Result<()> {
    if view.dtype() != dtype {
        return Err(Error::Other(format!(
            "tensor {name} has dtype {:?}, expected {dtype:?}",
            view.dtype()
        )));
    }
    Ok(())
}

/// N-dimensional f64 arrays as a single-tensor safetensors file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayCodec;

impl Codec for ArrayCodec {
    fn name(&self) -> &'static str {
        "array"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn save(&self, data: &Value, dst: &mut dyn Write) -> Result<()> {
        let Value::Array(array) = data else {
            return Err(mismatch(self.name(), "array", data));
        };
        let values: Vec<f64> = array.iter().copied().collect();
        let view = TensorView::new(Dtype::F64, array.shape().to_vec(), bytemuck::cast_slice(values.as_slice()))?;
        let bytes = safetensors::serialize([(ARRAY_TENSOR, view)], &None)?;
        dst.write_all(&bytes)?;
        Ok(())
    }

    fn load(&self, src: &mut dyn Read) -> Result<Value> {
        let buffer = read_all(src)?;
        let tensors = SafeTensors::deserialize(&buffer)?;
        let view = tensors.tensor(ARRAY_TENSOR)?;
        expect_dtype(ARRAY_TENSOR, &view, Dtype::F64)?;
        let values: Vec<f64> = bytemuck::pod_collect_to_vec(view.data());
        let array = ArrayD::from_shape_vec(IxDyn(view.shape()), values)?;
        Ok(Value::Array(array))
    }
}

/// [`TensorModel`]s: every tensor as f32, metadata in the safetensors header.
#[derive(Debug, Clone, Copy, Default)]
pub struct TensorModelCodec;

impl Codec for TensorModelCodec {
    fn name(&self) -> &'static str {
        "tensor_model"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn save(&self, data: &Value, dst: &mut dyn Write) -> Result<()> {
        let Value::Tensors(model) = data else {
            return Err(mismatch(self.name(), "tensors", data));
        };

        let storage: Vec<(&str, Vec<f32>, Vec<usize>)> = model
            .tensors()
            .iter()
            .map(|(name, tensor)| (name.as_str(), tensor.iter().copied().collect(), tensor.shape().to_vec()))
            .collect();

        let mut views = Vec::with_capacity(storage.len());
        for (name, values, shape) in &storage {
            views.push((*name, TensorView::new(Dtype::F32, shape.clone(), bytemuck::cast_slice(values.as_slice()))?));
        }

        let metadata: Option<HashMap<String, String>> = if model.metadata().is_empty() {
            None
        } else {
            Some(model.metadata().iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        };

        let bytes = safetensors::serialize(views, &metadata)?;
        dst.write_all(&bytes)?;
        Ok(())
    }

    fn load(&self, src: &mut dyn Read) -> Result<Value> {
        let buffer = read_all(src)?;
        let (_, header) = SafeTensors::read_metadata(&buffer)?;
        let tensors = SafeTensors::deserialize(&buffer)?;

        let mut model = TensorModel::new();
        if let Some(metadata) = header.metadata() {
            for (key, value) in metadata {
                model = model.with_metadata(key.clone(), value.clone());
            }
        }
        for (name, view) in tensors.tensors() {
            expect_dtype(&name, &view, Dtype::F32)?;
            let values: Vec<f32> = bytemuck::pod_collect_to_vec(view.data());
            let tensor = ArrayD::from_shape_vec(IxDyn(view.shape()), values)?;
            model.insert(name, tensor);
        }
        Ok(Value::Tensors(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_roundtrip() -> Result<()> {
        let array = ndarray::array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn();
        let mut buf = Vec::new();
        ArrayCodec.save(&Value::Array(array.clone()), &mut buf)?;
        assert_eq!(ArrayCodec.load(&mut buf.as_slice())?, Value::Array(array));
        Ok(())
    }

    #[test]
    fn test_transposed_array_keeps_logical_order() -> Result<()> {
        let array = ndarray::array![[1.0, 2.0], [3.0, 4.0]].reversed_axes().into_dyn();
        let mut buf = Vec::new();
        ArrayCodec.save(&Value::Array(array.clone()), &mut buf)?;
        assert_eq!(ArrayCodec.load(&mut buf.as_slice())?, Value::Array(array));
        Ok(())
    }

    #[test]
    fn test_tensor_model_roundtrip() -> Result<()> {
        let model = TensorModel::new()
            .with_metadata("producer", "iris-logreg")
            .with_tensor("coef", ArrayD::from_shape_vec(IxDyn(&[3, 4]), (0..12).map(|v| v as f32).collect())?)
            .with_tensor("intercept", ArrayD::zeros(IxDyn(&[3])));
        let mut buf = Vec::new();
        TensorModelCodec.save(&Value::Tensors(model.clone()), &mut buf)?;
        assert_eq!(TensorModelCodec.load(&mut buf.as_slice())?, Value::Tensors(model));
        Ok(())
    }

    #[test]
    fn test_array_rejects_f32_tensors() -> Result<()> {
        let model = TensorModel::new().with_tensor("array", ArrayD::zeros(IxDyn(&[2])));
        let mut buf = Vec::new();
        TensorModelCodec.save(&Value::Tensors(model), &mut buf)?;
        assert!(matches!(ArrayCodec.load(&mut buf.as_slice()), Err(Error::Other(_))));
        Ok(())
    }
}
