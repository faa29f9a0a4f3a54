//! Model weight loading from serialized safetensors assets.

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use safetensors::SafeTensors;
use std::collections::HashMap;
use tracing::debug;

/// Parses a safetensors byte blob into a `VarBuilder` on the given device.
///
/// The asset arrives as an opaque in-memory blob from the hosting
/// application (or the filesystem adapter); nothing here touches disk.
///
/// # Errors
///
/// Returns an error if the blob is not valid safetensors data or a tensor
/// cannot be materialized on the device.
pub fn var_builder_from_bytes(asset: &[u8], device: &Device) -> Result<VarBuilder<'static>> {
    debug!("Parsing model asset ({} bytes)", asset.len());

    let tensors = SafeTensors::deserialize(asset).context("Failed to parse model asset")?;

    let mut tensor_map: HashMap<String, Tensor> = HashMap::new();

    for name in tensors.names() {
        let view = tensors
            .tensor(name)
            .with_context(|| format!("Failed to get tensor '{name}'"))?;

        let dtype = safetensors_dtype_to_candle(view.dtype())?;
        let shape: Vec<usize> = view.shape().to_vec();

        let tensor = Tensor::from_raw_buffer(view.data(), dtype, &shape, device)
            .with_context(|| format!("Failed to create tensor '{name}'"))?;

        tensor_map.insert(name.to_string(), tensor);
    }

    Ok(VarBuilder::from_tensors(tensor_map, DType::F32, device))
}

/// Converts safetensors dtype to candle dtype.
fn safetensors_dtype_to_candle(dtype: safetensors::Dtype) -> Result<DType> {
    use safetensors::Dtype as S;
    match dtype {
        S::F32 => Ok(DType::F32),
        S::F64 => Ok(DType::F64),
        S::F16 => Ok(DType::F16),
        S::BF16 => Ok(DType::BF16),
        S::I64 => Ok(DType::I64),
        S::U8 => Ok(DType::U8),
        S::U32 => Ok(DType::U32),
        other => anyhow::bail!("Unsupported dtype: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::expect_used)]
    fn serialized_test_asset() -> Vec<u8> {
        use safetensors::serialize;
        use safetensors::tensor::TensorView;

        let data: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0];
        let data_bytes: &[u8] = bytemuck::cast_slice(&data);

        let tensor = TensorView::new(safetensors::Dtype::F32, vec![2, 2], data_bytes)
            .expect("valid tensor view");

        let tensors = HashMap::from([("weight".to_string(), tensor)]);
        serialize(&tensors, &None).expect("serialize")
    }

    #[test]
    fn test_parse_valid_asset() {
        let asset = serialized_test_asset();
        let result = var_builder_from_bytes(&asset, &Device::Cpu);
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_garbage_asset_fails() {
        let result = var_builder_from_bytes(b"definitely not safetensors", &Device::Cpu);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_empty_asset_fails() {
        let result = var_builder_from_bytes(&[], &Device::Cpu);
        assert!(result.is_err());
    }
}
