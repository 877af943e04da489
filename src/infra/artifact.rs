// ============================================================
// Layer 6 — Model Artifacts (layers-model bundle)
// ============================================================
// The portable form of a trained model, loadable by the web
// inference runtime without any of this crate's code:
//
//   model.json   — topology + weights manifest
//   weights.bin  — every weight tensor as little-endian f32,
//                  concatenated in manifest order
//
// model.json layout:
//   {
//     "modelTopology":   { Sequential layer graph },
//     "format":          "layers-model",
//     "generatedBy":     "clinic-trainer v0.1.0",
//     "convertedBy":     null,
//     "weightsManifest": [ { "paths": ["./weights.bin"],
//                            "weights": [ {name, shape, dtype}, ... ] } ]
//   }
//
// Weight order is the order the model lists its layers, so the
// same trained weights always give the same weights.bin bytes.

use burn::{module::Param, nn::Linear, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::error::ExportError;

pub const MODEL_FILE:   &str = "model.json";
pub const WEIGHTS_FILE: &str = "weights.bin";
pub const FORMAT:       &str = "layers-model";

/// Runtime version string written into the topology
pub const KERAS_VERSION: &str = "tfjs-layers 4.22.0";

pub fn generated_by() -> String {
    format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

// ─── Weights ─────────────────────────────────────────────────────────────────
/// One weight tensor pulled off the device
#[derive(Debug, Clone, PartialEq)]
pub struct NamedWeight {
    pub name:   String,
    pub shape:  Vec<usize>,
    pub values: Vec<f32>,
}

/// Manifest entry describing one tensor inside weights.bin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightSpec {
    pub name:  String,
    pub shape: Vec<usize>,
    pub dtype: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightsManifestGroup {
    pub paths:   Vec<String>,
    pub weights: Vec<WeightSpec>,
}

/// model.json, field order as the runtime writes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelJson {
    pub model_topology:   Value,
    pub format:           String,
    pub generated_by:     String,
    pub converted_by:     Option<String>,
    pub weights_manifest: Vec<WeightsManifestGroup>,
}

/// Everything a save handler needs: raw topology, per-tensor specs
/// and a single concatenated weight buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifacts {
    pub model_topology: Value,
    pub weight_specs:   Vec<WeightSpec>,
    pub weight_data:    Vec<u8>,
}

impl ModelArtifacts {
    /// Collect topology and weights from a model
    pub fn from_model<B: Backend, M: ExportableModel<B>>(model: &M) -> Result<Self, ExportError> {
        Ok(Self::from_parts(model.topology(), model.named_weights()?))
    }

    pub fn from_parts(model_topology: Value, weights: Vec<NamedWeight>) -> Self {
        let byte_len: usize = weights.iter().map(|w| w.values.len() * 4).sum();
        let mut weight_data  = Vec::with_capacity(byte_len);
        let mut weight_specs = Vec::with_capacity(weights.len());

        for w in weights {
            for v in &w.values {
                weight_data.extend_from_slice(&v.to_le_bytes());
            }
            weight_specs.push(WeightSpec {
                name:  w.name,
                shape: w.shape,
                dtype: "float32".to_string(),
            });
        }

        Self { model_topology, weight_specs, weight_data }
    }

    /// The model.json document pointing at `./weights.bin`
    pub fn model_json(&self) -> ModelJson {
        ModelJson {
            model_topology:   self.model_topology.clone(),
            format:           FORMAT.to_string(),
            generated_by:     generated_by(),
            converted_by:     None,
            weights_manifest: vec![WeightsManifestGroup {
                paths:   vec![format!("./{WEIGHTS_FILE}")],
                weights: self.weight_specs.clone(),
            }],
        }
    }

    /// Total number of f32 values described by the specs
    pub fn parameter_count(&self) -> usize {
        self.weight_specs
            .iter()
            .map(|s| s.shape.iter().product::<usize>())
            .sum()
    }
}

// ─── ExportableModel ─────────────────────────────────────────────────────────
/// A model that can describe itself as a Sequential layer graph.
///
/// `named_weights` must list tensors in the same order the layers
/// appear in `topology`.
pub trait ExportableModel<B: Backend>: Module<B> {
    fn topology(&self) -> Value;
    fn named_weights(&self) -> Result<Vec<NamedWeight>, ExportError>;
}

/// Copy a parameter tensor to host memory
pub fn read_param<B: Backend, const D: usize>(
    name:  &str,
    param: &Param<Tensor<B, D>>,
) -> Result<NamedWeight, ExportError> {
    let tensor = param.val();
    let shape  = tensor.dims().to_vec();
    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| ExportError::Weights { name: name.to_string(), message: format!("{e:?}") })?;
    Ok(NamedWeight { name: name.to_string(), shape, values })
}

/// `<layer>/kernel` and `<layer>/bias` of a dense layer
pub fn dense_weights<B: Backend>(layer_name: &str, layer: &Linear<B>) -> Result<Vec<NamedWeight>, ExportError> {
    let mut out = vec![read_param(&format!("{layer_name}/kernel"), &layer.weight)?];
    if let Some(bias) = &layer.bias {
        out.push(read_param(&format!("{layer_name}/bias"), bias)?);
    }
    Ok(out)
}

// ─── Topology builders ───────────────────────────────────────────────────────
pub fn sequential(name: &str, layers: Vec<Value>) -> Value {
    json!({
        "class_name": "Sequential",
        "config": { "name": name, "layers": layers },
        "keras_version": KERAS_VERSION,
        "backend": "tensor_flow.js",
    })
}

pub fn embedding_layer(name: &str, input_dim: usize, output_dim: usize, input_length: usize) -> Value {
    json!({
        "class_name": "Embedding",
        "config": {
            "name": name,
            "trainable": true,
            "batch_input_shape": [null, input_length],
            "dtype": "float32",
            "input_dim": input_dim,
            "output_dim": output_dim,
            "input_length": input_length,
            "mask_zero": null,
            "embeddings_initializer": {
                "class_name": "RandomUniform",
                "config": { "minval": -0.05, "maxval": 0.05, "seed": null }
            },
        }
    })
}

pub fn global_average_pooling_layer(name: &str) -> Value {
    json!({
        "class_name": "GlobalAveragePooling1D",
        "config": { "name": name, "trainable": true, "data_format": "channels_last" }
    })
}

/// Dense layer; `input_dim` is set only on the first layer of a model
pub fn dense_layer(name: &str, units: usize, activation: &str, input_dim: Option<usize>) -> Value {
    let mut config = json!({
        "name": name,
        "trainable": true,
        "units": units,
        "activation": activation,
        "use_bias": true,
        "kernel_initializer": {
            "class_name": "GlorotUniform",
            "config": { "seed": null }
        },
        "bias_initializer": { "class_name": "Zeros", "config": {} },
    });
    if let Some(dim) = input_dim {
        config["batch_input_shape"] = json!([null, dim]);
        config["dtype"] = json!("float32");
    }
    json!({ "class_name": "Dense", "config": config })
}

pub fn dropout_layer(name: &str, rate: f64) -> Value {
    json!({
        "class_name": "Dropout",
        "config": { "name": name, "trainable": true, "rate": rate, "noise_shape": null, "seed": null }
    })
}
