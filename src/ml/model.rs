use burn::{
    module::Param,
    nn::{Embedding, EmbeddingConfig, Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{relu, softmax},
};
use rand::{rngs::StdRng, Rng};
use serde_json::Value;

use crate::domain::error::ExportError;
use crate::infra::artifact::{
    dense_layer, dense_weights, dropout_layer, embedding_layer, global_average_pooling_layer,
    read_param, sequential, ExportableModel, NamedWeight,
};

/// Half-width of the uniform range used for embedding rows
pub const EMBEDDING_INIT_RANGE: f32 = 0.05;

/// A classifier the trainer can fit.
///
/// `forward_logits` returns un-normalised class scores; softmax is
/// applied by the loss during training and by `predict_proba` at
/// inference. A dropout RNG is only passed during training.
pub trait ClassifierModel<B: Backend>: Module<B> {
    fn forward_logits(&self, features: Tensor<B, 2>, dropout_rng: Option<&mut StdRng>) -> Tensor<B, 2>;

    fn predict_proba(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.forward_logits(features, None), 1)
    }
}

// ─── Seeded initialisation ───────────────────────────────────────────────────
fn uniform_tensor<B: Backend>(
    shape:  [usize; 2],
    limit:  f32,
    rng:    &mut StdRng,
    device: &B::Device,
) -> Tensor<B, 2> {
    let values: Vec<f32> = (0..shape[0] * shape[1])
        .map(|_| rng.gen_range(-limit..limit))
        .collect();
    Tensor::<B, 1>::from_floats(values.as_slice(), device).reshape(shape)
}

/// Dense layer with a Glorot-uniform kernel and a zero bias
fn dense<B: Backend>(d_in: usize, d_out: usize, rng: &mut StdRng, device: &B::Device) -> Linear<B> {
    let limit = (6.0 / (d_in + d_out) as f64).sqrt() as f32;
    let mut layer = LinearConfig::new(d_in, d_out)
        .with_initializer(Initializer::Zeros)
        .init(device);
    layer.weight = Param::from_tensor(uniform_tensor([d_in, d_out], limit, rng, device));
    layer.bias   = Some(Param::from_tensor(Tensor::zeros([d_out], device)));
    layer
}

/// Inverted dropout: zero each unit with probability `rate` and
/// scale the survivors by 1 / (1 - rate)
fn dropout<B: Backend>(x: Tensor<B, 2>, rate: f64, rng: &mut StdRng) -> Tensor<B, 2> {
    let [rows, cols] = x.dims();
    let keep_scale   = (1.0 / (1.0 - rate)) as f32;
    let mask: Vec<f32> = (0..rows * cols)
        .map(|_| if rng.gen::<f64>() < rate { 0.0 } else { keep_scale })
        .collect();
    let mask = Tensor::<B, 1>::from_floats(mask.as_slice(), &x.device()).reshape([rows, cols]);
    x * mask
}

// ============================================================
// Triage text classifier
// ============================================================
//   tokens [batch, max_len]
//     → Embedding        [batch, max_len, embedding_dim]
//     → mean over tokens [batch, embedding_dim]
//     → Dense + ReLU     [batch, hidden_units]
//     → Dense            [batch, num_classes]   (softmax at inference)
//
// Padding positions (id 0) are included in the average, so the
// embedding row 0 is trained like any other row.

#[derive(Config, Debug)]
pub struct TextClassifierConfig {
    /// Vocabulary size + 1 (row 0 is padding)
    pub embedding_rows: usize,
    pub num_classes:    usize,
    #[config(default = 20)]
    pub max_len:        usize,
    #[config(default = 16)]
    pub embedding_dim:  usize,
    #[config(default = 16)]
    pub hidden_units:   usize,
}

impl TextClassifierConfig {
    pub fn init<B: Backend>(&self, rng: &mut StdRng, device: &B::Device) -> TextClassifier<B> {
        let mut embedding = EmbeddingConfig::new(self.embedding_rows, self.embedding_dim)
            .with_initializer(Initializer::Zeros)
            .init(device);
        embedding.weight = Param::from_tensor(uniform_tensor(
            [self.embedding_rows, self.embedding_dim],
            EMBEDDING_INIT_RANGE,
            rng,
            device,
        ));
        let hidden = dense(self.embedding_dim, self.hidden_units, rng, device);
        let output = dense(self.hidden_units, self.num_classes, rng, device);

        TextClassifier { embedding, hidden, output, max_len: self.max_len }
    }
}

#[derive(Module, Debug)]
pub struct TextClassifier<B: Backend> {
    pub embedding: Embedding<B>,
    pub hidden:    Linear<B>,
    pub output:    Linear<B>,
    pub max_len:   usize,
}

impl<B: Backend> ClassifierModel<B> for TextClassifier<B> {
    /// features: [batch, max_len] token ids stored as floats
    fn forward_logits(&self, features: Tensor<B, 2>, _dropout_rng: Option<&mut StdRng>) -> Tensor<B, 2> {
        let embedded = self.embedding.forward(features.int());
        let [batch, _, width] = embedded.dims();
        let pooled = embedded.mean_dim(1).reshape([batch, width]);
        let hidden = relu(self.hidden.forward(pooled));
        self.output.forward(hidden)
    }
}

impl<B: Backend> ExportableModel<B> for TextClassifier<B> {
    fn topology(&self) -> Value {
        let [rows, width] = self.embedding.weight.dims();
        let hidden_units  = self.hidden.weight.dims()[1];
        let num_classes   = self.output.weight.dims()[1];
        sequential("triage_classifier", vec![
            embedding_layer("embedding", rows, width, self.max_len),
            global_average_pooling_layer("global_average_pooling1d"),
            dense_layer("dense_hidden", hidden_units, "relu", None),
            dense_layer("dense_output", num_classes, "softmax", None),
        ])
    }

    fn named_weights(&self) -> Result<Vec<NamedWeight>, ExportError> {
        let mut weights = vec![read_param("embedding/embeddings", &self.embedding.weight)?];
        weights.extend(dense_weights("dense_hidden", &self.hidden)?);
        weights.extend(dense_weights("dense_output", &self.output)?);
        Ok(weights)
    }
}

// ============================================================
// Mental-health risk classifier
// ============================================================
//   features [batch, width]
//     → Dense + ReLU   [batch, 16]
//     → Dropout(0.2)   training only
//     → Dense + ReLU   [batch, 8]
//     → Dense          [batch, 2]   (softmax at inference)

#[derive(Config, Debug)]
pub struct TabularClassifierConfig {
    pub input_width:         usize,
    #[config(default = 2)]
    pub num_classes:         usize,
    #[config(default = 16)]
    pub hidden_units:        usize,
    #[config(default = 8)]
    pub second_hidden_units: usize,
    #[config(default = 0.2)]
    pub dropout:             f64,
}

impl TabularClassifierConfig {
    pub fn init<B: Backend>(&self, rng: &mut StdRng, device: &B::Device) -> TabularClassifier<B> {
        let hidden        = dense(self.input_width, self.hidden_units, rng, device);
        let second_hidden = dense(self.hidden_units, self.second_hidden_units, rng, device);
        let output        = dense(self.second_hidden_units, self.num_classes, rng, device);
        TabularClassifier { hidden, second_hidden, output, dropout: self.dropout }
    }
}

#[derive(Module, Debug)]
pub struct TabularClassifier<B: Backend> {
    pub hidden:        Linear<B>,
    pub second_hidden: Linear<B>,
    pub output:        Linear<B>,
    pub dropout:       f64,
}

impl<B: Backend> ClassifierModel<B> for TabularClassifier<B> {
    fn forward_logits(&self, features: Tensor<B, 2>, dropout_rng: Option<&mut StdRng>) -> Tensor<B, 2> {
        let x = relu(self.hidden.forward(features));
        let x = match dropout_rng {
            Some(rng) if self.dropout > 0.0 => dropout(x, self.dropout, rng),
            _ => x,
        };
        let x = relu(self.second_hidden.forward(x));
        self.output.forward(x)
    }
}

impl<B: Backend> ExportableModel<B> for TabularClassifier<B> {
    fn topology(&self) -> Value {
        let [input_width, hidden_units] = self.hidden.weight.dims();
        let second_hidden_units         = self.second_hidden.weight.dims()[1];
        let num_classes                 = self.output.weight.dims()[1];
        sequential("mental_health_classifier", vec![
            dense_layer("dense_hidden", hidden_units, "relu", Some(input_width)),
            dropout_layer("dropout", self.dropout),
            dense_layer("dense_second_hidden", second_hidden_units, "relu", None),
            dense_layer("dense_output", num_classes, "softmax", None),
        ])
    }

    fn named_weights(&self) -> Result<Vec<NamedWeight>, ExportError> {
        let mut weights = dense_weights("dense_hidden", &self.hidden)?;
        weights.extend(dense_weights("dense_second_hidden", &self.second_hidden)?);
        weights.extend(dense_weights("dense_output", &self.output)?);
        Ok(weights)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use rand::SeedableRng;

    type TestBackend = NdArray;

    fn text_model(seed: u64) -> TextClassifier<TestBackend> {
        let mut rng = StdRng::seed_from_u64(seed);
        TextClassifierConfig::new(7, 3).init(&mut rng, &Default::default())
    }

    fn tabular_model(seed: u64) -> TabularClassifier<TestBackend> {
        let mut rng = StdRng::seed_from_u64(seed);
        TabularClassifierConfig::new(5).init(&mut rng, &Default::default())
    }

    #[test]
    fn test_text_output_shape_and_probabilities() {
        let model    = text_model(1);
        let features = Tensor::<TestBackend, 2>::zeros([4, 20], &Default::default());
        let probs    = model.predict_proba(features);
        assert_eq!(probs.dims(), [4, 3]);

        let sums: Vec<f32> = probs.sum_dim(1).into_data().to_vec().unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_tabular_output_shape() {
        let model  = tabular_model(1);
        let logits = model.forward_logits(Tensor::ones([3, 5], &Default::default()), None);
        assert_eq!(logits.dims(), [3, 2]);
    }

    #[test]
    fn test_seeded_init_is_reproducible() {
        let a = text_model(42).named_weights().unwrap();
        let b = text_model(42).named_weights().unwrap();
        let c = text_model(43).named_weights().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_init_ranges() {
        let weights = text_model(3).named_weights().unwrap();
        let embeddings = &weights[0];
        assert_eq!(embeddings.shape, vec![7, 16]);
        assert!(embeddings.values.iter().all(|v| v.abs() <= EMBEDDING_INIT_RANGE));

        // dense_hidden/bias starts at zero
        assert_eq!(weights[2].name, "dense_hidden/bias");
        assert!(weights[2].values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_weight_order_matches_topology() {
        let model   = tabular_model(9);
        let names: Vec<String> = model.named_weights().unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec![
            "dense_hidden/kernel", "dense_hidden/bias",
            "dense_second_hidden/kernel", "dense_second_hidden/bias",
            "dense_output/kernel", "dense_output/bias",
        ]);

        let topology = model.topology();
        let layers   = topology["config"]["layers"].as_array().unwrap();
        assert_eq!(layers[0]["config"]["batch_input_shape"][1], 5);
        assert_eq!(layers[1]["class_name"], "Dropout");
        assert_eq!(layers[3]["config"]["units"], 2);
        assert_eq!(layers[3]["config"]["activation"], "softmax");
    }

    #[test]
    fn test_text_topology_input_matches_max_len() {
        let topology = text_model(0).topology();
        let layers   = topology["config"]["layers"].as_array().unwrap();
        assert_eq!(layers[0]["config"]["input_length"], 20);
        assert_eq!(layers[0]["config"]["input_dim"], 7);
        assert_eq!(layers[1]["class_name"], "GlobalAveragePooling1D");
    }

    #[test]
    fn test_dropout_only_with_rng() {
        let model    = tabular_model(5);
        let features = Tensor::<TestBackend, 2>::ones([64, 5], &Default::default());
        let a: Vec<f32> = model.forward_logits(features.clone(), None).into_data().to_vec().unwrap();
        let b: Vec<f32> = model.forward_logits(features.clone(), None).into_data().to_vec().unwrap();
        assert_eq!(a, b);

        let mut r1 = StdRng::seed_from_u64(11);
        let mut r2 = StdRng::seed_from_u64(11);
        let c: Vec<f32> = model.forward_logits(features.clone(), Some(&mut r1)).into_data().to_vec().unwrap();
        let d: Vec<f32> = model.forward_logits(features, Some(&mut r2)).into_data().to_vec().unwrap();
        assert_eq!(c, d);
        assert_ne!(a, c, "training pass must apply a dropout mask");
    }

    #[test]
    fn test_dropout_zeroes_about_rate_and_rescales_survivors() {
        let mut rng = StdRng::seed_from_u64(3);
        let x = Tensor::<TestBackend, 2>::ones([200, 50], &Default::default());
        let out: Vec<f32> = dropout(x, 0.2, &mut rng).into_data().to_vec().unwrap();

        let zeroed = out.iter().filter(|&&v| v == 0.0).count() as f64 / out.len() as f64;
        assert!((zeroed - 0.2).abs() < 0.03, "zeroed fraction {zeroed}");
        assert!(out.iter().filter(|&&v| v != 0.0).all(|&v| (v - 1.25).abs() < 1e-6));
    }
}
