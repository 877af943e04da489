use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// Row-major examples × width matrix of model inputs.
///
/// Text rows hold token ids, tabular rows hold the mixed
/// numeric/categorical vector; both are stored as `f32` so one
/// batcher and one trainer serve both models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    width:  usize,
    values: Vec<f32>,
}

impl FeatureMatrix {
    pub fn new(width: usize) -> Self {
        Self { width, values: Vec::new() }
    }

    /// Append one row. Panics if the row is not exactly `width` long,
    /// since the assemblers always produce fixed-width rows.
    pub fn push_row(&mut self, row: &[f32]) {
        assert_eq!(row.len(), self.width, "feature row has the wrong width");
        self.values.extend_from_slice(row);
    }

    pub fn rows(&self) -> usize {
        if self.width == 0 { 0 } else { self.values.len() / self.width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `[rows, width]`
    pub fn shape(&self) -> [usize; 2] {
        [self.rows(), self.width]
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.values[index * self.width..(index + 1) * self.width]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Feature matrix plus one class index per row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    pub features: FeatureMatrix,
    pub labels:   Vec<usize>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Row `index` as a standalone sample
    pub fn example(&self, index: usize) -> Option<FeatureRow> {
        let label = *self.labels.get(index)?;
        if index >= self.features.rows() {
            return None;
        }
        Some(FeatureRow { features: self.features.row(index).to_vec(), label })
    }

    /// The rows at `indices`, in that order, as a burn dataset.
    /// Out-of-range indices are skipped.
    pub fn select(&self, indices: &[usize]) -> FeatureDataset {
        FeatureDataset::new(indices.iter().filter_map(|&i| self.example(i)).collect())
    }
}

/// One fixed-width input row and its class index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub features: Vec<f32>,
    pub label:    usize,
}

/// The rows one data loader iterates over (training or validation)
#[derive(Debug, Clone, Default)]
pub struct FeatureDataset {
    rows: Vec<FeatureRow>,
}

impl FeatureDataset {
    pub fn new(rows: Vec<FeatureRow>) -> Self { Self { rows } }
}

impl Dataset<FeatureRow> for FeatureDataset {
    fn get(&self, index: usize) -> Option<FeatureRow> {
        self.rows.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_and_shape() {
        let mut m = FeatureMatrix::new(3);
        m.push_row(&[1.0, 2.0, 3.0]);
        m.push_row(&[4.0, 5.0, 6.0]);
        assert_eq!(m.shape(), [2, 3]);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_select_keeps_index_order() {
        let mut features = FeatureMatrix::new(2);
        features.push_row(&[1.0, 2.0]);
        features.push_row(&[3.0, 4.0]);
        features.push_row(&[5.0, 6.0]);
        let set = TrainingSet { features, labels: vec![0, 1, 2] };

        let view = set.select(&[2, 0, 9]);
        assert_eq!(view.len(), 2);
        assert_eq!(view.get(0), Some(FeatureRow { features: vec![5.0, 6.0], label: 2 }));
        assert_eq!(view.get(1).map(|r| r.label), Some(0));
        assert_eq!(view.get(2), None);
    }

    #[test]
    #[should_panic]
    fn test_wrong_width_panics() {
        let mut m = FeatureMatrix::new(2);
        m.push_row(&[1.0]);
    }
}
