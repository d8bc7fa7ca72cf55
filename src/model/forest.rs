use serde::{Deserialize, Serialize};

use super::{PredictError, TrendModel};
use crate::features::FeatureTable;

/// One node of a flattened decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Route `feature <= threshold` to `left`, everything else to `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class weights at a terminal node, aligned with the model's classes.
    Leaf { distribution: Vec<f64> },
}

/// Decision tree stored as a node array; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk the tree for `features` and return the leaf distribution.
    ///
    /// Returns `None` if the walk leaves the node array or does not reach a
    /// leaf within `nodes.len()` steps.
    pub fn leaf_distribution(&self, features: &[f64]) -> Option<&[f64]> {
        let mut idx = 0usize;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx)? {
                Node::Leaf { distribution } => return Some(distribution.as_slice()),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = *features.get(*feature)?;
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
        None
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {idx} splits on feature {feature} but the model has {n_features}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has a non-finite threshold"));
                    }
                    // Children must point forward so every walk terminates.
                    for child in [left, right] {
                        if *child <= idx || *child >= self.nodes.len() {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
                Node::Leaf { distribution } => {
                    if distribution.len() != n_classes {
                        return Err(format!(
                            "leaf {idx} has {} weights but the model has {n_classes} classes",
                            distribution.len()
                        ));
                    }
                    if distribution.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(format!("leaf {idx} has a negative or non-finite weight"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Random-forest trend classifier loaded from a JSON artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    /// Artifact format tag.
    pub format: String,
    /// Artifact format version.
    pub format_version: u32,
    /// Ordered class labels, e.g. `Bearish`, `Bullish`, `Stable`.
    pub classes: Vec<String>,
    /// Number of values expected per row.
    pub n_features: usize,
    /// Training-time feature names. Informational only; rows are matched by position.
    #[serde(default)]
    pub feature_names: Vec<String>,
    /// One importance per feature in training order.
    pub feature_importances: Vec<f64>,
    pub trees: Vec<Tree>,
}

impl ForestModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("model has no classes".to_string());
        }
        if self.n_features == 0 {
            return Err("model expects zero features".to_string());
        }
        if self.feature_importances.len() != self.n_features {
            return Err(format!(
                "feature_importances has {} entries but n_features is {}",
                self.feature_importances.len(),
                self.n_features
            ));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != self.n_features {
            return Err(format!(
                "feature_names has {} entries but n_features is {}",
                self.feature_names.len(),
                self.n_features
            ));
        }
        if self.trees.is_empty() {
            return Err("model has no trees".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|reason| format!("tree {tree_idx}: {reason}"))?;
        }
        Ok(())
    }

    /// Average the normalized leaf distributions of every tree.
    pub fn predict_proba_row(&self, features: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.classes.len()];
        let mut voters = 0usize;
        for tree in &self.trees {
            let Some(distribution) = tree.leaf_distribution(features) else {
                continue;
            };
            let total: f64 = distribution.iter().sum();
            if total <= 0.0 {
                continue;
            }
            for (acc, weight) in proba.iter_mut().zip(distribution) {
                *acc += weight / total;
            }
            voters += 1;
        }
        if voters > 0 {
            for value in &mut proba {
                *value /= voters as f64;
            }
        }
        proba
    }

    fn check_row(
        &self,
        table: &FeatureTable,
        row_idx: usize,
        row: &[f64],
    ) -> Result<(), PredictError> {
        match row.iter().position(|value| !value.is_finite()) {
            Some(col) => Err(PredictError::NonFiniteValue {
                row: row_idx,
                column: table.columns()[col].clone(),
            }),
            None => Ok(()),
        }
    }
}

impl TrendModel for ForestModel {
    fn predict(&self, table: &FeatureTable) -> Result<Vec<String>, PredictError> {
        if table.column_count() != self.n_features {
            return Err(PredictError::FeatureCountMismatch {
                expected: self.n_features,
                found: table.column_count(),
            });
        }
        let mut labels = Vec::with_capacity(table.row_count());
        for (row_idx, row) in table.rows().iter().enumerate() {
            self.check_row(table, row_idx, row)?;
            let proba = self.predict_proba_row(row);
            labels.push(self.classes[argmax(&proba)].clone());
        }
        Ok(labels)
    }

    fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

/// Index of the first maximum.
fn argmax(values: &[f64]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f64::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}
