//! Native evaluation of XGBoost JSON models
//!
//! Reads the artifact written by `XGBClassifier.save_model("model.json")` and
//! scores rows without linking libxgboost.
//!
//! # How Scoring Works
//!
//! A `gbtree` model is a list of regression trees. Each row walks every tree
//! from the root:
//!
//! - at a split node, go left when `x < split_condition`, right otherwise
//! - a missing value (NaN) goes wherever `default_left` says
//! - a node whose left child is `-1` is a leaf; its value is stored in
//!   `split_conditions`
//!
//! The leaf values are summed with the base margin, and the logistic
//! objective maps the margin to a probability with the sigmoid.
//!
//! Since XGBoost 1.0 `base_score` is saved in probability space, so the base
//! margin is `logit(base_score)`. XGBoost 3 writes it as a one-element array
//! string (`"[5E-1]"`); both spellings are accepted.
//!
//! A model trained with early stopping records `best_iteration` in its
//! attributes. Like the Python wrapper, only the boosting rounds up to and
//! including that one are scored; later trees stay in the file but are
//! ignored.
//!
//! Only what a binary classifier needs is supported. Multi-class, `dart`,
//! `gblinear` and categorical splits are rejected when the model is opened.

use super::{check_width, Classifier};
use crate::error::{ModelError, PredictionError};
use crate::features::FEATURE_NAMES;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

// ============================================================================
// On-disk format
// ============================================================================

#[derive(Deserialize)]
struct ModelFile {
    learner: Learner,
    #[serde(default)]
    version: Vec<u32>,
}

#[derive(Deserialize)]
struct Learner {
    #[serde(default)]
    attributes: Attributes,
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
    objective: ObjectiveSpec,
}

#[derive(Deserialize, Default)]
struct Attributes {
    #[serde(default)]
    best_iteration: Option<String>,
}

#[derive(Deserialize)]
struct GradientBooster {
    name: String,
    #[serde(default)]
    model: Option<GbTreeModel>,
}

#[derive(Deserialize)]
struct GbTreeModel {
    trees: Vec<RawTree>,
    /// Tree offsets per boosting round (`[0, 1, 2, ...]` for one tree a round)
    #[serde(default)]
    iteration_indptr: Option<Vec<usize>>,
}

#[derive(Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    num_feature: String,
}

#[derive(Deserialize)]
struct ObjectiveSpec {
    name: String,
}

#[derive(Deserialize)]
struct RawTree {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f64>,
    #[serde(deserialize_with = "flags")]
    default_left: Vec<bool>,
    #[serde(default)]
    split_type: Vec<u8>,
}

/// `default_left` is 0/1 in JSON models and true/false in some converters
fn flags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    let raw = Vec::<Flag>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|f| match f {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        })
        .collect())
}

// ============================================================================
// Evaluator
// ============================================================================

/// How the summed margin becomes a probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// `binary:logistic` and `reg:logistic`
    Logistic,
    /// `binary:logitraw`: base score is already a margin
    LogitRaw,
}

impl Objective {
    fn from_name(name: &str) -> Result<Self, ModelError> {
        match name {
            "binary:logistic" | "reg:logistic" => Ok(Objective::Logistic),
            "binary:logitraw" => Ok(Objective::LogitRaw),
            other => Err(ModelError::Unsupported(format!("objective '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    value: f32,
    default_left: bool,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.left == -1
    }
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_raw(index: usize, raw: RawTree, num_feature: usize) -> Result<Self, ModelError> {
        let n = raw.left_children.len();
        let malformed = |what: &str| ModelError::Malformed(format!("tree {}: {}", index, what));

        if n == 0 {
            return Err(malformed("no nodes"));
        }
        if raw.right_children.len() != n
            || raw.split_indices.len() != n
            || raw.split_conditions.len() != n
            || raw.default_left.len() != n
        {
            return Err(malformed("node arrays have different lengths"));
        }
        if raw.split_type.iter().any(|&t| t != 0) {
            return Err(ModelError::Unsupported(format!(
                "tree {} uses categorical splits",
                index
            )));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let left = raw.left_children[i];
            let right = raw.right_children[i];
            let in_range = |c: i32| c >= 0 && (c as usize) < n;

            if left != -1 {
                if !in_range(left) || !in_range(right) {
                    return Err(malformed(&format!("node {} has a child out of range", i)));
                }
                let feature = raw.split_indices[i];
                if feature < 0 || feature as usize >= num_feature {
                    return Err(malformed(&format!(
                        "node {} splits on feature {} of {}",
                        i, feature, num_feature
                    )));
                }
            }

            nodes.push(Node {
                left,
                right,
                feature: raw.split_indices[i].max(0) as usize,
                value: raw.split_conditions[i] as f32,
                default_left: raw.default_left[i],
            });
        }

        Ok(Self { nodes })
    }

    /// Leaf value reached by `row`
    ///
    /// Comparisons are done in `f32`, the precision XGBoost stores splits in.
    fn leaf_value(&self, tree: usize, row: &[f64]) -> Result<f32, PredictionError> {
        let mut id = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.nodes.len() {
            let node = &self.nodes[id];
            if node.is_leaf() {
                return Ok(node.value);
            }

            let x = row[node.feature];
            let go_left = if x.is_nan() {
                node.default_left
            } else {
                (x as f32) < node.value
            };
            let next = if go_left { node.left } else { node.right };
            id = next as usize;
        }

        Err(PredictionError::InvalidTree { tree, node: id })
    }
}

/// Metadata describing a loaded model
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub objective: Objective,
    /// Trees actually scored
    pub num_trees: usize,
    /// Trees in the file, including any past `best_iteration`
    pub total_trees: usize,
    pub best_iteration: Option<usize>,
    pub num_features: usize,
    pub feature_names: Vec<String>,
    pub base_score: f64,
    pub xgboost_version: Option<String>,
}

/// A binary gradient-boosted tree classifier loaded from XGBoost JSON
#[derive(Debug, Clone)]
pub struct XgbClassifier {
    trees: Vec<Tree>,
    base_margin: f64,
    info: ModelInfo,
}

impl XgbClassifier {
    /// Load a model from a `.json` file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let model = Self::from_json(&text)?;
        tracing::info!(
            path = %path.display(),
            trees = model.info.num_trees,
            features = model.info.num_features,
            "loaded XGBoost model"
        );
        Ok(model)
    }

    /// Parse a model from JSON text
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let file: ModelFile = serde_json::from_str(text)?;
        let learner = file.learner;
        let params = learner.learner_model_param;

        let objective = Objective::from_name(&learner.objective.name)?;

        let num_class = match params.num_class.as_deref() {
            Some(s) => parse_integer("num_class", s)?,
            None => 0,
        };
        if num_class > 1 {
            return Err(ModelError::Unsupported(format!(
                "multi-class model with {} classes",
                num_class
            )));
        }

        let num_features = parse_integer("num_feature", &params.num_feature)?;
        let base_score = parse_base_score(&params.base_score)?;
        let base_margin = match objective {
            Objective::Logistic => {
                if !(base_score > 0.0 && base_score < 1.0) {
                    return Err(ModelError::Malformed(format!(
                        "base_score {} is not a probability",
                        base_score
                    )));
                }
                (base_score / (1.0 - base_score)).ln()
            }
            Objective::LogitRaw => base_score,
        };

        let booster = learner.gradient_booster;
        if booster.name != "gbtree" {
            return Err(ModelError::Unsupported(format!("booster '{}'", booster.name)));
        }
        let gbtree = booster
            .model
            .ok_or_else(|| ModelError::Malformed("gbtree booster has no model".to_string()))?;
        let total_trees = gbtree.trees.len();

        let best_iteration = match learner.attributes.best_iteration.as_deref() {
            Some(s) => Some(parse_integer("best_iteration", s)?),
            None => None,
        };
        let used = match best_iteration {
            Some(best) => trees_through_round(best, gbtree.iteration_indptr.as_deref(), total_trees)?,
            None => total_trees,
        };
        if used < total_trees {
            tracing::debug!(best_iteration = ?best_iteration, used, total_trees, "scoring up to best iteration");
        }

        let trees = gbtree
            .trees
            .into_iter()
            .take(used)
            .enumerate()
            .map(|(i, raw)| Tree::from_raw(i, raw, num_features))
            .collect::<Result<Vec<_>, _>>()?;

        if !learner.feature_names.is_empty() && learner.feature_names != FEATURE_NAMES {
            tracing::warn!(
                found = ?learner.feature_names,
                expected = ?FEATURE_NAMES,
                "model feature names differ from the chat input order"
            );
        }

        let xgboost_version = if file.version.is_empty() {
            None
        } else {
            Some(
                file.version
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("."),
            )
        };

        let info = ModelInfo {
            objective,
            num_trees: trees.len(),
            total_trees,
            best_iteration,
            num_features,
            feature_names: learner.feature_names,
            base_score,
            xgboost_version,
        };

        Ok(Self {
            trees,
            base_margin,
            info,
        })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Raw additive score before the logistic transform
    pub fn margin(&self, features: &[f64]) -> Result<f64, PredictionError> {
        check_width(self.info.num_features, features)?;

        let mut sum = 0.0f32;
        for (i, tree) in self.trees.iter().enumerate() {
            sum += tree.leaf_value(i, features)?;
        }
        Ok(self.base_margin + f64::from(sum))
    }
}

impl Classifier for XgbClassifier {
    fn num_features(&self) -> usize {
        self.info.num_features
    }

    fn predict_probability(&self, features: &[f64]) -> Result<f64, PredictionError> {
        // Both objectives share the sigmoid; they differ only in how the base
        // score was stored.
        Ok(sigmoid(self.margin(features)?))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn parse_integer(field: &str, s: &str) -> Result<usize, ModelError> {
    s.trim()
        .parse::<usize>()
        .map_err(|_| ModelError::Malformed(format!("{} '{}' is not an integer", field, s)))
}

/// Number of leading trees that make up rounds `0..=best`
fn trees_through_round(best: usize, indptr: Option<&[usize]>, total: usize) -> Result<usize, ModelError> {
    let end = match indptr {
        Some(offsets) if !offsets.is_empty() => offsets.get(best.saturating_add(1)).copied().unwrap_or(usize::MAX),
        _ => best.saturating_add(1),
    };
    if end > total {
        return Err(ModelError::Malformed(format!(
            "best_iteration {} is past the last of {} trees",
            best, total
        )));
    }
    Ok(end)
}

fn parse_base_score(s: &str) -> Result<f64, ModelError> {
    let inner = s.trim().trim_start_matches('[').trim_end_matches(']');
    let first = inner.split(',').next().unwrap_or("").trim();
    first
        .parse::<f64>()
        .map_err(|_| ModelError::Malformed(format!("base_score '{}' is not a number", s)))
}
