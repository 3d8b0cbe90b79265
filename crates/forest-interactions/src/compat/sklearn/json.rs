//! serde model of the scikit-learn forest dump.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Collapse a node's `value` entry to a scalar.
///
/// `tree_.value` has shape `(n_nodes, n_outputs, max_n_classes)`, so after
/// `tolist()` every node holds `[[v]]` for single-output regression. Plain
/// numbers and shallower nesting are accepted too; the first element is taken
/// at every level.
fn node_value(value: Value) -> Result<f64, String> {
    let mut cur = value;
    loop {
        match cur {
            Value::Number(n) => return n.as_f64().ok_or_else(|| "invalid number".to_string()),
            Value::Array(arr) => match arr.into_iter().next() {
                Some(inner) => cur = inner,
                None => return Err("empty value array".to_string()),
            },
            other => return Err(format!("cannot read node value from {other}")),
        }
    }
}

fn deserialize_node_values<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .into_iter()
        .enumerate()
        .map(|(node, value)| {
            node_value(value).map_err(|e| SerdeError::custom(format!("node {node}: {e}")))
        })
        .collect()
}

/// Raw arrays of one fitted `DecisionTreeRegressor`.
///
/// Leaves carry `-2` in `feature` and `-1` in both child arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SklearnTree {
    pub feature: Vec<i64>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    #[serde(deserialize_with = "deserialize_node_values")]
    pub value: Vec<f64>,
}

/// All estimators of a fitted forest, in `estimators_` order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SklearnForest {
    pub estimators: Vec<SklearnTree>,
}

impl SklearnForest {
    /// Load a forest dump from a JSON file.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use forest_interactions::compat::sklearn::SklearnForest;
    ///
    /// let dump = SklearnForest::from_file("forest.json")?;
    /// let forest = dump.to_forest()?;
    /// ```
    pub fn from_file(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Parse a forest dump from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn n_estimators(&self) -> usize {
        self.estimators.len()
    }
}
