//! scikit-learn forest support.
//!
//! scikit-learn has no portable model format, so forests are exchanged as a
//! JSON dump of the raw `tree_` arrays of every fitted estimator:
//!
//! ```python
//! import json
//! dump = {"estimators": [
//!     {"feature": e.tree_.feature.tolist(),
//!      "children_left": e.tree_.children_left.tolist(),
//!      "children_right": e.tree_.children_right.tolist(),
//!      "value": e.tree_.value.tolist()}
//!     for e in rf.estimators_
//! ]}
//! json.dump(dump, open("forest.json", "w"))
//! ```
//!
//! [`SklearnForest`] parses such a dump and
//! [`SklearnForest::to_forest`] rebuilds the native [`Forest`](crate::Forest).

mod convert;
mod json;

pub use convert::ConversionError;
pub use json::*;
