//! Design-matrix helpers for refitting models on discovered interactions.
//!
//! Matrices are sample-major: `x[[sample, feature]]`.

use ndarray::{Array2, ArrayView2, Axis, Zip};

use crate::interactions::FeaturePair;
use crate::repr::FeatureIdx;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureError {
    #[error("feature {feature} is out of bounds for a matrix with {n_features} columns")]
    ColumnOutOfBounds { feature: FeatureIdx, n_features: usize },
}

fn check_column(feature: FeatureIdx, n_features: usize) -> Result<usize, FeatureError> {
    let col = feature as usize;
    if col < n_features {
        Ok(col)
    } else {
        Err(FeatureError::ColumnOutOfBounds {
            feature,
            n_features,
        })
    }
}

/// Keep the listed columns of `x`, in the order given.
pub fn select_features(
    x: ArrayView2<'_, f64>,
    features: &[FeatureIdx],
) -> Result<Array2<f64>, FeatureError> {
    let cols = features
        .iter()
        .map(|&f| check_column(f, x.ncols()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(x.select(Axis(1), &cols))
}

/// One column per pair holding the element-wise product of its two features.
pub fn interaction_columns(
    x: ArrayView2<'_, f64>,
    pairs: &[FeaturePair],
) -> Result<Array2<f64>, FeatureError> {
    let mut out = Array2::zeros((x.nrows(), pairs.len()));
    for (mut column, pair) in out.axis_iter_mut(Axis(1)).zip(pairs) {
        let a = x.column(check_column(pair.first(), x.ncols())?);
        let b = x.column(check_column(pair.second(), x.ncols())?);
        Zip::from(&mut column)
            .and(&a)
            .and(&b)
            .for_each(|dst, &a, &b| *dst = a * b);
    }
    Ok(out)
}
