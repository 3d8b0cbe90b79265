//! Loaders for forests fitted by other libraries.
//!
//! - [`sklearn`]: JSON dump of a scikit-learn `RandomForestRegressor`

pub mod sklearn;
