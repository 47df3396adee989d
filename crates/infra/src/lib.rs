//! Infrastructure layer: concrete decision points behind the `DecisionClient` seam.

pub mod pdp;
