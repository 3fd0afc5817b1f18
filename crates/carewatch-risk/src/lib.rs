//! carewatch-risk
//!
//! Risk classification. Pure functions, no I/O and no dependency on the
//! rest of the workspace. Shapes raw assessment form input into a
//! [`RiskFeatureVector`] and maps a model score onto a [`Tier`].
//!
//! Every screen that shows a tier badge goes through [`classify_tier`];
//! nothing else in the workspace compares a score against the thresholds.

pub mod error;
pub mod features;
pub mod tier;

pub use error::{FieldProblem, RiskError};
pub use features::{RawRiskInputs, RiskFeatureVector, build_feature_vector};
pub use tier::{Tier, TierDistribution, classify_tier, tier_of};
