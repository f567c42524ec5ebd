//! Package domain module.
//!
//! The commercial tier ladder, the recommendation table and the per-account
//! assignment with its override history.

mod assignment;
mod recommender;
mod tier;

pub use assignment::{PackageAssignment, PackageOverride};
pub use recommender::PackageRecommender;
pub use tier::PackageTier;
