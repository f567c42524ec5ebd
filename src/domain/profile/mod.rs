//! Company profile domain module.
//!
//! The immutable intake record every trial is created from.

mod company_profile;

pub use company_profile::{
    CompanyProfile, CompanyProfileBuilder, CompanyTier, ComplianceFramework, ContactSeniority,
    EmployeeCountBucket, EngagementStage, Industry, SecurityBudgetBucket, SourceChannel,
};
