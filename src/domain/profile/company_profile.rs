//! Company profile captured at onboarding submission.
//!
//! The profile is immutable once built. Optional fields represent intake
//! questions the prospect left blank; the risk engine treats those as
//! unknown signals rather than as zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::ValidationError;

const MAX_NAME_LEN: usize = 200;

/// Industry vertical of the prospect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    FinancialServices,
    Healthcare,
    Technology,
    Government,
    Retail,
    Manufacturing,
    Energy,
    Education,
    Other,
}

/// Head-count bucket reported on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeCountBucket {
    /// 1-49 employees.
    Micro,
    /// 50-249 employees.
    Small,
    /// 250-999 employees.
    MidMarket,
    /// 1,000-4,999 employees.
    Large,
    /// 5,000+ employees.
    Enterprise,
}

/// Stated annual security budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityBudgetBucket {
    UpTo50k,
    UpTo150k,
    UpTo500k,
    UpTo2m,
    Above2m,
}

/// Compliance regimes the prospect must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceFramework {
    Soc2,
    Iso27001,
    Hipaa,
    PciDss,
    Gdpr,
    FedRamp,
    Nist,
}

/// How the prospect reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceChannel {
    /// Direct or cold outbound.
    Direct,
    /// Sourced by a reseller partner.
    Partner,
    /// Referred by an existing customer or contact.
    Referral,
}

impl SourceChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceChannel::Direct => "direct",
            SourceChannel::Partner => "partner",
            SourceChannel::Referral => "referral",
        }
    }
}

/// Recognition tier of the company itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyTier {
    #[serde(rename = "fortune_100")]
    Fortune100,
    #[serde(rename = "fortune_500")]
    Fortune500,
    LargeEnterprise,
    MidMarket,
    SmallBusiness,
}

impl CompanyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyTier::Fortune100 => "fortune_100",
            CompanyTier::Fortune500 => "fortune_500",
            CompanyTier::LargeEnterprise => "large_enterprise",
            CompanyTier::MidMarket => "mid_market",
            CompanyTier::SmallBusiness => "small_business",
        }
    }
}

/// Seniority of the person who submitted the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSeniority {
    Ciso,
    CSuite,
    VicePresident,
    Director,
    Manager,
    IndividualContributor,
}

impl ContactSeniority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactSeniority::Ciso => "ciso",
            ContactSeniority::CSuite => "c_suite",
            ContactSeniority::VicePresident => "vice_president",
            ContactSeniority::Director => "director",
            ContactSeniority::Manager => "manager",
            ContactSeniority::IndividualContributor => "individual_contributor",
        }
    }
}

/// Where the prospect is in the buying conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementStage {
    DemoRequested,
    TrialRequested,
    Evaluating,
    InboundInquiry,
    Cold,
}

impl EngagementStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementStage::DemoRequested => "demo_requested",
            EngagementStage::TrialRequested => "trial_requested",
            EngagementStage::Evaluating => "evaluating",
            EngagementStage::InboundInquiry => "inbound_inquiry",
            EngagementStage::Cold => "cold",
        }
    }
}

/// Immutable intake record for a prospective account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub industry: Industry,
    pub employee_count: EmployeeCountBucket,
    pub security_budget: Option<SecurityBudgetBucket>,
    pub compliance_frameworks: BTreeSet<ComplianceFramework>,
    pub source_channel: Option<SourceChannel>,
    pub company_tier: Option<CompanyTier>,
    pub contact_seniority: Option<ContactSeniority>,
    pub engagement_stage: Option<EngagementStage>,
}

impl CompanyProfile {
    /// Starts a builder with no fields set.
    pub fn builder() -> CompanyProfileBuilder {
        CompanyProfileBuilder::default()
    }

    /// Checks the invariants a deserialized profile may have skipped.
    ///
    /// # Errors
    ///
    /// - `EmptyField` when the company name is blank
    /// - `OutOfRange` when the company name is longer than 200 characters
    pub fn validate(&self) -> Result<(), ValidationError> {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        let len = trimmed.chars().count();
        if len > MAX_NAME_LEN {
            return Err(ValidationError::out_of_range(
                "name",
                1,
                MAX_NAME_LEN as i32,
                len as i32,
            ));
        }
        Ok(())
    }
}

/// Builder that reports missing required fields instead of defaulting them.
#[derive(Debug, Clone, Default)]
pub struct CompanyProfileBuilder {
    name: Option<String>,
    industry: Option<Industry>,
    employee_count: Option<EmployeeCountBucket>,
    security_budget: Option<SecurityBudgetBucket>,
    compliance_frameworks: BTreeSet<ComplianceFramework>,
    source_channel: Option<SourceChannel>,
    company_tier: Option<CompanyTier>,
    contact_seniority: Option<ContactSeniority>,
    engagement_stage: Option<EngagementStage>,
}

impl CompanyProfileBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn industry(mut self, industry: Industry) -> Self {
        self.industry = Some(industry);
        self
    }

    pub fn employee_count(mut self, bucket: EmployeeCountBucket) -> Self {
        self.employee_count = Some(bucket);
        self
    }

    pub fn security_budget(mut self, budget: SecurityBudgetBucket) -> Self {
        self.security_budget = Some(budget);
        self
    }

    pub fn compliance(mut self, framework: ComplianceFramework) -> Self {
        self.compliance_frameworks.insert(framework);
        self
    }

    pub fn source_channel(mut self, channel: SourceChannel) -> Self {
        self.source_channel = Some(channel);
        self
    }

    pub fn company_tier(mut self, tier: CompanyTier) -> Self {
        self.company_tier = Some(tier);
        self
    }

    pub fn contact_seniority(mut self, seniority: ContactSeniority) -> Self {
        self.contact_seniority = Some(seniority);
        self
    }

    pub fn engagement_stage(mut self, stage: EngagementStage) -> Self {
        self.engagement_stage = Some(stage);
        self
    }

    /// Builds and validates the profile.
    ///
    /// # Errors
    ///
    /// `MissingField` for name, industry or employee count; otherwise the
    /// errors of [`CompanyProfile::validate`].
    pub fn build(self) -> Result<CompanyProfile, ValidationError> {
        let profile = CompanyProfile {
            name: self.name.ok_or_else(|| ValidationError::missing_field("name"))?,
            industry: self
                .industry
                .ok_or_else(|| ValidationError::missing_field("industry"))?,
            employee_count: self
                .employee_count
                .ok_or_else(|| ValidationError::missing_field("employee_count"))?,
            security_budget: self.security_budget,
            compliance_frameworks: self.compliance_frameworks,
            source_channel: self.source_channel,
            company_tier: self.company_tier,
            contact_seniority: self.contact_seniority,
            engagement_stage: self.engagement_stage,
        };
        profile.validate()?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> CompanyProfileBuilder {
        CompanyProfile::builder()
            .name("Acme Corp")
            .industry(Industry::FinancialServices)
            .employee_count(EmployeeCountBucket::Large)
    }

    #[test]
    fn builds_with_required_fields_only() {
        let profile = base().build().unwrap();
        assert_eq!(profile.name, "Acme Corp");
        assert!(profile.source_channel.is_none());
        assert!(profile.compliance_frameworks.is_empty());
    }

    #[test]
    fn missing_name_is_reported() {
        let err = CompanyProfile::builder()
            .industry(Industry::Retail)
            .employee_count(EmployeeCountBucket::Small)
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::missing_field("name"));
    }

    #[test]
    fn missing_industry_is_reported() {
        let err = CompanyProfile::builder()
            .name("Acme")
            .employee_count(EmployeeCountBucket::Small)
            .build()
            .unwrap_err();
        assert_eq!(err.field(), "industry");
    }

    #[test]
    fn missing_employee_count_is_reported() {
        let err = CompanyProfile::builder()
            .name("Acme")
            .industry(Industry::Retail)
            .build()
            .unwrap_err();
        assert_eq!(err.field(), "employee_count");
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = base().name("   ").build().unwrap_err();
        assert_eq!(err, ValidationError::empty_field("name"));
    }

    #[test]
    fn overlong_name_is_rejected() {
        let err = base().name("x".repeat(201)).build().unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn compliance_frameworks_deduplicate() {
        let profile = base()
            .compliance(ComplianceFramework::Soc2)
            .compliance(ComplianceFramework::Soc2)
            .compliance(ComplianceFramework::Hipaa)
            .build()
            .unwrap();
        assert_eq!(profile.compliance_frameworks.len(), 2);
    }

    #[test]
    fn enums_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&CompanyTier::Fortune100).unwrap(),
            "\"fortune_100\""
        );
        assert_eq!(
            serde_json::to_string(&EngagementStage::DemoRequested).unwrap(),
            "\"demo_requested\""
        );
    }
}
