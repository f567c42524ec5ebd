//! CommissionRecord and the partner attribution it is created from.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CommissionId, Money, PartnerId, Rate, Timestamp, TrialId, ValidationError};

use super::{CommissionCalculator, PartnerTier};

/// Partner credited with a converted deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerAttribution {
    pub partner_id: PartnerId,
    pub partner_tier: PartnerTier,
    pub deal_value: Money,
}

impl PartnerAttribution {
    /// # Errors
    ///
    /// `OutOfRange` on `deal_value` when it is not positive.
    pub fn new(
        partner_id: PartnerId,
        partner_tier: PartnerTier,
        deal_value: Money,
    ) -> Result<Self, ValidationError> {
        let attribution = Self {
            partner_id,
            partner_tier,
            deal_value,
        };
        attribution.validate()?;
        Ok(attribution)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.deal_value.is_positive() {
            return Err(ValidationError::invalid_format(
                "deal_value",
                format!("must be positive, got {}", self.deal_value),
            ));
        }
        Ok(())
    }
}

/// Immutable commission fact.
///
/// Refers to the trial by id only, so it outlives archival of the trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRecord {
    id: CommissionId,
    partner_id: PartnerId,
    trial_id: TrialId,
    partner_tier: PartnerTier,
    deal_value: Money,
    rate: Rate,
    amount: Money,
    created_at: Timestamp,
}

impl CommissionRecord {
    /// Computes and records the commission for an attribution.
    pub fn create(
        calculator: &CommissionCalculator,
        trial_id: TrialId,
        attribution: &PartnerAttribution,
        at: Timestamp,
    ) -> Self {
        Self {
            id: CommissionId::new(),
            partner_id: attribution.partner_id.clone(),
            trial_id,
            partner_tier: attribution.partner_tier,
            deal_value: attribution.deal_value,
            rate: calculator.rates().rate_for(attribution.partner_tier),
            amount: calculator.compute(attribution.partner_tier, attribution.deal_value),
            created_at: at,
        }
    }

    pub fn id(&self) -> &CommissionId {
        &self.id
    }

    pub fn partner_id(&self) -> &PartnerId {
        &self.partner_id
    }

    pub fn trial_id(&self) -> &TrialId {
        &self.trial_id
    }

    pub fn partner_tier(&self) -> PartnerTier {
        self.partner_tier
    }

    pub fn deal_value(&self) -> Money {
        self.deal_value
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
