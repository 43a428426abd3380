//! Seams to the services the engine does not implement itself: advice
//! generation and listing extraction. Callers supply the implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cashflow::{property_cashflow, PropertyCashflowInputs};
use crate::config::TaxConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::snowball::SnowballProperty;
use crate::tax::RentalContract;
use crate::types::{PropertyId, Tenancy};

/// A property as the dashboard stores it.
///
/// Records are owned by a user and may hang off a parent property (units in
/// the same building).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: PropertyId,
    pub owner_id: Uuid,
    pub parent_id: Option<PropertyId>,
    pub name: String,
    pub address: String,
    pub purchase_price: Money,
    pub current_value: Money,
    pub outstanding_debt: Money,
    pub mortgage_rate: Rate,
    pub monthly_mortgage_payment: Money,
    pub monthly_rent: Money,
    pub monthly_subsidy: Money,
    pub property_tax_rate: Rate,
    pub annual_insurance: Money,
    pub annual_maintenance: Money,
    pub vacancy_buffer: Rate,
    pub management_fee: Rate,
    pub other_monthly_expenses: Money,
    pub contract: RentalContract,
    #[serde(default)]
    pub tenancy: Tenancy,
    pub updated_at: DateTime<Utc>,
}

impl PropertyRecord {
    pub fn cashflow_inputs(&self) -> PropertyCashflowInputs {
        PropertyCashflowInputs {
            monthly_rent: self.monthly_rent,
            monthly_subsidy: self.monthly_subsidy,
            monthly_mortgage_payment: self.monthly_mortgage_payment,
            property_value: self.current_value,
            annual_property_tax_rate: self.property_tax_rate,
            annual_insurance: self.annual_insurance,
            annual_maintenance: self.annual_maintenance,
            vacancy_buffer: self.vacancy_buffer,
            management_fee: self.management_fee,
            other_monthly_expenses: self.other_monthly_expenses,
            contract: self.contract,
            tenancy: self.tenancy.clone(),
        }
    }

    /// snowball entry with the current net cashflow as surplus
    pub fn snowball_property(&self, config: &TaxConfig) -> SnowballProperty {
        let cashflow = property_cashflow(&self.cashflow_inputs(), config);
        SnowballProperty {
            id: self.id,
            name: self.name.clone(),
            outstanding_debt: self.outstanding_debt,
            monthly_mortgage_payment: self.monthly_mortgage_payment,
            monthly_net_cashflow_surplus: cashflow.net_cashflow,
            annual_interest_rate: self.mortgage_rate,
        }
    }

    /// the record store's owner and optional parent filter
    pub fn matches(&self, owner_id: Uuid, parent_id: Option<PropertyId>) -> bool {
        self.owner_id == owner_id && (parent_id.is_none() || self.parent_id == parent_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub title: String,
    pub detail: String,
}

/// structured advice for one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceResult {
    /// 1 to 10
    pub score: u8,
    pub recommendations: Vec<Recommendation>,
    pub market_commentary: String,
}

#[derive(Deserialize)]
struct RawAdvice {
    score: i64,
    #[serde(default)]
    recommendations: Vec<Recommendation>,
    #[serde(default)]
    market_commentary: String,
}

impl AdviceResult {
    /// parse the advice service's JSON reply, rejecting scores outside 1-10
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawAdvice = serde_json::from_str(json)?;
        let score = u8::try_from(raw.score)
            .ok()
            .filter(|s| (1..=10).contains(s))
            .ok_or_else(|| EngineError::AdviceScoreOutOfRange { score: raw.score })?;

        let mut recommendations = raw.recommendations;
        recommendations.sort_by_key(|r| r.priority);

        Ok(Self {
            score,
            recommendations,
            market_commentary: raw.market_commentary,
        })
    }
}

/// what a listing page yielded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingContent {
    Text(String),
    /// rendered page, for sites that refuse text extraction
    Screenshot(Vec<u8>),
}

pub trait AdviceGenerator {
    fn generate_advice(&self, property: &PropertyRecord) -> Result<AdviceResult>;
}

pub trait ListingExtractor {
    fn extract_listing(&self, url: &str) -> Result<ListingContent>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn record(owner_id: Uuid) -> PropertyRecord {
        PropertyRecord {
            id: Uuid::new_v4(),
            owner_id,
            parent_id: None,
            name: "Rua das Flores 12".to_string(),
            address: "Porto".to_string(),
            purchase_price: Money::from_major(200_000),
            current_value: Money::from_major(240_000),
            outstanding_debt: Money::from_major(150_000),
            mortgage_rate: Rate::from_percentage(dec!(3.5)),
            monthly_mortgage_payment: Money::from_major(500),
            monthly_rent: Money::from_major(1_000),
            monthly_subsidy: Money::from_major(100),
            property_tax_rate: Rate::from_percentage(dec!(0.3)),
            annual_insurance: Money::from_major(240),
            annual_maintenance: Money::from_major(600),
            vacancy_buffer: Rate::from_percentage(5),
            management_fee: Rate::from_percentage(10),
            other_monthly_expenses: Money::from_major(20),
            contract: RentalContract::new(2026, 1),
            tenancy: Tenancy::Whole,
            updated_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    struct FixedAdvisor {
        reply: String,
    }

    impl AdviceGenerator for FixedAdvisor {
        fn generate_advice(&self, _property: &PropertyRecord) -> Result<AdviceResult> {
            AdviceResult::from_json(&self.reply)
        }
    }

    struct BlockingExtractor;

    impl ListingExtractor for BlockingExtractor {
        fn extract_listing(&self, url: &str) -> Result<ListingContent> {
            if url.contains("idealista") {
                return Err(EngineError::ListingBlocked { url: url.to_string() });
            }
            Ok(ListingContent::Text("T2, 85 m2, 240.000 EUR".to_string()))
        }
    }

    #[test]
    fn test_record_feeds_cashflow() {
        let config = TaxConfig::portugal_2026();
        let record = record(Uuid::new_v4());
        let cashflow = property_cashflow(&record.cashflow_inputs(), &config);
        assert_eq!(cashflow.net_cashflow, Money::from_major(185));

        let snowball = record.snowball_property(&config);
        assert_eq!(snowball.monthly_net_cashflow_surplus, Money::from_major(185));
        assert_eq!(snowball.outstanding_debt, Money::from_major(150_000));
    }

    #[test]
    fn test_record_filter() {
        let owner = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let mut unit = record(owner);
        unit.parent_id = Some(parent);

        assert!(unit.matches(owner, None));
        assert!(unit.matches(owner, Some(parent)));
        assert!(!unit.matches(owner, Some(Uuid::new_v4())));
        assert!(!unit.matches(Uuid::new_v4(), None));
    }

    #[test]
    fn test_advice_parsing_orders_by_priority() {
        let advisor = FixedAdvisor {
            reply: r#"{
                "score": 7,
                "recommendations": [
                    {"priority": "low", "title": "Repaint", "detail": "Before the next tenancy"},
                    {"priority": "high", "title": "Renegotiate rate", "detail": "Spread is above market"}
                ],
                "market_commentary": "Porto rents are still rising."
            }"#
            .to_string(),
        };

        let advice = advisor.generate_advice(&record(Uuid::new_v4())).unwrap();
        assert_eq!(advice.score, 7);
        assert_eq!(advice.recommendations[0].priority, Priority::High);
        assert_eq!(advice.recommendations[1].title, "Repaint");
    }

    #[test]
    fn test_advice_score_out_of_range() {
        for reply in [r#"{"score": 0}"#, r#"{"score": 11}"#, r#"{"score": -3}"#] {
            let err = AdviceResult::from_json(reply).unwrap_err();
            assert!(matches!(err, EngineError::AdviceScoreOutOfRange { .. }));
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_advice_malformed_reply() {
        let err = AdviceResult::from_json("not json").unwrap_err();
        assert!(matches!(err, EngineError::Json(_)));
    }

    #[test]
    fn test_blocked_listing() {
        let extractor = BlockingExtractor;
        let err = extractor
            .extract_listing("https://www.idealista.pt/imovel/123")
            .unwrap_err();
        assert!(matches!(err, EngineError::ListingBlocked { .. }));
        assert!(err.user_message().contains("blocked"));

        let content = extractor.extract_listing("https://example.pt/listing/9").unwrap();
        assert!(matches!(content, ListingContent::Text(_)));
    }
}
