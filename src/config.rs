use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};

/// engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub tax: TaxConfig,
    pub irr: IrrConfig,
    pub snowball: SnowballConfig,
}

/// tax tables; a new tax year is a data change here, not a code change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxConfig {
    pub transfer: TransferTaxConfig,
    /// imposto do selo on the acquisition price
    pub stamp_duty_rate: Rate,
    /// municipal IMI rate used when the caller gives none
    pub default_property_tax_rate: Rate,
    pub rental: RentalTaxConfig,
    /// progressive IRS brackets, used when rental income is aggregated
    pub income_brackets: Vec<TaxBracket>,
    pub capital_gains: CapitalGainsConfig,
}

/// one row of a bracket table; rows are ordered by `up_to`, the last row open-ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub up_to: Option<Money>,
    pub rate: Rate,
    /// rate applies to the whole base instead of the slice inside the bracket
    #[serde(default)]
    pub flat_on_whole: bool,
}

impl TaxBracket {
    pub fn marginal(up_to: Option<Money>, rate: Rate) -> Self {
        Self { up_to, rate, flat_on_whole: false }
    }

    pub fn flat(up_to: Option<Money>, rate: Rate) -> Self {
        Self { up_to, rate, flat_on_whole: true }
    }
}

/// IMT configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferTaxConfig {
    /// rate for purchases that are not a permanent own home
    pub flat_rate: Rate,
    /// progressive schedule for a permanent own home
    pub first_home_brackets: Vec<TaxBracket>,
}

/// rental income (categoria F) configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalTaxConfig {
    pub new_regime: NewRentalRegime,
    pub legacy_tiers: Vec<DurationTier>,
    /// rate for contracts under the affordable-rent program
    pub special_contract_rate: Rate,
}

/// reduced-rate regime for moderate rents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRentalRegime {
    pub first_year: i32,
    /// inclusive; `None` keeps the regime open-ended
    pub last_year: Option<i32>,
    pub rent_ceiling: Money,
    pub reduced_rate: Rate,
    pub standard_rate: Rate,
}

impl NewRentalRegime {
    pub fn applies_to(&self, year: i32) -> bool {
        year >= self.first_year && self.last_year.map_or(true, |last| year <= last)
    }
}

/// contract-duration step of the older regime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationTier {
    pub min_years: u32,
    pub rate: Rate,
    /// reduction per contract renewal
    pub renewal_step: Rate,
    /// renewals never take the rate below this
    pub floor: Rate,
}

/// capital gains (mais-valias) configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainsConfig {
    pub rate: Rate,
    pub resident_inclusion: Rate,
    pub non_resident_inclusion: Rate,
}

/// newton-raphson settings for the IRR solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrConfig {
    pub initial_guess: Decimal,
    pub npv_tolerance: Decimal,
    pub max_iterations: u32,
    pub min_rate: Decimal,
    pub max_rate: Decimal,
    pub derivative_epsilon: Decimal,
}

impl Default for IrrConfig {
    fn default() -> Self {
        Self {
            initial_guess: dec!(0.10),
            npv_tolerance: dec!(0.0001),
            max_iterations: 100,
            min_rate: dec!(-0.99),
            max_rate: dec!(10),
            derivative_epsilon: dec!(0.0000000001),
        }
    }
}

/// debt snowball settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowballConfig {
    /// per-property month cap (30 years)
    pub max_months: u32,
}

impl Default for SnowballConfig {
    fn default() -> Self {
        Self { max_months: 360 }
    }
}

impl TaxConfig {
    /// mainland Portugal tables as of the 2026 budget
    pub fn portugal_2026() -> Self {
        Self {
            transfer: TransferTaxConfig {
                flat_rate: Rate::from_percentage(dec!(6.5)),
                first_home_brackets: vec![
                    TaxBracket::marginal(Some(Money::from_major(104_261)), Rate::ZERO),
                    TaxBracket::marginal(Some(Money::from_major(142_618)), Rate::from_percentage(2)),
                    TaxBracket::marginal(Some(Money::from_major(194_458)), Rate::from_percentage(5)),
                    TaxBracket::marginal(Some(Money::from_major(324_058)), Rate::from_percentage(7)),
                    TaxBracket::marginal(Some(Money::from_major(648_022)), Rate::from_percentage(8)),
                    TaxBracket::flat(None, Rate::from_percentage(6)),
                ],
            },
            stamp_duty_rate: Rate::from_percentage(dec!(0.8)),
            default_property_tax_rate: Rate::from_percentage(dec!(0.3)),
            rental: RentalTaxConfig {
                new_regime: NewRentalRegime {
                    first_year: 2026,
                    last_year: Some(2029),
                    rent_ceiling: Money::from_major(2_300),
                    reduced_rate: Rate::from_percentage(10),
                    standard_rate: Rate::from_percentage(25),
                },
                legacy_tiers: vec![
                    DurationTier {
                        min_years: 0,
                        rate: Rate::from_percentage(25),
                        renewal_step: Rate::ZERO,
                        floor: Rate::from_percentage(25),
                    },
                    DurationTier {
                        min_years: 2,
                        rate: Rate::from_percentage(25),
                        renewal_step: Rate::from_percentage(2),
                        floor: Rate::from_percentage(15),
                    },
                    DurationTier {
                        min_years: 5,
                        rate: Rate::from_percentage(15),
                        renewal_step: Rate::from_percentage(2),
                        floor: Rate::from_percentage(10),
                    },
                    DurationTier {
                        min_years: 10,
                        rate: Rate::from_percentage(10),
                        renewal_step: Rate::ZERO,
                        floor: Rate::from_percentage(10),
                    },
                    DurationTier {
                        min_years: 20,
                        rate: Rate::from_percentage(5),
                        renewal_step: Rate::ZERO,
                        floor: Rate::from_percentage(5),
                    },
                ],
                special_contract_rate: Rate::ZERO,
            },
            income_brackets: vec![
                TaxBracket::marginal(Some(Money::from_major(8_059)), Rate::from_percentage(dec!(12.5))),
                TaxBracket::marginal(Some(Money::from_major(12_160)), Rate::from_percentage(16)),
                TaxBracket::marginal(Some(Money::from_major(17_233)), Rate::from_percentage(dec!(21.5))),
                TaxBracket::marginal(Some(Money::from_major(22_306)), Rate::from_percentage(dec!(24.4))),
                TaxBracket::marginal(Some(Money::from_major(28_400)), Rate::from_percentage(dec!(31.4))),
                TaxBracket::marginal(Some(Money::from_major(41_629)), Rate::from_percentage(dec!(34.9))),
                TaxBracket::marginal(Some(Money::from_major(44_987)), Rate::from_percentage(dec!(43.1))),
                TaxBracket::marginal(Some(Money::from_major(83_696)), Rate::from_percentage(dec!(44.6))),
                TaxBracket::marginal(None, Rate::from_percentage(48)),
            ],
            capital_gains: CapitalGainsConfig {
                rate: Rate::from_percentage(28),
                resident_inclusion: Rate::from_percentage(50),
                non_resident_inclusion: Rate::from_percentage(100),
            },
        }
    }

    /// check every table for ordering and rate sanity
    pub fn validate(&self) -> Result<()> {
        check_rate("transfer.flat_rate", self.transfer.flat_rate)?;
        check_brackets("transfer.first_home_brackets", &self.transfer.first_home_brackets)?;
        check_rate("stamp_duty_rate", self.stamp_duty_rate)?;
        check_rate("default_property_tax_rate", self.default_property_tax_rate)?;
        check_brackets("income_brackets", &self.income_brackets)?;

        let regime = &self.rental.new_regime;
        check_rate("rental.new_regime.reduced_rate", regime.reduced_rate)?;
        check_rate("rental.new_regime.standard_rate", regime.standard_rate)?;
        if let Some(last) = regime.last_year {
            if last < regime.first_year {
                return Err(EngineError::InvalidConfiguration {
                    message: format!(
                        "new rental regime ends ({}) before it starts ({})",
                        last, regime.first_year
                    ),
                });
            }
        }
        check_rate("rental.special_contract_rate", self.rental.special_contract_rate)?;

        if self.rental.legacy_tiers.is_empty() {
            return Err(EngineError::InvalidConfiguration {
                message: "rental.legacy_tiers must not be empty".to_string(),
            });
        }
        for (index, pair) in self.rental.legacy_tiers.windows(2).enumerate() {
            if pair[1].min_years <= pair[0].min_years {
                return Err(EngineError::UnsortedBrackets {
                    table: "rental.legacy_tiers".to_string(),
                    index: index + 1,
                });
            }
        }
        for tier in &self.rental.legacy_tiers {
            check_rate("rental.legacy_tiers", tier.rate)?;
            check_rate("rental.legacy_tiers", tier.floor)?;
        }

        check_rate("capital_gains.rate", self.capital_gains.rate)?;
        check_rate("capital_gains.resident_inclusion", self.capital_gains.resident_inclusion)?;
        check_rate("capital_gains.non_resident_inclusion", self.capital_gains.non_resident_inclusion)?;
        Ok(())
    }
}

impl EngineConfig {
    /// default configuration: 2026 tax tables, standard solver limits
    pub fn portugal_2026() -> Self {
        Self {
            tax: TaxConfig::portugal_2026(),
            irr: IrrConfig::default(),
            snowball: SnowballConfig::default(),
        }
    }

    /// load and validate a configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.tax.validate()?;

        if self.irr.max_iterations == 0 {
            return Err(EngineError::InvalidConfiguration {
                message: "irr.max_iterations must be positive".to_string(),
            });
        }
        if self.irr.min_rate <= dec!(-1) || self.irr.min_rate >= self.irr.max_rate {
            return Err(EngineError::InvalidConfiguration {
                message: format!(
                    "irr rate band [{}, {}] is invalid",
                    self.irr.min_rate, self.irr.max_rate
                ),
            });
        }
        if self.snowball.max_months == 0 {
            return Err(EngineError::InvalidConfiguration {
                message: "snowball.max_months must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::portugal_2026()
    }
}

fn check_rate(table: &str, rate: Rate) -> Result<()> {
    if rate.as_decimal() < Decimal::ZERO || rate.as_decimal() > Decimal::ONE {
        return Err(EngineError::InvalidTaxRate {
            table: table.to_string(),
            rate,
        });
    }
    Ok(())
}

fn check_brackets(table: &str, brackets: &[TaxBracket]) -> Result<()> {
    if brackets.is_empty() {
        return Err(EngineError::InvalidConfiguration {
            message: format!("{} must not be empty", table),
        });
    }

    let mut previous: Option<Money> = None;
    for (index, bracket) in brackets.iter().enumerate() {
        check_rate(table, bracket.rate)?;
        let is_last = index == brackets.len() - 1;
        match bracket.up_to {
            Some(limit) => {
                if previous.map_or(false, |prev| limit <= prev) {
                    return Err(EngineError::UnsortedBrackets {
                        table: table.to_string(),
                        index,
                    });
                }
                previous = Some(limit);
            }
            None if !is_last => {
                return Err(EngineError::UnsortedBrackets {
                    table: table.to_string(),
                    index,
                });
            }
            None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tax.transfer.first_home_brackets.len(), 6);
        assert_eq!(config.snowball.max_months, 360);
        assert_eq!(config.irr.max_iterations, 100);
    }

    #[test]
    fn test_json_round_trip_keeps_tables() {
        let config = EngineConfig::portugal_2026();
        let json = config.to_json_pretty().unwrap();
        let loaded = EngineConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsorted_brackets_rejected() {
        let mut config = EngineConfig::portugal_2026();
        config.tax.transfer.first_home_brackets.swap(1, 2);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, EngineError::UnsortedBrackets { index: 2, .. }));
    }

    #[test]
    fn test_open_bracket_must_be_last() {
        let mut config = EngineConfig::portugal_2026();
        config.tax.income_brackets.insert(0, TaxBracket::marginal(None, Rate::from_percentage(10)));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_regime_years_rejected() {
        let mut config = EngineConfig::portugal_2026();
        config.tax.rental.new_regime.last_year = Some(2020);
        assert!(matches!(
            config.validate().unwrap_err(),
            EngineError::InvalidConfiguration { .. }
        ));
    }

    #[test]
    fn test_rate_above_one_rejected() {
        let mut config = EngineConfig::portugal_2026();
        config.tax.capital_gains.rate = Rate::from_percentage(140);
        assert!(matches!(
            config.validate().unwrap_err(),
            EngineError::InvalidTaxRate { .. }
        ));
    }

    #[test]
    fn test_malformed_document() {
        let err = EngineConfig::from_json("{\"tax\": 3}").unwrap_err();
        assert!(matches!(err, EngineError::Json(_)));
    }

    #[test]
    fn test_regime_year_range() {
        let regime = &TaxConfig::portugal_2026().rental.new_regime;
        assert!(!regime.applies_to(2025));
        assert!(regime.applies_to(2026));
        assert!(regime.applies_to(2029));
        assert!(!regime.applies_to(2030));
    }
}
