//! Currencies, the party wallet, and combat income rates.

use resonance_common::CommandError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies earned in combat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// Earned by hits and kills.
    #[default]
    Gold,
    /// Trickles in over time; pays for spell draws.
    Gems,
}

impl Currency {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Gems => "gems",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Income rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeConfig {
    /// Gold per point of basic-attack damage.
    pub hit_rate: f64,
    /// Gold per point of a defeated enemy's max health.
    pub bounty_rate: f64,
    /// Wave-clear bonus before the time and wave multipliers.
    pub clear_bonus_base: f64,
    /// Weight of the remaining-time fraction in the clear bonus.
    pub clear_time_weight: f64,
    /// Gems credited per second while a wave is running.
    pub gems_per_second: f64,
    /// Gem balance ceiling.
    pub max_gems: f64,
    /// Gold at start.
    pub starting_gold: f64,
    /// Gems at start.
    pub starting_gems: f64,
}

impl Default for IncomeConfig {
    fn default() -> Self {
        Self {
            hit_rate: 0.02,
            bounty_rate: 0.02,
            clear_bonus_base: 50.0,
            clear_time_weight: 0.5,
            gems_per_second: 0.0,
            max_gems: 100.0,
            starting_gold: 0.0,
            starting_gems: 0.0,
        }
    }
}

impl IncomeConfig {
    /// Clamps ranges.
    pub fn validate(&mut self) {
        self.hit_rate = self.hit_rate.max(0.0);
        self.bounty_rate = self.bounty_rate.max(0.0);
        self.clear_bonus_base = self.clear_bonus_base.max(0.0);
        self.clear_time_weight = self.clear_time_weight.max(0.0);
        self.gems_per_second = self.gems_per_second.max(0.0);
        self.max_gems = self.max_gems.max(0.0);
        self.starting_gold = self.starting_gold.max(0.0);
        self.starting_gems = self.starting_gems.clamp(0.0, self.max_gems);
    }

    /// Gold for one basic attack.
    #[must_use]
    pub fn hit_income(&self, damage: f64, gold_per_hit: f64) -> f64 {
        damage * self.hit_rate + gold_per_hit
    }

    /// Gold for defeating an enemy.
    #[must_use]
    pub fn bounty(&self, max_health: f64) -> f64 {
        max_health * self.bounty_rate
    }

    /// Wave-clear bonus.
    #[must_use]
    pub fn clear_bonus(&self, time_multiplier: f64, area_wave: u32) -> u64 {
        let bonus = (self.clear_bonus_base * time_multiplier * f64::from(area_wave)).floor();
        if bonus.is_finite() && bonus > 0.0 {
            bonus as u64
        } else {
            0
        }
    }
}

/// The party's purse.
///
/// Balances are fractional (income rates are), costs are whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    gold: f64,
    gems: f64,
    max_gems: f64,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new(&IncomeConfig::default())
    }
}

impl Wallet {
    /// Creates a wallet with the configured starting balances.
    #[must_use]
    pub fn new(config: &IncomeConfig) -> Self {
        Self {
            gold: config.starting_gold.max(0.0),
            gems: config.starting_gems.clamp(0.0, config.max_gems.max(0.0)),
            max_gems: config.max_gems.max(0.0),
        }
    }

    /// Exact balance.
    #[must_use]
    pub fn balance(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Gold => self.gold,
            Currency::Gems => self.gems,
        }
    }

    /// Whole units available to spend.
    #[must_use]
    pub fn spendable(&self, currency: Currency) -> u64 {
        let balance = self.balance(currency).floor();
        if balance.is_finite() && balance > 0.0 {
            balance as u64
        } else {
            0
        }
    }

    /// Adds currency. Returns the amount actually credited (gems are capped).
    pub fn earn(&mut self, currency: Currency, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        match currency {
            Currency::Gold => {
                self.gold += amount;
                amount
            },
            Currency::Gems => {
                let before = self.gems;
                self.gems = (self.gems + amount).min(self.max_gems);
                self.gems - before
            },
        }
    }

    /// Removes currency, or fails without touching the balance.
    pub fn spend(&mut self, currency: Currency, amount: u64) -> Result<(), CommandError> {
        let have = self.spendable(currency);
        if have < amount {
            return Err(CommandError::InsufficientFunds {
                currency: currency.as_str(),
                needed: amount,
                have,
            });
        }
        let cost = amount as f64;
        match currency {
            Currency::Gold => self.gold -= cost,
            Currency::Gems => self.gems -= cost,
        }
        Ok(())
    }

    /// Whether `amount` whole units are available.
    #[must_use]
    pub fn can_afford(&self, currency: Currency, amount: u64) -> bool {
        self.spendable(currency) >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earn_and_spend() {
        let mut wallet = Wallet::default();
        assert!((wallet.earn(Currency::Gold, 12.5) - 12.5).abs() < f64::EPSILON);
        assert!(wallet.spend(Currency::Gold, 12).is_ok());
        assert!((wallet.balance(Currency::Gold) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_insufficient_funds_leaves_balance() {
        let mut wallet = Wallet::default();
        wallet.earn(Currency::Gems, 4.9);
        let err = wallet.spend(Currency::Gems, 5);
        assert_eq!(
            err,
            Err(CommandError::InsufficientFunds {
                currency: "gems",
                needed: 5,
                have: 4,
            })
        );
        assert!((wallet.balance(Currency::Gems) - 4.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_gems_capped() {
        let config = IncomeConfig {
            max_gems: 10.0,
            ..IncomeConfig::default()
        };
        let mut wallet = Wallet::new(&config);
        assert!((wallet.earn(Currency::Gems, 8.0) - 8.0).abs() < f64::EPSILON);
        assert!((wallet.earn(Currency::Gems, 8.0) - 2.0).abs() < f64::EPSILON);
        assert!((wallet.balance(Currency::Gems) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_bad_amounts() {
        let mut wallet = Wallet::default();
        assert!(wallet.earn(Currency::Gold, -3.0).abs() < f64::EPSILON);
        assert!(wallet.earn(Currency::Gold, f64::NAN).abs() < f64::EPSILON);
        assert!(wallet.balance(Currency::Gold).abs() < f64::EPSILON);
    }

    #[test]
    fn test_income_formulas() {
        let income = IncomeConfig::default();
        assert!((income.hit_income(100.0, 1.0) - 3.0).abs() < 1e-9);
        assert!((income.bounty(1000.0) - 20.0).abs() < 1e-9);
        assert_eq!(income.clear_bonus(1.125, 3), 168);
    }
}
