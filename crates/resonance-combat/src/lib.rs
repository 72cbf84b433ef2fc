//! # Resonance Combat
//!
//! Combat and progression core for an elemental incremental battler.
//!
//! This crate provides the whole simulation behind a host-driven tick:
//! - Elemental matchups with the neutral-damage ramp
//! - Damage resolution, crits, passives, and party synergy
//! - Status effects (elemental counters and damage-over-time)
//! - Cooldown scheduling and skill hooks
//! - The 3×3 enemy grid, wave timer, and area progression
//! - Summons, spells, and the gold/gem economy
//! - Notification events and the recent-attack log

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod combat_loop;
pub mod config;
pub mod content;
pub mod context;
pub mod cooldown;
pub mod damage;
pub mod economy;
pub mod element;
pub mod enemy;
pub mod events;
pub mod grid;
pub mod party;
pub mod scaling;
pub mod skills;
pub mod spells;
pub mod status;
pub mod summon;
pub mod timer;
pub mod unit;
pub mod wave;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::combat_loop::*;
    pub use crate::config::*;
    pub use crate::content::*;
    pub use crate::context::*;
    pub use crate::cooldown::*;
    pub use crate::damage::*;
    pub use crate::economy::*;
    pub use crate::element::*;
    pub use crate::enemy::*;
    pub use crate::events::*;
    pub use crate::grid::*;
    pub use crate::party::*;
    pub use crate::scaling::*;
    pub use crate::skills::*;
    pub use crate::spells::*;
    pub use crate::status::*;
    pub use crate::summon::*;
    pub use crate::timer::*;
    pub use crate::unit::*;
    pub use crate::wave::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    const PACK: &str = r#"(
        enemies: [
            (id: "slime", name: "Slime", element: "pest"),
            (id: "golem", name: "Golem", element: "earth"),
        ],
        areas: [
            (id: "marsh", name: "Marsh", max_waves: 2, enemies: ["slime"], boss: "golem"),
        ],
        party: [
            (name: "Fighter", resonance: physical),
            (name: "Druid", resonance: poison),
        ],
    )"#;

    #[test]
    fn test_ron_pack_runs() {
        let content =
            ContentRegistry::from_ron(PACK, SkillRegistry::new(), SpellRegistry::new())
                .expect("valid pack");
        let mut combat = CombatLoop::new(content, CombatConfig::default());
        combat.start();
        assert!(combat.waves().is_active());
        assert_eq!(combat.roster().len(), 2);

        for _ in 0..100 {
            combat.advance(0.25);
        }
        assert!(!combat.log().is_empty());
        assert!(combat.balance(Currency::Gold) > 0.0);
    }

    #[test]
    fn test_wallet_rejects_overdraw() {
        let mut wallet = Wallet::new(&IncomeConfig::default());
        assert!(wallet.spend(Currency::Gold, 1).is_err());
        wallet.earn(Currency::Gold, 3.5);
        assert!(wallet.spend(Currency::Gold, 3).is_ok());
        assert_eq!(wallet.spendable(Currency::Gold), 0);
    }
}
