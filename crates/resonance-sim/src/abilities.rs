//! Skill and spell behaviors for the demo content.
//!
//! Content files only name these; the registries built here supply the code.

use resonance_combat::{
    CastContext, DamageContext, Element, Enemy, SkillBehavior, SkillDefinition, SkillRegistry,
    SpellDefinition, SpellRegistry, SummonInstance, Unit, GRID_SIZE,
};
use resonance_common::ContentError;

/// Counter types Brilliant Light can shift into.
const SHIFT_ELEMENTS: [Element; 8] = [
    Element::Fire,
    Element::Water,
    Element::Poison,
    Element::Light,
    Element::Dark,
    Element::Air,
    Element::Undead,
    Element::Physical,
];

/// All unit and summon skills the demo content references.
pub fn skills() -> Result<SkillRegistry, ContentError> {
    SkillRegistry::new()
        .with(
            SkillDefinition::new("pummel", Element::Physical, SkillBehavior::passive(pummel))
                .with_name("Pummel"),
        )?
        .with(
            SkillDefinition::new(
                "followThrough",
                Element::Physical,
                SkillBehavior::active(follow_through),
            )
            .with_name("Follow Through")
            .with_cooldown_ms(7000.0),
        )?
        .with(
            SkillDefinition::new("plague", Element::Undead, SkillBehavior::active(plague))
                .with_name("Plague")
                .with_cooldown_ms(6000.0),
        )?
        .with(
            SkillDefinition::new(
                "zombieAmbush",
                Element::Undead,
                SkillBehavior::active(zombie_ambush),
            )
            .with_name("Zombie Ambush")
            .with_cooldown_ms(3500.0),
        )?
        .with(
            SkillDefinition::new(
                "feastOfAges",
                Element::Undead,
                SkillBehavior::active(feast_of_ages),
            )
            .with_name("Feast of Ages")
            .with_cooldown_ms(5000.0),
        )?
        .with(
            SkillDefinition::new(
                "boneShatter",
                Element::Undead,
                SkillBehavior::on_expire(bone_shatter),
            )
            .with_name("Bone Shatter"),
        )?
        .with(
            SkillDefinition::new("mend", Element::Light, SkillBehavior::utility(mend))
                .with_name("Mend"),
        )
}

/// Hero spells for the demo library.
pub fn spells() -> Result<SpellRegistry, ContentError> {
    SpellRegistry::new()
        .with(
            SpellDefinition::new("moonbeam", Element::Dark, 80.0, moonbeam)
                .with_name("Moonbeam")
                .with_cost(20),
        )?
        .with(
            SpellDefinition::new("brilliantLight", Element::Light, 100.0, brilliant_light)
                .with_name("Brilliant Light")
                .with_cost(20),
        )?
        .with(
            SpellDefinition::new("breathOfDecay", Element::Undead, 180.0, breath_of_decay)
                .with_name("Breath of Decay")
                .with_cost(5),
        )
}

// ============================================================================
// Skills
// ============================================================================

/// Multiplies repeat hits on the same target.
fn pummel(attacker: &Unit, _target: &Enemy, ctx: &mut DamageContext) {
    if ctx.same_target_streak == 0 {
        return;
    }
    let bonus = 1.0 + f64::from(attacker.level) * 0.1;
    ctx.damage *= (1.0 + f64::from(ctx.same_target_streak) * bonus).round();
}

/// Hits every enemy in the target's column.
fn follow_through(ctx: &mut CastContext<'_>) {
    let Some(col) = ctx.target().and_then(|t| ctx.position(t)).map(|pos| pos.col) else {
        return;
    };
    for uid in ctx.enemies_in_column(col) {
        ctx.strike(uid, 180.0);
    }
}

/// Rots the target over five seconds.
fn plague(ctx: &mut CastContext<'_>) {
    let (Some(target), Some(attack)) = (ctx.target(), ctx.caster().map(|c| c.stats.attack_power))
    else {
        return;
    };
    ctx.apply_dot(target, (attack * 0.5).max(1.0), 5.0);
    ctx.set_visual(target, "plague", 5.0);
}

/// Hits the target, then splashes its neighbors.
fn zombie_ambush(ctx: &mut CastContext<'_>) {
    let Some(target) = ctx.target() else {
        return;
    };
    let splash = ctx.adjacent_to(target);
    ctx.strike(target, 120.0);
    for uid in splash {
        ctx.strike(uid, 60.0);
    }
}

/// Drains the target and heals the party by a tenth of the damage.
fn feast_of_ages(ctx: &mut CastContext<'_>) {
    let Some(target) = ctx.target() else {
        return;
    };
    if let Some(outcome) = ctx.strike(target, 150.0) {
        ctx.heal_party(outcome.damage * 0.1);
    }
}

/// An expiring skeleton bursts into the target and its neighbors.
fn bone_shatter(summon: &SummonInstance, ctx: &mut CastContext<'_>) {
    let Some(target) = ctx.target() else {
        return;
    };
    let damage = summon.stats.attack_power;
    let mut hit = ctx.adjacent_to(target);
    hit.push(target);
    for uid in hit {
        ctx.deal_damage(uid, damage);
    }
}

/// Small heal plus a little extra wave time.
fn mend(ctx: &mut CastContext<'_>) {
    ctx.heal_party(15.0);
    ctx.add_wave_time(3.0);
}

// ============================================================================
// Spells
// ============================================================================

/// Gathers every counter on the field, scatters them as dark counters, then
/// spends them for damage.
fn moonbeam(spell: &SpellDefinition, ctx: &mut CastContext<'_>) {
    let enemies = ctx.enemies();
    if enemies.is_empty() {
        return;
    }

    let mut total = 0u32;
    for &uid in &enemies {
        total += ctx.drain_counters(uid).iter().map(|(_, n)| n).sum::<u32>();
    }
    for _ in 0..total {
        let pick = enemies[ctx.rng().usize(..enemies.len())];
        ctx.add_counters(pick, Element::Dark, 1);
    }

    for uid in enemies {
        let dark = ctx.consume_counters(uid, Element::Dark, u32::MAX);
        if dark > 0 {
            ctx.deal_damage(uid, spell.magnitude * f64::from(dark));
            ctx.set_visual(uid, "moonbeam", 0.5);
        }
    }
}

/// Collapses each enemy's counters into one random element; light ones
/// detonate.
fn brilliant_light(spell: &SpellDefinition, ctx: &mut CastContext<'_>) {
    for uid in ctx.enemies() {
        let total: u32 = ctx.drain_counters(uid).iter().map(|(_, n)| n).sum();
        if total == 0 {
            continue;
        }
        let element = SHIFT_ELEMENTS[ctx.rng().usize(..SHIFT_ELEMENTS.len())];
        if element == Element::Light {
            ctx.deal_damage(uid, spell.magnitude * f64::from(total));
            ctx.set_visual(uid, "brilliantLight", 0.5);
        } else {
            ctx.add_counters(uid, element, total);
        }
    }
}

/// Hits the front rows; higher tiers reach further back.
fn breath_of_decay(spell: &SpellDefinition, ctx: &mut CastContext<'_>) {
    let rows = (spell.tier as usize).clamp(1, GRID_SIZE);
    for row in (0..GRID_SIZE).rev().take(rows) {
        for uid in ctx.enemies_in_row(row) {
            ctx.strike(uid, spell.magnitude);
            ctx.set_visual(uid, "dark-flash", 0.8);
        }
    }
}
