//! The combat orchestrator: owns every component and exposes the host API.
//!
//! Each [`CombatLoop::advance`] runs, in order:
//! 1. status effects (DOT ticks) and visual countdowns
//! 2. summon decay and expiry hooks
//! 3. the wave timer and progression, plus the gem trickle
//! 4. cooldowns and the skills they fire
//! 5. auto-attacks, skipping units that cast this tick
//! 6. summon attempts for every defeat settled this tick

use crate::config::CombatConfig;
use crate::content::{ContentPack, ContentRegistry, UnitDefinition};
use crate::context::{Arena, CastContext};
use crate::cooldown::CooldownScheduler;
use crate::damage::{DamageResolver, StrikeKind};
use crate::economy::Currency;
use crate::events::{CombatEvent, CombatLog, EventBus, HitKind};
use crate::grid::GridPos;
use crate::party::{PartyModifiers, Roster};
use crate::skills::{SkillBehavior, SkillRegistry};
use crate::spells::{SpellHand, SpellRegistry};
use crate::status::StatusEffectTracker;
use crate::summon::{SummonInstance, SummonLifecycle, SummonOutcome};
use crate::unit::Unit;
use crate::wave::{WaveDirector, WaveTransition};
use ahash::AHashSet;
use resonance_common::{
    AreaId, CommandError, CommandResult, ResonanceResult, SkillId, SpellId, UnitId,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

fn rejected<T>(command: &'static str, result: CommandResult<T>) -> CommandResult<T> {
    if let Err(e) = &result {
        warn!(command, error = %e, "Command rejected");
    }
    result
}

/// A running fight.
#[derive(Debug)]
pub struct CombatLoop {
    content: Arc<ContentRegistry>,
    config: CombatConfig,
    roster: Roster,
    arena: Arena,
    cooldowns: CooldownScheduler,
    summons: SummonLifecycle,
    hand: SpellHand,
}

impl CombatLoop {
    /// Builds a fight over validated content. Call [`start`](Self::start) to
    /// spawn the first wave.
    #[must_use]
    pub fn new(content: ContentRegistry, mut config: CombatConfig) -> Self {
        config.validate();
        let content = Arc::new(content);

        let table = content.matchups().clone().with_ramp(config.matchup.clone());
        let resolver = DamageResolver::new(table, config.attack.crit_multiplier);

        let mut roster = Roster::new();
        for def in content.party() {
            let id = roster.next_member_id();
            roster.insert(def.instantiate(id));
        }
        let mut modifiers = PartyModifiers::new(config.global_attack_bonus, &config.synergy);
        modifiers.recompute(&roster, &config.synergy);

        let arena = Arena::new(
            WaveDirector::new(Arc::clone(&content), &config),
            StatusEffectTracker::new(&config.status),
            resolver,
            modifiers,
            config.income.clone(),
            EventBus::new(config.event_capacity),
            CombatLog::new(config.combat_log_capacity),
            fastrand::Rng::with_seed(config.seed),
        );

        info!(party = roster.len(), seed = config.seed, "Combat loop created");
        Self {
            summons: SummonLifecycle::new(config.summons.clone()),
            content,
            config,
            roster,
            arena,
            cooldowns: CooldownScheduler::new(),
            hand: SpellHand::new(),
        }
    }

    /// Validates a content pack against the given hooks and builds a fight.
    pub fn from_pack(
        pack: ContentPack,
        skills: SkillRegistry,
        spells: SpellRegistry,
        config: CombatConfig,
    ) -> ResonanceResult<Self> {
        let content = ContentRegistry::new(pack, skills, spells)?;
        Ok(Self::new(content, config))
    }

    /// Spawns the first wave of the starting area.
    pub fn start(&mut self) {
        let health = self.roster.total_health();
        let started = self.arena.waves.start(health, &mut self.arena.rng);
        self.after_transitions(started.into_iter().collect());
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances the fight by `dt` seconds. Non-finite or negative values count
    /// as zero.
    pub fn advance(&mut self, dt: f64) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.arena.tick_status(dt);
        self.arena.waves.tick_visuals(dt);

        let expired = self.summons.advance(dt, &mut self.roster);
        self.handle_expired(expired, false);

        let health = self.roster.total_health();
        let transitions = self.arena.waves.advance(dt, health, &mut self.arena.rng);
        self.after_transitions(transitions);

        if !self.arena.waves.is_active() {
            self.process_defeats();
            return;
        }

        let gems = self.config.income.gems_per_second * dt;
        if gems > 0.0 {
            self.arena.earn(Currency::Gems, gems);
        }

        let content = Arc::clone(&self.content);
        let ready = self
            .cooldowns
            .advance(&mut self.roster, content.skills(), dt * 1000.0);
        let mut casters = AHashSet::new();
        for skill in ready {
            self.arena.publish(CombatEvent::SkillReady {
                unit: skill.unit,
                skill: skill.skill.clone(),
            });
            if self.fire_skill(skill.unit, &skill.skill) {
                casters.insert(skill.unit);
            }
            self.rearm(skill.unit, &skill.skill);
        }

        if self.arena.is_auto_attacking() {
            self.auto_attacks(dt, &casters);
        }

        self.process_defeats();
    }

    fn after_transitions(&mut self, transitions: Vec<WaveTransition>) {
        let started = transitions
            .iter()
            .any(|t| matches!(t, WaveTransition::Started { .. }));
        self.arena.apply_transitions(transitions);
        if started {
            for unit in self.roster.iter_mut() {
                unit.attack_timer = 0.0;
                unit.targeting.reset();
            }
        }
    }

    /// Runs an active or utility skill's hook for `unit`.
    fn fire_skill(&mut self, unit: UnitId, skill: &SkillId) -> bool {
        let content = Arc::clone(&self.content);
        let Some(def) = content.skills().get(skill) else {
            return false;
        };
        let hook = match &def.behavior {
            SkillBehavior::Active(hook) | SkillBehavior::Utility(hook) => Arc::clone(hook),
            SkillBehavior::Passive(_) | SkillBehavior::OnExpire(_) => return false,
        };
        debug!(%unit, %skill, "Skill fired");
        let mut ctx = CastContext::new(&mut self.roster, &mut self.arena, Some(unit), def.element);
        hook.activate(&mut ctx);
        true
    }

    /// Resets a fired skill to its declared cooldown.
    fn rearm(&mut self, unit: UnitId, skill: &SkillId) {
        let Some(def) = self.content.skills().get(skill) else {
            return;
        };
        if let Some(state) = self
            .roster
            .get_mut(unit)
            .and_then(|u| u.skills.get_mut(skill))
        {
            CooldownScheduler::rearm(state, def);
        }
    }

    fn auto_attacks(&mut self, dt: f64, casters: &AHashSet<UnitId>) {
        for id in self.roster.ids() {
            if !self.arena.waves.is_active() || self.arena.waves.grid().is_empty() {
                break;
            }
            if casters.contains(&id) {
                continue;
            }
            let Some(unit) = self.roster.get_mut(id) else {
                continue;
            };
            if !unit.has_auto_attack || !unit.is_alive() {
                continue;
            }
            unit.attack_timer -= dt;
            if unit.attack_timer > 0.0 {
                continue;
            }
            unit.attack_timer += unit.attack_interval(&self.config.attack);
            self.basic_attack(id);
        }
    }

    fn basic_attack(&mut self, id: UnitId) {
        let Some(pos) = self.arena.waves.resolve_target() else {
            return;
        };
        self.arena.sync_target();
        let Some(target) = self.arena.waves.grid().get(pos).map(|e| e.uid) else {
            return;
        };

        let content = Arc::clone(&self.content);
        let Some(unit) = self.roster.get_mut(id) else {
            return;
        };
        let streak = unit.targeting.record_hit(target);
        let unit: &Unit = unit;
        let passives = content.skills().passives_for(unit);

        let Some(outcome) = self.arena.resolve_strike(
            unit,
            target,
            unit.resonance,
            StrikeKind::Basic {
                streak,
                passives: &passives,
            },
        ) else {
            return;
        };

        let income = self
            .arena
            .income
            .hit_income(outcome.damage, unit.gold_per_hit);
        self.arena.earn(Currency::Gold, income);
        self.arena
            .land_unit_hit(unit, target, &outcome, HitKind::Attack);
    }

    /// Gives every summoner one summon attempt per settled defeat.
    fn process_defeats(&mut self) {
        let defeats = self.arena.take_defeats();
        if defeats.is_empty() {
            return;
        }
        let summoners: Vec<UnitId> = self
            .roster
            .members()
            .filter(|u| u.can_summon)
            .map(|u| u.id)
            .collect();
        if summoners.is_empty() {
            return;
        }

        let content = Arc::clone(&self.content);
        for _ in &defeats {
            for &summoner in &summoners {
                let outcome = self.summons.trigger(
                    summoner,
                    &mut self.roster,
                    content.summons(),
                    &mut self.arena.rng,
                );
                self.announce_summon(summoner, outcome);
            }
        }
    }

    fn announce_summon(&mut self, summoner: UnitId, outcome: SummonOutcome) {
        match outcome {
            SummonOutcome::Created(unit) => {
                let interval = self
                    .roster
                    .get(unit)
                    .map(|u| u.attack_interval(&self.config.attack));
                if let (Some(interval), Some(fielded)) = (interval, self.roster.get_mut(unit)) {
                    fielded.attack_timer = interval;
                }
                if let Some(instance) = self.summons.instance(unit) {
                    self.arena.publish(CombatEvent::SummonCreated {
                        summon: unit,
                        template: instance.template.clone(),
                        summoner,
                    });
                }
            },
            SummonOutcome::Stacked { unit, stacks } => {
                if let Some(instance) = self.summons.instance(unit) {
                    self.arena.publish(CombatEvent::SummonStacked {
                        summon: unit,
                        template: instance.template.clone(),
                        stacks,
                    });
                }
            },
            SummonOutcome::NoSummon => {},
        }
    }

    /// Announces expired summons and fires their expiry hooks.
    ///
    /// The summoner is the caster when it is still on the roster.
    fn handle_expired(&mut self, expired: Vec<SummonInstance>, forced: bool) {
        let content = Arc::clone(&self.content);
        for instance in expired {
            self.arena.publish(CombatEvent::SummonExpired {
                summon: instance.unit,
                template: instance.template.clone(),
                forced,
            });

            let Some(def) = instance
                .on_expire
                .as_ref()
                .and_then(|id| content.skills().get(id))
            else {
                continue;
            };
            let SkillBehavior::OnExpire(hook) = &def.behavior else {
                continue;
            };
            let caster = self
                .roster
                .contains(instance.summoner)
                .then_some(instance.summoner);
            let mut ctx = CastContext::new(&mut self.roster, &mut self.arena, caster, def.element);
            hook.on_expire(&instance, &mut ctx);
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Focuses a grid cell.
    pub fn set_target(&mut self, row: usize, col: usize) -> CommandResult<GridPos> {
        let result = self.arena.waves.set_target(row, col);
        if result.is_ok() {
            self.arena.sync_target();
        }
        rejected("set_target", result)
    }

    /// Casts a skill by hand.
    ///
    /// Active skills must be off cooldown and rearm afterwards; utility
    /// skills fire immediately. Passive and expiry skills cannot be cast.
    /// Inactive slots, and any cast with no live wave to hit, are rejected.
    pub fn cast_skill(&mut self, unit: UnitId, skill: &SkillId) -> CommandResult<()> {
        let result = self.try_cast_skill(unit, skill);
        rejected("cast_skill", result)
    }

    fn try_cast_skill(&mut self, unit: UnitId, skill: &SkillId) -> CommandResult<()> {
        let content = Arc::clone(&self.content);
        let owner = self.roster.get(unit).ok_or(CommandError::UnknownUnit(unit))?;
        let state = owner
            .skills
            .get(skill)
            .copied()
            .ok_or_else(|| CommandError::SkillNotOwned {
                unit,
                skill: skill.clone(),
            })?;
        let def = content
            .skills()
            .get(skill)
            .ok_or_else(|| CommandError::SkillNotOwned {
                unit,
                skill: skill.clone(),
            })?;

        if matches!(
            def.behavior,
            SkillBehavior::Passive(_) | SkillBehavior::OnExpire(_)
        ) {
            return Err(CommandError::NotCastable(skill.clone()));
        }
        if !state.active {
            return Err(CommandError::SkillInactive(skill.clone()));
        }
        if !self.arena.waves.is_active() || self.arena.waves.grid().is_empty() {
            return Err(CommandError::NoActiveEnemies);
        }

        match &def.behavior {
            SkillBehavior::Active(_) => {
                if state.cooldown_remaining > 0.0 {
                    return Err(CommandError::SkillOnCooldown {
                        skill: skill.clone(),
                        remaining_ms: state.cooldown_remaining,
                    });
                }
                self.fire_skill(unit, skill);
                self.rearm(unit, skill);
            },
            SkillBehavior::Utility(_) => {
                self.fire_skill(unit, skill);
            },
            SkillBehavior::Passive(_) | SkillBehavior::OnExpire(_) => {
                return Err(CommandError::NotCastable(skill.clone()));
            },
        }
        self.process_defeats();
        Ok(())
    }

    /// Pays gems for a fresh spell hand.
    pub fn draw_hand(&mut self) -> CommandResult<Vec<SpellId>> {
        let result = self.try_draw_hand();
        rejected("draw_hand", result)
    }

    fn try_draw_hand(&mut self) -> CommandResult<Vec<SpellId>> {
        let cost = self.config.hand.draw_cost;
        let have = self.arena.wallet.spendable(Currency::Gems);
        if have < cost {
            return Err(CommandError::InsufficientFunds {
                currency: Currency::Gems.as_str(),
                needed: cost,
                have,
            });
        }
        let hand = self
            .hand
            .draw(self.content.spells(), &self.config.hand, &mut self.arena.rng)?
            .to_vec();
        self.arena.spend(Currency::Gems, cost)?;
        self.arena.publish(CombatEvent::HandDrawn { hand: hand.clone() });
        Ok(hand)
    }

    /// Casts the spell in a hand slot and removes the slot.
    pub fn cast_from_hand(&mut self, index: usize) -> CommandResult<SpellId> {
        let result = self.try_cast_from_hand(index);
        rejected("cast_from_hand", result)
    }

    fn try_cast_from_hand(&mut self, index: usize) -> CommandResult<SpellId> {
        let content = Arc::clone(&self.content);
        let id = self.hand.peek(index)?.clone();
        let spell = content
            .spells()
            .get(&id)
            .ok_or_else(|| CommandError::UnknownSpell(id.clone()))?;
        if !self.arena.waves.is_active() || self.arena.waves.grid().is_empty() {
            return Err(CommandError::NoActiveEnemies);
        }
        let have = self.arena.wallet.spendable(Currency::Gems);
        if have < spell.gem_cost {
            return Err(CommandError::InsufficientFunds {
                currency: Currency::Gems.as_str(),
                needed: spell.gem_cost,
                have,
            });
        }

        info!(spell = %id, "Casting spell");
        {
            let mut ctx = CastContext::new(&mut self.roster, &mut self.arena, None, spell.element);
            spell.hook.cast(spell, &mut ctx);
        }
        self.arena.spend(Currency::Gems, spell.gem_cost)?;
        self.hand.take(index)?;
        self.arena.publish(CombatEvent::SpellCast { spell: id.clone() });
        self.process_defeats();
        Ok(id)
    }

    /// Restarts at wave 1 of another area.
    pub fn select_area(&mut self, area: &AreaId) -> CommandResult<()> {
        let health = self.roster.total_health();
        let result = self
            .arena
            .waves
            .select_area(area, health, &mut self.arena.rng);
        match rejected("select_area", result) {
            Ok(started) => {
                self.after_transitions(started.into_iter().collect());
                Ok(())
            },
            Err(e) => Err(e),
        }
    }

    /// Adds a party member. Its skills must be registered.
    pub fn add_member(&mut self, def: &UnitDefinition) -> ResonanceResult<UnitId> {
        self.content.validate_unit(def)?;
        let id = self.roster.next_member_id();
        let mut unit = def.instantiate(id);
        unit.attack_timer = unit.attack_interval(&self.config.attack);
        self.roster.insert(unit);
        self.arena
            .modifiers
            .recompute(&self.roster, &self.config.synergy);
        info!(unit = %id, name = %def.name, "Member added");
        Ok(id)
    }

    /// Removes a party member. Its summons expire first, firing their hooks.
    pub fn remove_member(&mut self, unit: UnitId) -> CommandResult<Unit> {
        let result = self.try_remove_member(unit);
        rejected("remove_member", result)
    }

    fn try_remove_member(&mut self, unit: UnitId) -> CommandResult<Unit> {
        if !self.roster.members().any(|u| u.id == unit) {
            return Err(CommandError::UnknownUnit(unit));
        }
        let expired = self.summons.expire_owned_by(unit, &mut self.roster);
        self.handle_expired(expired, true);
        let removed = self
            .roster
            .remove(unit)
            .ok_or(CommandError::UnknownUnit(unit))?;
        self.arena
            .modifiers
            .recompute(&self.roster, &self.config.synergy);
        self.process_defeats();
        info!(%unit, name = %removed.name, "Member removed");
        Ok(removed)
    }

    /// Freezes the wave timer.
    pub fn pause(&mut self) {
        self.arena.waves.pause();
    }

    /// Unfreezes the wave timer.
    pub fn resume(&mut self) {
        self.arena.waves.resume();
    }

    /// Replaces the flat party attack bonus.
    pub fn set_global_attack_bonus(&mut self, bonus: f64) {
        self.arena.modifiers.set_global_attack_bonus(bonus);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Drains pending notifications.
    pub fn drain_events(&self) -> Vec<CombatEvent> {
        self.arena.events.drain()
    }

    /// Notification bus, for hosts that want their own handles.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.arena.events
    }

    /// Party and summons.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Battle state.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Grid, timer, and progression.
    #[must_use]
    pub fn waves(&self) -> &WaveDirector {
        &self.arena.waves
    }

    /// Fielded summons.
    #[must_use]
    pub fn summons(&self) -> &SummonLifecycle {
        &self.summons
    }

    /// Spell hand.
    #[must_use]
    pub fn hand(&self) -> &SpellHand {
        &self.hand
    }

    /// Recent attacks.
    #[must_use]
    pub fn log(&self) -> &CombatLog {
        &self.arena.log
    }

    /// Balance of a currency.
    #[must_use]
    pub fn balance(&self, currency: Currency) -> f64 {
        self.arena.wallet.balance(currency)
    }

    /// Tunables in use.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Validated content.
    #[must_use]
    pub fn content(&self) -> &ContentRegistry {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{fixtures, SkillSlot, SummonTemplate};
    use crate::element::Element;
    use crate::skills::SkillDefinition;
    use crate::spells::SpellDefinition;
    use crate::unit::UnitStats;
    use resonance_common::SummonTemplateId;

    fn poke(ctx: &mut CastContext<'_>) {
        if let Some(target) = ctx.target() {
            ctx.deal_damage(target, 7.0);
        }
    }

    fn smite(ctx: &mut CastContext<'_>) {
        if let Some(target) = ctx.target() {
            ctx.deal_damage(target, 1.0e9);
        }
    }

    fn focus(_: &Unit, _: &crate::enemy::Enemy, ctx: &mut crate::damage::DamageContext) {
        ctx.damage += 1.0;
    }

    /// Deals 1 plus whatever cooldown its own skill shows while the hook runs.
    fn gauge(ctx: &mut CastContext<'_>) {
        let remaining = ctx
            .caster()
            .and_then(|c| c.skills.get(&SkillId::new("gauge")))
            .map_or(0.0, |s| s.cooldown_remaining);
        if let Some(target) = ctx.target() {
            ctx.deal_damage(target, 1.0 + remaining);
        }
    }

    fn bank(_: &SummonInstance, ctx: &mut CastContext<'_>) {
        ctx.add_time_shield(2.0);
    }

    fn bolt(spell: &SpellDefinition, ctx: &mut CastContext<'_>) {
        if let Some(target) = ctx.target() {
            ctx.strike(target, spell.magnitude);
        }
    }

    fn skills() -> SkillRegistry {
        SkillRegistry::new()
            .with(
                SkillDefinition::new("poke", Element::Physical, SkillBehavior::active(poke))
                    .with_cooldown_ms(10_000.0),
            )
            .and_then(|r| {
                r.with(
                    SkillDefinition::new("gauge", Element::Physical, SkillBehavior::active(gauge))
                        .with_cooldown_ms(4000.0),
                )
            })
            .and_then(|r| r.with(SkillDefinition::new("smite", Element::Light, SkillBehavior::utility(smite))))
            .and_then(|r| r.with(SkillDefinition::new("focus", Element::Physical, SkillBehavior::passive(focus))))
            .and_then(|r| r.with(SkillDefinition::new("bank", Element::Undead, SkillBehavior::on_expire(bank))))
            .expect("register")
    }

    fn spells() -> SpellRegistry {
        SpellRegistry::new()
            .with(SpellDefinition::new("bolt", Element::Dark, 80.0, bolt).with_cost(20))
            .expect("register")
    }

    fn knight(skills: &[&str]) -> UnitDefinition {
        let mut def = UnitDefinition::new("Knight", Element::Physical);
        def.skills = skills.iter().map(|s| SkillSlot::new(*s)).collect();
        def
    }

    fn build(party: Vec<UnitDefinition>, config: CombatConfig) -> CombatLoop {
        let mut pack = fixtures::pack();
        pack.party = party;
        pack.summons = vec![SummonTemplate {
            id: SummonTemplateId::new("skeleton"),
            name: "Skeleton".into(),
            element: Element::Undead,
            base_duration: 30.0,
            base_stats: UnitStats::default(),
            has_auto_attack: false,
            skills: Vec::new(),
            order: 0,
            chance: 1.0,
            on_expire: Some(SkillId::new("bank")),
        }];
        let mut combat = CombatLoop::from_pack(pack, skills(), spells(), config).expect("valid content");
        combat.start();
        combat
    }

    fn only_member(combat: &CombatLoop) -> UnitId {
        combat.roster().ids()[0]
    }

    #[test]
    fn test_auto_attack_deals_damage_and_pays() {
        let mut combat = build(vec![knight(&[])], CombatConfig::default());
        combat.drain_events();

        // A fresh wave is hit on the first tick.
        combat.advance(0.0625);
        assert_eq!(combat.log().len(), 1);
        assert!(combat.balance(Currency::Gold) > 0.0);

        let record = combat.log().latest().cloned().expect("record");
        assert_eq!(
            combat.arena().status.counter(record.target, Element::Physical),
            1
        );
        assert!(combat
            .drain_events()
            .iter()
            .any(|e| matches!(e, CombatEvent::EnemyDamaged { kind: HitKind::Attack, .. })));

        // Speed 1 gives a 2.5 second interval after that.
        combat.advance(2.0);
        assert_eq!(combat.log().len(), 1);
        combat.advance(0.5);
        assert_eq!(combat.log().len(), 2);
    }

    #[test]
    fn test_passive_changes_basic_attack() {
        let mut plain = build(vec![knight(&[])], CombatConfig::default());
        let mut focused = build(vec![knight(&["focus"])], CombatConfig::default());
        plain.advance(0.0625);
        focused.advance(0.0625);
        let damage = |c: &CombatLoop| c.log().latest().map(|r| r.damage);
        assert_eq!(damage(&focused), damage(&plain).map(|d| d + 1.0));
    }

    #[test]
    fn test_ready_skill_fires_and_suspends_attack() {
        let mut combat = build(vec![knight(&["poke"])], CombatConfig::default());
        combat.drain_events();

        combat.advance(2.5);
        let events = combat.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, CombatEvent::SkillReady { skill, .. } if skill.as_str() == "poke")));
        assert!(events
            .iter()
            .any(|e| matches!(e, CombatEvent::EnemyDamaged { kind: HitKind::Raw, damage, .. } if (*damage - 7.0).abs() < f64::EPSILON)));
        assert!(combat.log().is_empty());

        // The suspended attack lands on the next tick; the skill stays armed.
        for _ in 0..3 {
            combat.advance(0.0);
        }
        assert!(!combat
            .drain_events()
            .iter()
            .any(|e| matches!(e, CombatEvent::SkillReady { .. })));
        assert_eq!(combat.log().len(), 1);

        combat.advance(2.5);
        assert_eq!(combat.log().len(), 2);
    }

    #[test]
    fn test_hook_runs_before_rearm() {
        let mut combat = build(vec![knight(&["gauge"])], CombatConfig::default());
        combat.drain_events();

        combat.advance(0.0625);
        assert!(combat.drain_events().iter().any(|e| matches!(
            e,
            CombatEvent::EnemyDamaged { kind: HitKind::Raw, damage, .. } if (*damage - 1.0).abs() < f64::EPSILON
        )));
        assert!((skill_remaining(&combat, "gauge") - 4000.0).abs() < f64::EPSILON);
    }

    fn skill_remaining(combat: &CombatLoop, skill: &str) -> f64 {
        combat
            .roster()
            .get(only_member(combat))
            .and_then(|u| u.skills.get(&SkillId::new(skill)))
            .map_or(f64::NAN, |s| s.cooldown_remaining)
    }

    #[test]
    fn test_cast_skill_rejections() {
        let mut combat = build(vec![knight(&["poke", "focus"])], CombatConfig::default());
        let id = only_member(&combat);

        assert_eq!(
            combat.cast_skill(UnitId::new(77), &SkillId::new("poke")),
            Err(CommandError::UnknownUnit(UnitId::new(77)))
        );
        assert!(matches!(
            combat.cast_skill(id, &SkillId::new("smite")),
            Err(CommandError::SkillNotOwned { .. })
        ));
        assert_eq!(
            combat.cast_skill(id, &SkillId::new("focus")),
            Err(CommandError::NotCastable(SkillId::new("focus")))
        );

        assert!(combat.cast_skill(id, &SkillId::new("poke")).is_ok());
        assert!(matches!(
            combat.cast_skill(id, &SkillId::new("poke")),
            Err(CommandError::SkillOnCooldown { .. })
        ));
    }

    #[test]
    fn test_cast_skill_between_waves_is_rejected() {
        let mut combat = build(vec![knight(&["poke", "smite"])], CombatConfig::default());
        let id = only_member(&combat);

        combat.advance(40.0);
        assert!(!combat.waves().is_active());
        let log_before = combat.log().len();

        assert_eq!(
            combat.cast_skill(id, &SkillId::new("poke")),
            Err(CommandError::NoActiveEnemies)
        );
        assert_eq!(
            combat.cast_skill(id, &SkillId::new("smite")),
            Err(CommandError::NoActiveEnemies)
        );
        assert!(skill_remaining(&combat, "poke").abs() < f64::EPSILON);
        assert_eq!(combat.log().len(), log_before);
    }

    #[test]
    fn test_cast_skill_rejects_inactive_slot() {
        let mut def = knight(&[]);
        def.skills = vec![SkillSlot {
            active: false,
            ..SkillSlot::new("poke")
        }];
        let mut combat = build(vec![def], CombatConfig::default());
        let id = only_member(&combat);

        assert_eq!(
            combat.cast_skill(id, &SkillId::new("poke")),
            Err(CommandError::SkillInactive(SkillId::new("poke")))
        );
        assert!(skill_remaining(&combat, "poke").abs() < f64::EPSILON);
    }

    #[test]
    fn test_defeat_summons_and_removal_expires() {
        let mut necro = knight(&["smite"]);
        necro.can_summon = true;
        let mut combat = build(vec![necro], CombatConfig::default());
        let id = only_member(&combat);

        combat.cast_skill(id, &SkillId::new("smite")).expect("cast");
        assert_eq!(combat.summons().len(), 1);
        assert_eq!(combat.roster().summons().count(), 1);
        assert!(combat.balance(Currency::Gold) > 0.0);

        combat.drain_events();
        let removed = combat.remove_member(id).expect("member");
        assert_eq!(removed.id, id);
        assert!(combat.roster().is_empty());
        assert!(combat.summons().is_empty());
        assert!((combat.waves().timer().time_shield() - 2.0).abs() < f64::EPSILON);
        assert!(combat
            .drain_events()
            .iter()
            .any(|e| matches!(e, CombatEvent::SummonExpired { forced: true, .. })));
    }

    #[test]
    fn test_second_defeat_stacks_summon() {
        let mut necro = knight(&["smite"]);
        necro.can_summon = true;
        let mut combat = build(vec![necro], CombatConfig::default());
        let id = only_member(&combat);

        combat.cast_skill(id, &SkillId::new("smite")).expect("cast");
        combat.cast_skill(id, &SkillId::new("smite")).expect("cast");
        let instance = &combat.summons().instances()[0];
        assert_eq!(instance.stacks, 2);
        assert!((instance.stats.attack_power - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_draw_hand_needs_gems() {
        let mut combat = build(vec![knight(&[])], CombatConfig::default());
        assert_eq!(
            combat.draw_hand(),
            Err(CommandError::InsufficientFunds {
                currency: "gems",
                needed: 5,
                have: 0
            })
        );
        assert!(combat.hand().is_empty());

        let mut config = CombatConfig::default();
        config.income.starting_gems = 30.0;
        let mut combat = build(vec![knight(&[])], config);
        assert_eq!(combat.draw_hand(), Ok(vec![SpellId::new("bolt"); 4]));
        assert!((combat.balance(Currency::Gems) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_draw_hand_with_nothing_unlocked_keeps_gems() {
        let mut config = CombatConfig::default();
        config.income.starting_gems = 30.0;
        config.hand.library_level = 0;
        let mut combat = build(vec![knight(&[])], config);
        assert_eq!(combat.draw_hand(), Err(CommandError::NoSpellsUnlocked));
        assert!((combat.balance(Currency::Gems) - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cast_from_hand() {
        let mut config = CombatConfig::default();
        config.income.starting_gems = 30.0;
        let mut combat = build(vec![knight(&[])], config);
        combat.draw_hand().expect("draw");
        combat.drain_events();

        assert_eq!(combat.cast_from_hand(0), Ok(SpellId::new("bolt")));
        assert_eq!(combat.hand().len(), 3);
        assert!((combat.balance(Currency::Gems) - 5.0).abs() < f64::EPSILON);
        let events = combat.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, CombatEvent::EnemyDamaged { kind: HitKind::Spell, .. })));
        assert!(events.contains(&CombatEvent::SpellCast {
            spell: SpellId::new("bolt")
        }));
        assert_eq!(combat.cast_from_hand(9), Err(CommandError::EmptyHandSlot(9)));
        assert!(matches!(
            combat.cast_from_hand(0),
            Err(CommandError::InsufficientFunds { needed: 20, have: 5, .. })
        ));
        assert_eq!(combat.hand().len(), 3);
    }

    #[test]
    fn test_cast_from_hand_checks_gems_after_draw() {
        let mut config = CombatConfig::default();
        config.income.starting_gems = 10.0;
        let mut combat = build(vec![knight(&[])], config);
        combat.draw_hand().expect("draw");
        assert!(matches!(
            combat.cast_from_hand(0),
            Err(CommandError::InsufficientFunds { needed: 20, have: 5, .. })
        ));
        assert_eq!(combat.hand().len(), 4);
    }

    #[test]
    fn test_timeout_through_loop_restarts_area() {
        let mut combat = build(vec![knight(&[])], CombatConfig::default());
        combat.pause();
        combat.advance(100.0);
        assert!(combat.waves().is_active());
        combat.resume();

        combat.advance(40.0);
        assert_eq!(combat.waves().area_wave(), 1);
        assert!(!combat.arena().is_auto_attacking());
        assert!(combat.arena().status.is_empty());
        combat.advance(1.5);
        assert!(combat.waves().is_active());
        assert!(combat.arena().is_auto_attacking());
    }

    #[test]
    fn test_set_target_and_select_area() {
        let mut combat = build(vec![knight(&[])], CombatConfig::default());
        assert_eq!(combat.set_target(0, 1), Ok(GridPos { row: 0, col: 1 }));
        assert_eq!(
            combat.set_target(1, 9),
            Err(CommandError::OutOfRange { row: 1, col: 9 })
        );
        assert!(combat.select_area(&AreaId::new("crypt")).is_ok());
        assert_eq!(combat.waves().current_area(), &AreaId::new("crypt"));
        assert!(combat.select_area(&AreaId::new("void")).is_err());
    }

    #[test]
    fn test_add_member_validates_and_recomputes() {
        let mut combat = build(vec![knight(&[])], CombatConfig::default());
        assert!(combat.add_member(&knight(&["missing"])).is_err());
        let id = combat.add_member(&knight(&[])).expect("valid");
        assert_eq!(combat.roster().len(), 2);
        assert!(
            (combat.arena().modifiers.element_percent(Element::Physical) - 125.0).abs() < 1e-9
        );
        assert!(combat.remove_member(id).is_ok());
        assert!(
            (combat.arena().modifiers.element_percent(Element::Physical) - 100.0).abs() < 1e-9
        );
    }

    #[test]
    fn test_bad_dt_is_ignored() {
        let mut combat = build(vec![knight(&[])], CombatConfig::default());
        let before = combat.waves().timer().time_remaining();
        combat.advance(f64::NAN);
        combat.advance(-5.0);
        combat.advance(f64::INFINITY);
        assert!((combat.waves().timer().time_remaining() - before).abs() < f64::EPSILON);
    }
}
