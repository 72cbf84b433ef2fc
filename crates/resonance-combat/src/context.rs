//! Battle state shared by the loop and the hooks it invokes.
//!
//! [`Arena`] bundles everything except the roster. Hooks get a
//! [`CastContext`], which borrows both and exposes the operations a skill,
//! spell, or expiry effect is allowed to perform. Every damage path funnels
//! through [`Arena::apply_damage`] so notifications, bounties, and status
//! cleanup happen in one place.

use crate::damage::{DamageOutcome, DamageResolver, Strike, StrikeKind};
use crate::economy::{Currency, IncomeConfig, Wallet};
use crate::element::Element;
use crate::enemy::Enemy;
use crate::events::{AttackRecord, CombatEvent, CombatLog, EventBus, HitKind};
use crate::grid::GridPos;
use crate::party::{PartyModifiers, Roster};
use crate::status::StatusEffectTracker;
use crate::unit::Unit;
use crate::wave::{DamageApplied, DefeatedEnemy, WaveDirector, WaveTransition};
use resonance_common::{CommandResult, EnemyUid, UnitId};
use tracing::debug;

/// Everything a fight owns besides the roster.
#[derive(Debug)]
pub struct Arena {
    /// Grid, timer, and progression.
    pub waves: WaveDirector,
    /// Counters and DOT stacks.
    pub status: StatusEffectTracker,
    /// Damage pipeline.
    pub resolver: DamageResolver,
    /// Party-wide damage inputs.
    pub modifiers: PartyModifiers,
    /// Currency.
    pub wallet: Wallet,
    /// Income rates.
    pub income: IncomeConfig,
    /// Notification bus.
    pub events: EventBus,
    /// Recent attacks.
    pub log: CombatLog,
    /// Combat RNG.
    pub rng: fastrand::Rng,
    auto_attacking: bool,
    last_target: Option<GridPos>,
    defeats: Vec<DefeatedEnemy>,
}

impl Arena {
    /// Assembles an arena.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        waves: WaveDirector,
        status: StatusEffectTracker,
        resolver: DamageResolver,
        modifiers: PartyModifiers,
        income: IncomeConfig,
        events: EventBus,
        log: CombatLog,
        rng: fastrand::Rng,
    ) -> Self {
        Self {
            waves,
            status,
            resolver,
            modifiers,
            wallet: Wallet::new(&income),
            income,
            events,
            log,
            rng,
            auto_attacking: false,
            last_target: None,
            defeats: Vec::new(),
        }
    }

    /// Whether units are swinging.
    #[must_use]
    pub fn is_auto_attacking(&self) -> bool {
        self.auto_attacking
    }

    /// Publishes a notification.
    pub fn publish(&self, event: CombatEvent) {
        self.events.publish(event);
    }

    /// Credits currency and announces the new balance.
    pub fn earn(&mut self, currency: Currency, amount: f64) -> f64 {
        let credited = self.wallet.earn(currency, amount);
        if credited > 0.0 {
            self.publish(CombatEvent::CurrencyChanged {
                currency,
                balance: self.wallet.balance(currency),
            });
        }
        credited
    }

    /// Spends currency and announces the new balance.
    pub fn spend(&mut self, currency: Currency, amount: u64) -> CommandResult<()> {
        self.wallet.spend(currency, amount)?;
        if amount > 0 {
            self.publish(CombatEvent::CurrencyChanged {
                currency,
                balance: self.wallet.balance(currency),
            });
        }
        Ok(())
    }

    /// Begins auto-attacks. Repeated calls do nothing.
    pub fn start_auto_attack(&mut self) {
        if !self.auto_attacking {
            self.auto_attacking = true;
            self.publish(CombatEvent::AutoAttackStarted);
        }
    }

    /// Ends auto-attacks. Repeated calls do nothing.
    pub fn stop_auto_attack(&mut self) {
        if self.auto_attacking {
            self.auto_attacking = false;
            self.publish(CombatEvent::AutoAttackStopped);
        }
    }

    /// Announces a focus change if the director's target moved.
    pub fn sync_target(&mut self) {
        let current = self.waves.target();
        if current != self.last_target {
            self.publish(CombatEvent::TargetChanged {
                from: self.last_target,
                to: current,
            });
            self.last_target = current;
        }
    }

    /// Subtracts damage and settles any defeat it causes.
    pub fn apply_damage(
        &mut self,
        enemy: EnemyUid,
        damage: f64,
        source: Option<UnitId>,
        kind: HitKind,
        is_critical: bool,
    ) -> Option<DamageApplied> {
        let applied = self.waves.damage_enemy(enemy, damage)?;
        self.publish(CombatEvent::EnemyDamaged {
            enemy,
            pos: applied.pos,
            damage: applied.damage,
            remaining: applied.remaining,
            source,
            kind,
            is_critical,
        });
        self.settle_defeats();
        Some(applied)
    }

    /// Pays bounties and drops status for every enemy defeated since the last
    /// call. Defeats are kept for the summon pass.
    pub fn settle_defeats(&mut self) {
        let defeated = self.waves.take_defeated();
        if defeated.is_empty() {
            return;
        }
        for fallen in defeated {
            self.status.forget(fallen.enemy.uid);
            let bounty = self.income.bounty(fallen.enemy.max_health);
            self.earn(Currency::Gold, bounty);
            self.publish(CombatEvent::EnemyDefeated {
                enemy: fallen.enemy.uid,
                template: fallen.enemy.template.clone(),
                pos: fallen.pos,
                bounty,
            });
            self.defeats.push(fallen);
        }
        self.sync_target();
    }

    /// Defeats settled since the last call.
    pub fn take_defeats(&mut self) -> Vec<DefeatedEnemy> {
        std::mem::take(&mut self.defeats)
    }

    /// Ticks every DOT stack and reports the damage.
    pub fn tick_status(&mut self, dt: f64) {
        let ticks = self.status.advance(dt, &mut self.waves);
        for tick in ticks {
            let Some(pos) = self.waves.last_position(tick.enemy) else {
                continue;
            };
            let remaining = self.waves.enemy(tick.enemy).map_or(0.0, |e| e.health);
            self.publish(CombatEvent::EnemyDamaged {
                enemy: tick.enemy,
                pos,
                damage: tick.damage,
                remaining,
                source: tick.source,
                kind: HitKind::Dot,
                is_critical: false,
            });
        }
        self.settle_defeats();
    }

    /// Applies wave transitions: status resets, payouts, auto-attack state,
    /// and notifications.
    pub fn apply_transitions(&mut self, transitions: Vec<WaveTransition>) {
        for transition in transitions {
            match transition {
                WaveTransition::Started {
                    area,
                    wave,
                    area_wave,
                    enemies,
                    max_time,
                } => {
                    self.status.clear_all();
                    self.publish(CombatEvent::WaveStarted {
                        area,
                        wave,
                        area_wave,
                        enemies,
                        max_time,
                    });
                    self.start_auto_attack();
                },
                WaveTransition::Cleared {
                    wave,
                    area_wave,
                    bonus,
                } => {
                    self.stop_auto_attack();
                    self.earn(Currency::Gold, bonus as f64);
                    self.publish(CombatEvent::WaveCleared {
                        wave,
                        area_wave,
                        bonus,
                    });
                },
                WaveTransition::TimedOut { wave, area_wave } => {
                    self.stop_auto_attack();
                    self.status.clear_all();
                    self.publish(CombatEvent::WaveTimedOut { wave, area_wave });
                },
                WaveTransition::AreaCompleted { area, next } => {
                    self.publish(CombatEvent::AreaCompleted { area, next });
                },
            }
        }
        self.sync_target();
    }

    /// Resolves a unit's hit on an enemy without applying it.
    pub fn resolve_strike(
        &mut self,
        attacker: &Unit,
        target: EnemyUid,
        element: Element,
        kind: StrikeKind<'_>,
    ) -> Option<DamageOutcome> {
        let enemy = self.waves.enemy(target)?;
        let strike = Strike {
            attacker,
            target: enemy,
            element,
            kind,
            counters_on_target: self.status.counter(target, element),
        };
        let wave = self.waves.current_wave();
        Some(
            self.resolver
                .resolve_attack(&strike, &self.modifiers, wave, &mut self.rng),
        )
    }

    /// Applies a resolved unit hit: damage, counter, and combat log.
    pub fn land_unit_hit(
        &mut self,
        attacker: &Unit,
        target: EnemyUid,
        outcome: &DamageOutcome,
        kind: HitKind,
    ) -> Option<DamageApplied> {
        let applied = self.apply_damage(
            target,
            outcome.damage,
            Some(attacker.id),
            kind,
            outcome.is_critical,
        )?;
        if !applied.defeated {
            self.status.increment(target, outcome.element, 1);
        }
        self.log.push(AttackRecord {
            attacker: attacker.id,
            attacker_name: attacker.name.clone(),
            target,
            damage: applied.damage,
            element: outcome.element,
            tier: outcome.matchup_tier,
            is_critical: outcome.is_critical,
            wave: self.waves.current_wave(),
        });
        Some(applied)
    }
}

// ============================================================================
// Cast context
// ============================================================================

/// What a skill, spell, or expiry hook may touch.
pub struct CastContext<'a> {
    roster: &'a mut Roster,
    arena: &'a mut Arena,
    caster: Option<UnitId>,
    element: Element,
    target: Option<EnemyUid>,
}

impl<'a> CastContext<'a> {
    /// Builds a context. `caster` is `None` for hero spells.
    pub fn new(
        roster: &'a mut Roster,
        arena: &'a mut Arena,
        caster: Option<UnitId>,
        element: Element,
    ) -> Self {
        let target = arena
            .waves
            .resolve_target()
            .and_then(|pos| arena.waves.grid().get(pos))
            .map(|e| e.uid);
        Self {
            roster,
            arena,
            caster,
            element,
            target,
        }
    }

    // === Queries ===

    /// Casting unit, if it is still on the roster.
    #[must_use]
    pub fn caster(&self) -> Option<&Unit> {
        self.caster.and_then(|id| self.roster.get(id))
    }

    /// Casting unit's id.
    #[must_use]
    pub fn caster_id(&self) -> Option<UnitId> {
        self.caster
    }

    /// Element of the cast.
    #[must_use]
    pub fn element(&self) -> Element {
        self.element
    }

    /// Focused enemy when the cast began.
    #[must_use]
    pub fn target(&self) -> Option<EnemyUid> {
        self.target.filter(|&uid| self.arena.waves.enemy(uid).is_some())
    }

    /// Enemy by uid.
    #[must_use]
    pub fn enemy(&self, uid: EnemyUid) -> Option<&Enemy> {
        self.arena.waves.enemy(uid)
    }

    /// Every enemy on the field, row-major.
    #[must_use]
    pub fn enemies(&self) -> Vec<EnemyUid> {
        self.arena.waves.enemy_uids()
    }

    /// Cell of an enemy.
    #[must_use]
    pub fn position(&self, uid: EnemyUid) -> Option<GridPos> {
        self.arena.waves.grid().find(uid)
    }

    /// Enemies in a row.
    #[must_use]
    pub fn enemies_in_row(&self, row: usize) -> Vec<EnemyUid> {
        self.arena.waves.grid().in_row(row)
    }

    /// Enemies in a column.
    #[must_use]
    pub fn enemies_in_column(&self, col: usize) -> Vec<EnemyUid> {
        self.arena.waves.grid().in_column(col)
    }

    /// Enemies orthogonally next to another enemy.
    #[must_use]
    pub fn adjacent_to(&self, uid: EnemyUid) -> Vec<EnemyUid> {
        self.position(uid)
            .map(|pos| self.arena.waves.grid().adjacent(pos))
            .unwrap_or_default()
    }

    /// Global wave.
    #[must_use]
    pub fn wave(&self) -> u32 {
        self.arena.waves.current_wave()
    }

    /// Roster, read-only.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        self.roster
    }

    /// Combat RNG.
    pub fn rng(&mut self) -> &mut fastrand::Rng {
        &mut self.arena.rng
    }

    // === Damage ===

    /// Hits an enemy through the damage pipeline with `magnitude` added to the
    /// element percentage.
    ///
    /// With a caster this is a skill hit (crit, penetration, counter). Without
    /// one it is a hero spell hit based on the party attack bonus.
    pub fn strike(&mut self, target: EnemyUid, magnitude: f64) -> Option<DamageOutcome> {
        let element = self.element;
        if let Some(attacker) = self.caster.and_then(|id| self.roster.get(id)) {
            let outcome =
                self.arena
                    .resolve_strike(attacker, target, element, StrikeKind::Skill { magnitude })?;
            self.arena
                .land_unit_hit(attacker, target, &outcome, HitKind::Skill)?;
            return Some(outcome);
        }

        let enemy = self.arena.waves.enemy(target)?;
        let outcome = self.arena.resolver.resolve_spell(
            element,
            magnitude,
            enemy,
            &self.arena.modifiers,
            self.arena.waves.current_wave(),
        );
        self.arena
            .apply_damage(target, outcome.damage, None, HitKind::Spell, false)?;
        Some(outcome)
    }

    /// Deals already-resolved damage, floored. Zero does nothing.
    pub fn deal_damage(&mut self, target: EnemyUid, amount: f64) -> Option<DamageApplied> {
        let amount = if amount.is_finite() { amount.floor() } else { 0.0 };
        if amount <= 0.0 {
            return None;
        }
        self.arena
            .apply_damage(target, amount, self.caster, HitKind::Raw, false)
    }

    /// Adds a DOT stack of this cast's element to an enemy on the field.
    pub fn apply_dot(&mut self, target: EnemyUid, per_tick_damage: f64, duration: f64) {
        if self.arena.waves.enemy(target).is_some() {
            self.arena
                .status
                .apply_dot(target, self.element, per_tick_damage, duration, self.caster);
        }
    }

    // === Counters ===

    /// Counter of an element on an enemy.
    #[must_use]
    pub fn counter(&self, enemy: EnemyUid, element: Element) -> u32 {
        self.arena.status.counter(enemy, element)
    }

    /// Every non-zero counter on an enemy.
    #[must_use]
    pub fn counters_of(&self, enemy: EnemyUid) -> Vec<(Element, u32)> {
        self.arena.status.counters_of(enemy)
    }

    /// Adds to a counter.
    pub fn add_counters(&mut self, enemy: EnemyUid, element: Element, amount: u32) -> u32 {
        if self.arena.waves.enemy(enemy).is_none() {
            return 0;
        }
        self.arena.status.increment(enemy, element, amount)
    }

    /// Removes up to `amount` from a counter. Returns how many were removed.
    pub fn consume_counters(&mut self, enemy: EnemyUid, element: Element, amount: u32) -> u32 {
        self.arena.status.consume(enemy, element, amount)
    }

    /// Removes every counter from an enemy.
    pub fn drain_counters(&mut self, enemy: EnemyUid) -> Vec<(Element, u32)> {
        self.arena.status.drain(enemy)
    }

    /// Moves up to `amount` counters of an element between enemies.
    pub fn transfer_counters(
        &mut self,
        from: EnemyUid,
        to: EnemyUid,
        element: Element,
        amount: u32,
    ) -> u32 {
        if self.arena.waves.enemy(to).is_none() {
            return 0;
        }
        self.arena.status.transfer(from, to, element, amount)
    }

    // === Support ===

    /// Heals every unit. Returns the total restored.
    pub fn heal_party(&mut self, amount: f64) -> f64 {
        let restored = self.roster.heal_all(amount);
        debug!(restored, "Party healed");
        self.arena.publish(CombatEvent::HealTriggered {
            health_restored: restored,
            time_added: 0.0,
        });
        restored
    }

    /// Extends the running wave, capped at its length. Returns the seconds added.
    pub fn add_wave_time(&mut self, seconds: f64) -> f64 {
        let added = self.arena.waves.add_wave_time(seconds);
        self.arena.publish(CombatEvent::HealTriggered {
            health_restored: 0.0,
            time_added: added,
        });
        added
    }

    /// Banks shield time, capped. Returns the seconds added.
    pub fn add_time_shield(&mut self, seconds: f64) -> f64 {
        self.arena.waves.add_time_shield(seconds)
    }

    /// Tags an enemy with a presentation effect.
    pub fn set_visual(&mut self, enemy: EnemyUid, tag: &str, seconds: f64) {
        if let Some(enemy) = self.arena.waves.enemy_mut(enemy) {
            enemy.set_visual(tag, seconds);
        }
    }
}
