//! Combat notifications and the recent-attack log.

use crate::economy::Currency;
use crate::element::{Element, MatchupTier};
use crate::grid::GridPos;
use crossbeam_channel::{bounded, Receiver, Sender};
use resonance_common::{
    AreaId, EnemyTemplateId, EnemyUid, SkillId, SpellId, SummonTemplateId, UnitId,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How a damage event was dealt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitKind {
    /// Basic attack.
    Attack,
    /// Skill resolved through the damage pipeline.
    Skill,
    /// Damage-over-time tick.
    Dot,
    /// Hero spell.
    Spell,
    /// Pre-resolved damage from a hook.
    Raw,
}

/// Notifications published by the combat loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A wave spawned.
    WaveStarted {
        /// Area
        area: AreaId,
        /// Global wave
        wave: u32,
        /// Wave within the area
        area_wave: u32,
        /// Enemies spawned
        enemies: usize,
        /// Timer length in seconds
        max_time: f64,
    },
    /// An enemy took damage.
    EnemyDamaged {
        /// Enemy
        enemy: EnemyUid,
        /// Cell
        pos: GridPos,
        /// Damage dealt
        damage: f64,
        /// Health left
        remaining: f64,
        /// Dealing unit, if any
        source: Option<UnitId>,
        /// Damage channel
        kind: HitKind,
        /// Whether the hit was critical
        is_critical: bool,
    },
    /// An enemy was defeated.
    EnemyDefeated {
        /// Enemy
        enemy: EnemyUid,
        /// Template
        template: EnemyTemplateId,
        /// Cell it held
        pos: GridPos,
        /// Gold bounty paid
        bounty: f64,
    },
    /// The grid was emptied before the timer ran out.
    WaveCleared {
        /// Global wave
        wave: u32,
        /// Wave within the area
        area_wave: u32,
        /// Gold bonus paid
        bonus: u64,
    },
    /// The timer ran out.
    WaveTimedOut {
        /// Global wave
        wave: u32,
        /// Wave within the area that failed
        area_wave: u32,
    },
    /// The final wave of an area was cleared.
    AreaCompleted {
        /// Completed area
        area: AreaId,
        /// Area played next
        next: AreaId,
    },
    /// A new summon joined.
    SummonCreated {
        /// Summon's roster id
        summon: UnitId,
        /// Template
        template: SummonTemplateId,
        /// Summoner
        summoner: UnitId,
    },
    /// An existing summon gained a stack.
    SummonStacked {
        /// Summon's roster id
        summon: UnitId,
        /// Template
        template: SummonTemplateId,
        /// New stack count
        stacks: u32,
    },
    /// A summon left.
    SummonExpired {
        /// Summon's roster id
        summon: UnitId,
        /// Template
        template: SummonTemplateId,
        /// Whether it was removed early (its summoner left)
        forced: bool,
    },
    /// A skill came off cooldown and fired.
    SkillReady {
        /// Owner
        unit: UnitId,
        /// Skill
        skill: SkillId,
    },
    /// A heal or time extension happened.
    HealTriggered {
        /// Party health restored
        health_restored: f64,
        /// Wave seconds added
        time_added: f64,
    },
    /// The focused target moved.
    TargetChanged {
        /// Previous target cell
        from: Option<GridPos>,
        /// New target cell
        to: Option<GridPos>,
    },
    /// Auto-attacks began.
    AutoAttackStarted,
    /// Auto-attacks stopped.
    AutoAttackStopped,
    /// A balance changed.
    CurrencyChanged {
        /// Currency
        currency: Currency,
        /// New balance
        balance: f64,
    },
    /// A new spell hand was drawn.
    HandDrawn {
        /// Spells in slot order
        hand: Vec<SpellId>,
    },
    /// A spell was cast from the hand.
    SpellCast {
        /// Spell
        spell: SpellId,
    },
}

/// Bounded, non-blocking notification channel.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<CombatEvent>,
    receiver: Receiver<CombatEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a bus holding up to `capacity` undrained events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event. When the bus is full the event is dropped.
    pub fn publish(&self, event: CombatEvent) {
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CombatEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Extra publishing handle.
    #[must_use]
    pub fn sender(&self) -> Sender<CombatEvent> {
        self.sender.clone()
    }

    /// Extra draining handle, for hosts that consume on another thread.
    #[must_use]
    pub fn receiver(&self) -> Receiver<CombatEvent> {
        self.receiver.clone()
    }
}

// ============================================================================
// Combat log
// ============================================================================

/// One basic attack or skill hit, as shown in the combat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackRecord {
    /// Attacker.
    pub attacker: UnitId,
    /// Attacker's name at the time.
    pub attacker_name: String,
    /// Target.
    pub target: EnemyUid,
    /// Damage dealt.
    pub damage: f64,
    /// Element of the hit.
    pub element: Element,
    /// Matchup tier.
    pub tier: MatchupTier,
    /// Whether the hit was critical.
    pub is_critical: bool,
    /// Global wave.
    pub wave: u32,
}

/// Most recent attacks, newest last.
#[derive(Debug, Clone)]
pub struct CombatLog {
    entries: VecDeque<AttackRecord>,
    capacity: usize,
}

impl Default for CombatLog {
    fn default() -> Self {
        Self::new(50)
    }
}

impl CombatLog {
    /// Creates a log keeping at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a record, evicting the oldest when full.
    pub fn push(&mut self, record: AttackRecord) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    /// Records oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &AttackRecord> {
        self.entries.iter()
    }

    /// Newest record.
    #[must_use]
    pub fn latest(&self) -> Option<&AttackRecord> {
        self.entries.back()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every record.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(damage: f64) -> AttackRecord {
        AttackRecord {
            attacker: UnitId::new(1),
            attacker_name: "a".into(),
            target: EnemyUid::new(1),
            damage,
            element: Element::Fire,
            tier: MatchupTier::Neutral,
            is_critical: false,
            wave: 1,
        }
    }

    #[test]
    fn test_bus_drops_when_full() {
        let bus = EventBus::new(2);
        for _ in 0..5 {
            bus.publish(CombatEvent::AutoAttackStarted);
        }
        assert_eq!(bus.pending_count(), 2);
        assert_eq!(bus.drain().len(), 2);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_sender_handle_shares_channel() {
        let bus = EventBus::default();
        let _ = bus.sender().try_send(CombatEvent::AutoAttackStopped);
        assert_eq!(bus.drain(), vec![CombatEvent::AutoAttackStopped]);
    }

    #[test]
    fn test_event_serializes() {
        let event = CombatEvent::WaveCleared {
            wave: 3,
            area_wave: 3,
            bonus: 168,
        };
        let text = ron::to_string(&event).expect("serialize");
        let back: CombatEvent = ron::from_str(&text).expect("deserialize");
        assert_eq!(back, event);
    }

    #[test]
    fn test_log_capped() {
        let mut log = CombatLog::new(3);
        for i in 0..5 {
            log.push(record(f64::from(i)));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.iter().next().map(|r| r.damage), Some(2.0));
        assert_eq!(log.latest().map(|r| r.damage), Some(4.0));
    }
}
