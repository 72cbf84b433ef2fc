//! ID types for units, enemies, and content records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a unit on the party roster (party member or summon).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a unit ID from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// First ID handed out to summons; party members use the range below it.
    pub const SUMMON_BASE: Self = Self(1_000_000);

    /// Checks whether this ID falls into the summon range.
    #[must_use]
    pub const fn is_summon_range(self) -> bool {
        self.0 >= Self::SUMMON_BASE.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Per-spawn unique identifier of an enemy.
///
/// Two enemies spawned from the same template never share an `EnemyUid`,
/// so streak tracking and status bookkeeping can key on it safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnemyUid(u64);

impl EnemyUid {
    /// Creates an enemy UID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EnemyUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enemy#{}", self.0)
    }
}

macro_rules! content_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an ID from a string key.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the string key.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

content_id!(
    /// Key of a skill definition in the skill registry.
    SkillId
);

content_id!(
    /// Key of a hero spell in the spell registry.
    SpellId
);

content_id!(
    /// Key of an area definition.
    AreaId
);

content_id!(
    /// Key of an enemy template.
    EnemyTemplateId
);

content_id!(
    /// Key of a summon template.
    SummonTemplateId
);
