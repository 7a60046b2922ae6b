//! Last known value of every polled entity.
//!
//! The cache is written only by the [`PollScheduler`](crate::poll::PollScheduler)
//! (`put`, `mark_stale` and `set_fetched` are crate-private) and read by the
//! compositor. Reads never block and never fail: an entity that was never polled
//! reads as [`Freshness::Absent`], one whose latest poll failed as
//! [`Freshness::Stale`] with its previous value intact.

use embassy_time::Instant;
use heapless::{String, Vec};

use crate::config::MAX_SENSORS;
use crate::entity::EntityRef;

/// Longest text value kept for a reading.
pub const TEXT_CAPACITY: usize = 32;

/// Sensor value as reported by the hub.
#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    Number(f32),
    /// Non-numeric state (`on`, `off`, an ISO timestamp...), truncated.
    Text(String<TEXT_CAPACITY>),
    /// Hub reported `unavailable` / `unknown` / empty.
    Unavailable,
}

impl Value {
    /// Interpret a raw hub state string.
    pub fn parse(state: &str) -> Self {
        let state = state.trim();
        if state.is_empty() || state == "unavailable" || state == "unknown" {
            return Self::Unavailable;
        }
        if let Ok(number) = state.parse::<f32>()
            && number.is_finite()
        {
            return Self::Number(number);
        }

        let mut text = String::new();
        for c in state.chars() {
            if text.push(c).is_err() {
                break;
            }
        }
        Self::Text(text)
    }
}

/// How a reading relates to the poll history.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Freshness {
    /// No poll has touched this entity yet.
    Absent,
    /// Value from the most recent poll cycle, which succeeded.
    Fresh,
    /// The most recent poll cycle failed; the value (if any) is older.
    Stale,
}

/// Cached reading of one entity.
#[derive(Clone, PartialEq, Debug)]
pub struct Reading {
    /// Value from the latest successful poll.
    pub value: Option<Value>,
    /// Tick of the latest successful poll.
    pub updated_at: Option<Instant>,
    /// Set iff the latest poll cycle failed.
    pub stale: bool,
}

static ABSENT: Reading = Reading::ABSENT;

impl Reading {
    /// Reading of an entity never polled.
    pub const ABSENT: Self = Self {
        value: None,
        updated_at: None,
        stale: false,
    };

    pub const fn freshness(&self) -> Freshness {
        if self.stale {
            Freshness::Stale
        } else if self.value.is_none() {
            Freshness::Absent
        } else {
            Freshness::Fresh
        }
    }

    /// Numeric value, if the reading holds one.
    pub fn number(&self) -> Option<f32> {
        match self.value {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        }
    }

    /// Text value, if the reading holds one.
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            Some(Value::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }
}

/// Last known readings, one per entity.
pub struct StateCache<'a> {
    entries: Vec<(EntityRef<'a>, Reading), MAX_SENSORS>,
    revision: u32,
    fetched_at: Option<Instant>,
}

impl<'a> StateCache<'a> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            revision: 0,
            fetched_at: None,
        }
    }

    /// Reading for `entity`; [`Reading::ABSENT`] if it was never polled.
    pub fn get(
        &self,
        entity: EntityRef<'_>,
    ) -> &Reading {
        self.entries
            .iter()
            .find(|(e, _)| e.as_str() == entity.as_str())
            .map_or(&ABSENT, |(_, reading)| reading)
    }

    /// Counter bumped whenever a visible value or staleness flag changes.
    #[inline]
    pub const fn revision(&self) -> u32 { self.revision }

    /// Completion tick of the latest successful poll cycle.
    #[inline]
    pub const fn fetched_at(&self) -> Option<Instant> { self.fetched_at }

    #[inline]
    pub fn len(&self) -> usize { self.entries.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Overwrite the reading of `entity` with a fresh value.
    ///
    /// Returns `false` if the entity is new and the cache is full.
    pub(crate) fn put(
        &mut self,
        entity: EntityRef<'a>,
        value: Value,
        now: Instant,
    ) -> bool {
        let Some(reading) = self.slot(entity) else {
            return false;
        };
        let changed = reading.stale || reading.value.as_ref() != Some(&value);
        reading.value = Some(value);
        reading.updated_at = Some(now);
        reading.stale = false;
        if changed {
            self.revision = self.revision.wrapping_add(1);
        }
        true
    }

    /// Flag `entity` stale, keeping its value.
    pub(crate) fn mark_stale(
        &mut self,
        entity: EntityRef<'a>,
    ) -> bool {
        let Some(reading) = self.slot(entity) else {
            return false;
        };
        let changed = !reading.stale;
        reading.stale = true;
        if changed {
            self.revision = self.revision.wrapping_add(1);
        }
        true
    }

    /// Record the completion tick of a successful poll cycle.
    pub(crate) fn set_fetched(
        &mut self,
        now: Instant,
    ) {
        self.fetched_at = Some(now);
    }

    /// Entry for `entity`, inserted as absent if missing.
    fn slot(
        &mut self,
        entity: EntityRef<'a>,
    ) -> Option<&mut Reading> {
        let index = match self.entries.iter().position(|(e, _)| *e == entity) {
            Some(index) => index,
            None => {
                self.entries.push((entity, Reading::ABSENT)).ok()?;
                self.entries.len() - 1
            }
        };
        self.entries.get_mut(index).map(|(_, reading)| reading)
    }
}

impl Default for StateCache<'_> {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================
