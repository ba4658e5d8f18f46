use serde::{Deserialize, Serialize};

use crate::prop_derive::{PropType, derive_value};
use crate::state::GameStatRow;

pub const GRID_SLOTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntrySource {
    /// Filled from the automatic game log; replaced when the prop type changes.
    #[default]
    Derived,
    /// Typed by the user; never overwritten.
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManualGameEntry {
    pub value: String,
    pub opponent: String,
    pub result: String,
    pub minutes: String,
    pub source: EntrySource,
}

impl ManualGameEntry {
    pub fn is_filled(&self) -> bool {
        !self.value.trim().is_empty()
    }

    fn is_user_owned(&self) -> bool {
        self.source == EntrySource::User && self.is_filled()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Value,
    Opponent,
    Result,
    Minutes,
}

/// The five most-recent-game override slots, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualGrid {
    slots: [ManualGameEntry; GRID_SLOTS],
}

impl Default for ManualGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualGrid {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
        }
    }

    pub fn slots(&self) -> &[ManualGameEntry] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&ManualGameEntry> {
        self.slots.get(index)
    }

    /// Direct user edit of one field. Returns `false` for an out-of-range slot.
    pub fn set_field(&mut self, index: usize, field: EntryField, text: &str) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        let target = match field {
            EntryField::Value => &mut slot.value,
            EntryField::Opponent => &mut slot.opponent,
            EntryField::Result => &mut slot.result,
            EntryField::Minutes => &mut slot.minutes,
        };
        *target = text.to_string();
        slot.source = EntrySource::User;
        true
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }

    /// Re-derive every non-user slot from the loaded game log for `prop`.
    pub fn autofill(&mut self, rows: &[GameStatRow], prop: PropType) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_user_owned() {
                continue;
            }
            *slot = match rows.get(index) {
                Some(row) => ManualGameEntry {
                    value: derive_value(row, prop).render(prop),
                    opponent: row.opponent_abbrev.clone(),
                    result: row.result.clone(),
                    minutes: row.minutes.to_string(),
                    source: EntrySource::Derived,
                },
                None => ManualGameEntry::default(),
            };
        }
    }

    pub fn filled(&self) -> impl Iterator<Item = &ManualGameEntry> {
        self.slots.iter().filter(|slot| slot.is_filled())
    }

    pub fn has_filled(&self) -> bool {
        self.filled().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Split;

    fn rows() -> Vec<GameStatRow> {
        (0..7)
            .map(|i| GameStatRow {
                opponent_abbrev: format!("T{i}"),
                result: "W".to_string(),
                minutes: 30 + i,
                points: 20 + i,
                rebounds: 5,
                three_pointers: Split::new(i, 8),
                ..GameStatRow::default()
            })
            .collect()
    }

    #[test]
    fn autofill_fills_five_newest() {
        let mut grid = ManualGrid::new();
        grid.autofill(&rows(), PropType::Points);
        let values: Vec<&str> = grid.slots().iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["20", "21", "22", "23", "24"]);
        assert_eq!(grid.get(0).map(|s| s.minutes.as_str()), Some("30"));
    }

    #[test]
    fn user_edits_survive_prop_switch() {
        let mut grid = ManualGrid::new();
        grid.autofill(&rows(), PropType::Points);
        assert!(grid.set_field(1, EntryField::Value, "40"));
        grid.autofill(&rows(), PropType::ThreesMade);
        assert_eq!(grid.get(0).map(|s| s.value.as_str()), Some("0"));
        assert_eq!(grid.get(1).map(|s| s.value.as_str()), Some("40"));
        assert_eq!(grid.get(2).map(|s| s.value.as_str()), Some("2"));
    }

    #[test]
    fn cleared_user_slot_is_refilled() {
        let mut grid = ManualGrid::new();
        grid.set_field(0, EntryField::Value, "");
        grid.autofill(&rows(), PropType::Rebounds);
        assert_eq!(grid.get(0).map(|s| s.value.as_str()), Some("5"));
    }

    #[test]
    fn short_log_leaves_trailing_slots_empty() {
        let mut grid = ManualGrid::new();
        grid.autofill(&rows()[..2], PropType::Points);
        assert_eq!(grid.filled().count(), 2);
        grid.clear();
        assert!(!grid.has_filled());
        assert!(!grid.set_field(GRID_SLOTS, EntryField::Value, "1"));
    }
}
