use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::state::GameStatRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropType {
    Points,
    Rebounds,
    Assists,
    ThreesMade,
    Turnovers,
    Steals,
    Blocks,
    StealsBlocks,
    PtsRebsAsts,
    PtsRebs,
    PtsAsts,
    RebsAsts,
    DoubleDouble,
    FieldGoalAttempts,
    FieldGoalsMade,
    ThreePointAttempts,
    FreeThrowsMade,
    FantasyScore,
}

impl PropType {
    pub const ALL: [PropType; 18] = [
        PropType::Points,
        PropType::Rebounds,
        PropType::Assists,
        PropType::ThreesMade,
        PropType::Turnovers,
        PropType::Steals,
        PropType::Blocks,
        PropType::StealsBlocks,
        PropType::PtsRebsAsts,
        PropType::PtsRebs,
        PropType::PtsAsts,
        PropType::RebsAsts,
        PropType::DoubleDouble,
        PropType::FieldGoalAttempts,
        PropType::FieldGoalsMade,
        PropType::ThreePointAttempts,
        PropType::FreeThrowsMade,
        PropType::FantasyScore,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PropType::Points => "Points",
            PropType::Rebounds => "Rebounds",
            PropType::Assists => "Assists",
            PropType::ThreesMade => "Threes Made",
            PropType::Turnovers => "Turnovers",
            PropType::Steals => "Steals",
            PropType::Blocks => "Blocks",
            PropType::StealsBlocks => "Steals + Blocks",
            PropType::PtsRebsAsts => "Pts + Rebs + Asts",
            PropType::PtsRebs => "Pts + Rebs",
            PropType::PtsAsts => "Pts + Asts",
            PropType::RebsAsts => "Rebs + Asts",
            PropType::DoubleDouble => "Double Double",
            PropType::FieldGoalAttempts => "FG Attempts",
            PropType::FieldGoalsMade => "FG Made",
            PropType::ThreePointAttempts => "3-Pt Attempts",
            PropType::FreeThrowsMade => "Free Throws Made",
            PropType::FantasyScore => "Fantasy Score",
        }
    }

    fn short_code(self) -> Option<&'static str> {
        match self {
            PropType::FieldGoalAttempts => Some("FGA"),
            PropType::FieldGoalsMade => Some("FGM"),
            PropType::ThreePointAttempts => Some("3PA"),
            PropType::FreeThrowsMade => Some("FTM"),
            PropType::PtsRebsAsts => Some("PRA"),
            PropType::StealsBlocks => Some("STOCKS"),
            _ => None,
        }
    }

    pub fn has_derivation(self) -> bool {
        !matches!(self, PropType::DoubleDouble)
    }
}

impl fmt::Display for PropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for PropType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = compact(s);
        if key.is_empty() {
            return Err("empty prop type".to_string());
        }
        PropType::ALL
            .into_iter()
            .find(|prop| {
                compact(prop.label()) == key
                    || prop.short_code().is_some_and(|code| compact(code) == key)
            })
            .ok_or_else(|| format!("unknown prop type: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropValue {
    Value(f64),
    NotApplicable,
}

impl PropValue {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            PropValue::Value(v) => Some(v),
            PropValue::NotApplicable => None,
        }
    }

    /// Grid text for this value: one decimal for fantasy score, whole
    /// numbers otherwise, `"0"` when there is no derivation.
    pub fn render(self, prop: PropType) -> String {
        let Some(v) = self.as_f64() else {
            return "0".to_string();
        };
        if prop == PropType::FantasyScore {
            format!("{v:.1}")
        } else if v.fract() == 0.0 {
            format!("{v:.0}")
        } else {
            v.to_string()
        }
    }
}

pub fn fantasy_score(row: &GameStatRow) -> f64 {
    let raw = f64::from(row.points)
        + 1.25 * f64::from(row.rebounds)
        + 1.5 * f64::from(row.assists)
        + 2.0 * f64::from(row.steals)
        + 2.0 * f64::from(row.blocks)
        - 0.5 * f64::from(row.turnovers)
        + 0.5 * f64::from(row.three_pointers.made);
    (raw * 10.0).round() / 10.0
}

pub fn derive_value(row: &GameStatRow, prop: PropType) -> PropValue {
    let sum = |fields: &[u32]| PropValue::Value(fields.iter().map(|v| f64::from(*v)).sum());
    match prop {
        PropType::Points => sum(&[row.points]),
        PropType::Rebounds => sum(&[row.rebounds]),
        PropType::Assists => sum(&[row.assists]),
        PropType::Turnovers => sum(&[row.turnovers]),
        PropType::Steals => sum(&[row.steals]),
        PropType::Blocks => sum(&[row.blocks]),
        PropType::ThreesMade => sum(&[row.three_pointers.made]),
        PropType::ThreePointAttempts => sum(&[row.three_pointers.attempted]),
        PropType::FieldGoalsMade => sum(&[row.field_goals.made]),
        PropType::FieldGoalAttempts => sum(&[row.field_goals.attempted]),
        PropType::FreeThrowsMade => sum(&[row.free_throws.made]),
        PropType::StealsBlocks => sum(&[row.steals, row.blocks]),
        PropType::PtsRebsAsts => sum(&[row.points, row.rebounds, row.assists]),
        PropType::PtsRebs => sum(&[row.points, row.rebounds]),
        PropType::PtsAsts => sum(&[row.points, row.assists]),
        PropType::RebsAsts => sum(&[row.rebounds, row.assists]),
        PropType::FantasyScore => PropValue::Value(fantasy_score(row)),
        PropType::DoubleDouble => PropValue::NotApplicable,
    }
}

pub fn derive_all(rows: &[GameStatRow], prop: PropType) -> Vec<PropValue> {
    rows.iter().map(|row| derive_value(row, prop)).collect()
}
