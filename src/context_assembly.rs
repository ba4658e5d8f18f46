use serde::Serialize;

use crate::error::{PropError, Result};
use crate::manual_entry::ManualGrid;
use crate::prop_derive::{PropType, derive_value};
use crate::state::{
    BlowoutRisk, GameStatRow, InjuryAnnotation, InjuryList, RosterSnapshot,
};

pub const DEFAULT_MATCHUP: &str = "General Defense";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendSource {
    Manual,
    GameLog,
    None,
}

/// Everything the model sees for one judgment. Rebuilt for every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionContext {
    pub player: String,
    pub opponent: String,
    pub prop: PropType,
    pub line: f64,
    pub trend_source: TrendSource,
    pub trend_evidence: String,
    pub analyst_notes: Option<String>,
    pub blowout: BlowoutRisk,
    pub injuries: Vec<String>,
    pub teammate_injuries: Vec<InjuryAnnotation>,
    pub opponent_injuries: Vec<InjuryAnnotation>,
    pub roster: String,
    pub opponent_roster: String,
    pub matchup: String,
    pub latest_game: Option<GameStatRow>,
}

impl PredictionContext {
    /// True when the model has something concrete to reason from.
    pub fn has_evidence(&self) -> bool {
        self.trend_source != TrendSource::None || self.analyst_notes.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssemblyInput<'a> {
    pub player: &'a str,
    pub opponent: &'a str,
    pub prop: PropType,
    pub line: Option<f64>,
    pub manual: &'a ManualGrid,
    pub game_log: &'a [GameStatRow],
    pub analyst_notes: &'a str,
    pub blowout: BlowoutRisk,
    pub teammate_injuries: &'a InjuryList,
    pub opponent_injuries: &'a InjuryList,
    pub team_roster: &'a RosterSnapshot,
    pub opponent_roster: &'a RosterSnapshot,
    pub primary_defender: Option<&'a str>,
}

pub fn assemble_context(input: &AssemblyInput<'_>) -> Result<PredictionContext> {
    let player = input.player.trim();
    if player.is_empty() {
        return Err(PropError::InvalidInput("no player selected".to_string()));
    }
    let line = match input.line {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        Some(v) => return Err(PropError::InvalidInput(format!("invalid line: {v}"))),
        None => {
            return Err(PropError::InvalidInput(
                "enter a line before running the model (e.g. 24.5)".to_string(),
            ));
        }
    };

    let (trend_source, mut trend_evidence) = if input.manual.has_filled() {
        (TrendSource::Manual, manual_trend(input.manual, input.prop))
    } else if !input.game_log.is_empty() {
        (TrendSource::GameLog, game_log_trend(input.game_log, input.prop))
    } else {
        (TrendSource::None, String::new())
    };

    let notes = input.analyst_notes.trim();
    let analyst_notes = (!notes.is_empty()).then(|| notes.to_string());
    if let Some(notes) = &analyst_notes {
        if !trend_evidence.is_empty() {
            trend_evidence.push_str("\n\n");
        }
        trend_evidence.push_str("USER ANALYST NOTES (CRITICAL CONTEXT): ");
        trend_evidence.push_str(notes);
    }

    let injuries = input
        .teammate_injuries
        .iter()
        .map(|i| format!("{} is {} (Teammate)", i.player_name, i.severity.label()))
        .chain(
            input
                .opponent_injuries
                .iter()
                .map(|i| format!("{} is {} (Opponent)", i.player_name, i.severity.label())),
        )
        .collect();

    let matchup = input
        .primary_defender
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_MATCHUP)
        .to_string();

    Ok(PredictionContext {
        player: player.to_string(),
        opponent: input.opponent.trim().to_string(),
        prop: input.prop,
        line,
        trend_source,
        trend_evidence,
        analyst_notes,
        blowout: input.blowout,
        injuries,
        teammate_injuries: input.teammate_injuries.iter().cloned().collect(),
        opponent_injuries: input.opponent_injuries.iter().cloned().collect(),
        roster: input.team_roster.without_player(player).name_list(),
        opponent_roster: input.opponent_roster.name_list(),
        matchup,
        latest_game: input.game_log.first().cloned(),
    })
}

fn manual_trend(grid: &ManualGrid, prop: PropType) -> String {
    let mut out = String::from("RECENT GAME LOG:");
    for (idx, entry) in grid.filled().enumerate() {
        out.push_str(&format!(
            "\n- Game {} vs {}: {} {} (Result: {}, Mins: {})",
            idx + 1,
            or_placeholder(&entry.opponent, "???"),
            entry.value.trim(),
            prop.label(),
            or_placeholder(&entry.result, "-"),
            or_placeholder(&entry.minutes, "?"),
        ));
    }
    out
}

fn game_log_trend(rows: &[GameStatRow], prop: PropType) -> String {
    let mut out = String::from("RAW GAME LOG (Past Performance, newest first):");
    for row in rows {
        out.push_str(&format!(
            "\n- {} vs {} ({}): {} {} | {} MIN, {} PTS, {} REB, {} AST, {} STL, {} BLK, {} TO, FG {}, 3PT {}, FT {}",
            or_placeholder(&row.date, "?"),
            row.opponent_abbrev,
            row.result,
            derive_value(row, prop).render(prop),
            prop.label(),
            row.minutes,
            row.points,
            row.rebounds,
            row.assists,
            row.steals,
            row.blocks,
            row.turnovers,
            row.field_goals,
            row.three_pointers,
            row.free_throws,
        ));
    }
    out
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { placeholder } else { trimmed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manual_entry::EntryField;
    use crate::state::{RosterEntry, Severity, FALLBACK_HEADSHOT};

    fn roster(team: &str, names: &[&str]) -> RosterSnapshot {
        RosterSnapshot::new(
            team,
            names
                .iter()
                .map(|n| RosterEntry {
                    id: n.to_string(),
                    display_name: n.to_string(),
                    position: "F".to_string(),
                    image_ref: FALLBACK_HEADSHOT.to_string(),
                    jersey_number: None,
                })
                .collect(),
        )
    }

    struct Fixture {
        manual: ManualGrid,
        log: Vec<GameStatRow>,
        mates: InjuryList,
        opps: InjuryList,
        team: RosterSnapshot,
        opp: RosterSnapshot,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                manual: ManualGrid::new(),
                log: vec![GameStatRow {
                    date: "2025-01-10".to_string(),
                    opponent_abbrev: "PHX".to_string(),
                    result: "W".to_string(),
                    points: 31,
                    ..GameStatRow::default()
                }],
                mates: InjuryList::new(),
                opps: InjuryList::new(),
                team: roster("MIN", &["A", "C", "D"]),
                opp: roster("DEN", &["B", "E"]),
            }
        }

        fn input(&self) -> AssemblyInput<'_> {
            AssemblyInput {
                player: "A",
                opponent: "B",
                prop: PropType::Points,
                line: Some(24.5),
                manual: &self.manual,
                game_log: &self.log,
                analyst_notes: "",
                blowout: BlowoutRisk::No,
                teammate_injuries: &self.mates,
                opponent_injuries: &self.opps,
                team_roster: &self.team,
                opponent_roster: &self.opp,
                primary_defender: None,
            }
        }
    }

    #[test]
    fn manual_rows_replace_game_log_entirely() {
        let mut fx = Fixture::new();
        fx.manual.set_field(0, EntryField::Value, "28");
        fx.manual.set_field(0, EntryField::Opponent, "LAL");
        let ctx = assemble_context(&fx.input()).expect("context");
        assert_eq!(ctx.trend_source, TrendSource::Manual);
        assert!(ctx.trend_evidence.contains("Game 1 vs LAL: 28 Points (Result: -, Mins: ?)"));
        assert!(!ctx.trend_evidence.contains("PHX"));
    }

    #[test]
    fn game_log_used_when_grid_empty() {
        let fx = Fixture::new();
        let ctx = assemble_context(&fx.input()).expect("context");
        assert_eq!(ctx.trend_source, TrendSource::GameLog);
        assert!(ctx.trend_evidence.contains("vs PHX (W): 31 Points"));
        assert_eq!(ctx.latest_game.as_ref().map(|g| g.points), Some(31));
    }

    #[test]
    fn notes_follow_trend_evidence() {
        let fx = Fixture::new();
        let mut input = fx.input();
        input.analyst_notes = "  coach says minutes restriction  ";
        let ctx = assemble_context(&input).expect("context");
        let log_at = ctx.trend_evidence.find("RAW GAME LOG").expect("log block");
        let notes_at = ctx
            .trend_evidence
            .find("USER ANALYST NOTES (CRITICAL CONTEXT): coach says minutes restriction")
            .expect("notes block");
        assert!(log_at < notes_at);
    }

    #[test]
    fn injuries_flatten_with_side_tags() {
        let mut fx = Fixture::new();
        fx.mates.add("C", Severity::Out);
        fx.opps.add("E", Severity::Questionable);
        let ctx = assemble_context(&fx.input()).expect("context");
        assert_eq!(
            ctx.injuries,
            vec!["C is OUT (Teammate)".to_string(), "E is QUESTIONABLE (Opponent)".to_string()]
        );
    }

    #[test]
    fn rosters_serialize_in_full_without_subject() {
        let fx = Fixture::new();
        let ctx = assemble_context(&fx.input()).expect("context");
        assert_eq!(ctx.roster, "C, D");
        assert_eq!(ctx.opponent_roster, "B, E");
        assert_eq!(ctx.matchup, DEFAULT_MATCHUP);
    }

    #[test]
    fn missing_line_is_rejected() {
        let fx = Fixture::new();
        let mut input = fx.input();
        input.line = None;
        assert!(matches!(assemble_context(&input), Err(PropError::InvalidInput(_))));
        input.line = Some(f64::NAN);
        assert!(matches!(assemble_context(&input), Err(PropError::InvalidInput(_))));
    }

    #[test]
    fn no_evidence_is_flagged() {
        let mut fx = Fixture::new();
        fx.log.clear();
        let ctx = assemble_context(&fx.input()).expect("context");
        assert_eq!(ctx.trend_source, TrendSource::None);
        assert!(!ctx.has_evidence());
    }
}
