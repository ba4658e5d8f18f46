use std::fs;
use std::path::PathBuf;

use prop_tensor::context_assembly::{AssemblyInput, TrendSource, assemble_context};
use prop_tensor::game_log_fetch::parse_game_log_json;
use prop_tensor::manual_entry::{EntryField, EntrySource, ManualGrid};
use prop_tensor::prop_derive::{PropType, PropValue, derive_all};
use prop_tensor::state::{BlowoutRisk, GameStatRow, InjuryList, RosterSnapshot, Severity};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn rows() -> Vec<GameStatRow> {
    parse_game_log_json(&read_fixture("espn_gamelog.json"))
        .expect("fixture should parse")
        .normalize()
}

#[test]
fn switching_props_and_back_is_idempotent() {
    let rows = rows();
    let mut grid = ManualGrid::new();
    grid.autofill(&rows, PropType::Points);
    let first = grid.clone();

    grid.autofill(&rows, PropType::PtsRebsAsts);
    assert_eq!(grid.get(0).map(|s| s.value.as_str()), Some("36"));
    grid.autofill(&rows, PropType::FantasyScore);
    grid.autofill(&rows, PropType::Points);

    assert_eq!(grid, first);
    assert_eq!(grid.get(0).map(|s| s.value.as_str()), Some("28"));
    assert_eq!(grid.get(0).map(|s| s.opponent.as_str()), Some("GSW"));
}

#[test]
fn user_slots_survive_prop_switches() {
    let rows = rows();
    let mut grid = ManualGrid::new();
    grid.autofill(&rows, PropType::Points);
    grid.set_field(2, EntryField::Value, "40");

    grid.autofill(&rows, PropType::Rebounds);
    let slot = grid.get(2).expect("slot");
    assert_eq!(slot.value, "40");
    assert_eq!(slot.source, EntrySource::User);
    assert_eq!(grid.get(0).map(|s| s.source), Some(EntrySource::Derived));
    assert_eq!(grid.get(0).map(|s| s.value.as_str()), Some("3"));
}

#[test]
fn double_double_never_derives() {
    let values = derive_all(&rows(), PropType::DoubleDouble);
    assert_eq!(values.len(), 10);
    assert!(values.iter().all(|v| *v == PropValue::NotApplicable));
}

#[test]
fn fixture_game_log_feeds_context_when_grid_is_empty() {
    let rows = rows();
    let grid = ManualGrid::new();
    let mut mates = InjuryList::new();
    mates.add("Rudy Gobert", Severity::Doubtful);
    let opps = InjuryList::new();
    let team = RosterSnapshot::default();
    let opp = RosterSnapshot::default();

    let ctx = assemble_context(&AssemblyInput {
        player: "Anthony Edwards",
        opponent: "DEN",
        prop: PropType::Points,
        line: Some(24.5),
        manual: &grid,
        game_log: &rows,
        analyst_notes: "",
        blowout: BlowoutRisk::Maybe,
        teammate_injuries: &mates,
        opponent_injuries: &opps,
        team_roster: &team,
        opponent_roster: &opp,
        primary_defender: Some("Aaron Gordon"),
    })
    .expect("context");

    assert_eq!(ctx.trend_source, TrendSource::GameLog);
    assert_eq!(ctx.trend_evidence.lines().count(), 11);
    assert_eq!(ctx.injuries, vec!["Rudy Gobert is DOUBTFUL (Teammate)".to_string()]);
    assert_eq!(ctx.matchup, "Aaron Gordon");
    assert_eq!(ctx.latest_game.as_ref().map(|g| g.points), Some(28));
    assert!(ctx.roster.is_empty());
}
