use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::state::{GameStatRow, Split};

pub const MAX_GAMES: usize = 10;

/// Labels that must resolve for a label-driven map to be trusted.
pub const REQUIRED_LABELS: &[&str] = &["PTS"];

/// One upstream game as delivered: positional stat cells plus whatever
/// metadata the provider attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGameRecord {
    pub event_id: String,
    pub date: Option<String>,
    pub opponent: Option<String>,
    pub result: Option<String>,
    pub score: Option<String>,
    pub stats: Vec<String>,
}

/// Resolved column positions for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub minutes: Option<usize>,
    pub points: Option<usize>,
    pub rebounds: Option<usize>,
    pub assists: Option<usize>,
    pub steals: Option<usize>,
    pub blocks: Option<usize>,
    pub turnovers: Option<usize>,
    pub field_goals: Option<usize>,
    pub three_pointers: Option<usize>,
    pub free_throws: Option<usize>,
}

impl ColumnMap {
    /// Historical provider layout:
    /// MIN, FG, FG%, 3PT, 3P%, FT, FT%, REB, AST, BLK, STL, PF, TO, PTS.
    pub const DEFAULT: ColumnMap = ColumnMap {
        minutes: Some(0),
        field_goals: Some(1),
        three_pointers: Some(3),
        free_throws: Some(5),
        rebounds: Some(7),
        assists: Some(8),
        blocks: Some(9),
        steals: Some(10),
        turnovers: Some(12),
        points: Some(13),
    };

    pub fn from_labels(labels: Option<&[String]>) -> Self {
        let Some(labels) = labels.filter(|l| !l.is_empty()) else {
            debug!("game log has no column labels; using default layout");
            return Self::DEFAULT;
        };
        let find = |name: &str| {
            labels
                .iter()
                .position(|label| label.trim().eq_ignore_ascii_case(name))
        };
        if let Some(missing) = REQUIRED_LABELS.iter().find(|name| find(**name).is_none()) {
            debug!(label = *missing, "required column missing; using default layout");
            return Self::DEFAULT;
        }
        Self {
            minutes: find("MIN"),
            points: find("PTS"),
            rebounds: find("REB"),
            assists: find("AST"),
            steals: find("STL"),
            blocks: find("BLK"),
            turnovers: find("TO"),
            field_goals: find("FG"),
            three_pointers: find("3PT"),
            free_throws: find("FT"),
        }
    }

    pub fn row_from(&self, record: &RawGameRecord) -> GameStatRow {
        let stats = record.stats.as_slice();
        GameStatRow {
            date: record.date.clone().unwrap_or_default(),
            opponent_abbrev: non_blank(record.opponent.as_deref()).unwrap_or("OPP").to_string(),
            result: non_blank(record.result.as_deref()).unwrap_or("-").to_string(),
            score: record.score.clone().unwrap_or_default(),
            minutes: count_at(stats, self.minutes),
            points: count_at(stats, self.points),
            rebounds: count_at(stats, self.rebounds),
            assists: count_at(stats, self.assists),
            steals: count_at(stats, self.steals),
            blocks: count_at(stats, self.blocks),
            turnovers: count_at(stats, self.turnovers),
            field_goals: split_at(stats, self.field_goals),
            three_pointers: split_at(stats, self.three_pointers),
            free_throws: split_at(stats, self.free_throws),
        }
    }
}

/// Played games only, newest first, at most [`MAX_GAMES`].
pub fn normalize_game_log(records: &[RawGameRecord], labels: Option<&[String]>) -> Vec<GameStatRow> {
    let map = ColumnMap::from_labels(labels);
    let mut ordered: Vec<(&RawGameRecord, Option<NaiveDateTime>)> = records
        .iter()
        .filter(|r| is_played(r))
        .map(|r| (r, r.date.as_deref().and_then(parse_game_date)))
        .collect();
    if ordered.iter().all(|(_, date)| date.is_some()) {
        ordered.sort_by(|a, b| b.1.cmp(&a.1));
    } else {
        // Upstream lists oldest first.
        ordered.reverse();
    }

    ordered
        .into_iter()
        .take(MAX_GAMES)
        .map(|(record, _)| map.row_from(record))
        .collect()
}

pub fn is_played(record: &RawGameRecord) -> bool {
    record.stats.iter().any(|cell| !cell.trim().is_empty())
}

pub fn parse_game_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ") {
        return Some(dt);
    }
    let day = NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()?;
    day.and_hms_opt(0, 0, 0)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn cell(stats: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| stats.get(i))
        .map(|s| s.trim())
        .unwrap_or("")
}

fn count_at(stats: &[String], idx: Option<usize>) -> u32 {
    parse_count(cell(stats, idx))
}

fn split_at(stats: &[String], idx: Option<usize>) -> Split {
    Split::parse(cell(stats, idx)).unwrap_or_default()
}

fn parse_count(raw: &str) -> u32 {
    if let Ok(v) = raw.parse::<u32>() {
        return v;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v.round() as u32,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn record(date: &str, stats: &[&str]) -> RawGameRecord {
        RawGameRecord {
            event_id: date.to_string(),
            date: Some(date.to_string()),
            opponent: Some("DEN".to_string()),
            result: Some("W".to_string()),
            score: None,
            stats: stats.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn reordered_labels_resolve_by_name() {
        let l = labels(&["PTS", "REB", "AST", "MIN", "FG", "3PT", "FT", "STL", "BLK", "TO"]);
        let map = ColumnMap::from_labels(Some(l.as_slice()));
        assert_eq!(map.points, Some(0));
        assert_eq!(map.minutes, Some(3));
        let row = map.row_from(&record(
            "2025-01-01",
            &["31", "9", "4", "36", "11-20", "3-7", "6-6", "2", "1", "3"],
        ));
        assert_eq!(row.points, 31);
        assert_eq!(row.field_goals, Split::new(11, 20));
        assert_eq!(row.turnovers, 3);
    }

    #[test]
    fn missing_pts_label_falls_back_to_default_layout() {
        let l = labels(&["MIN", "FG", "REB"]);
        assert_eq!(ColumnMap::from_labels(Some(l.as_slice())), ColumnMap::DEFAULT);
        assert_eq!(ColumnMap::from_labels(None), ColumnMap::DEFAULT);
        assert_eq!(ColumnMap::from_labels(Some(Vec::<String>::new().as_slice())), ColumnMap::DEFAULT);
    }

    #[test]
    fn unresolved_columns_default_to_zero() {
        let l = labels(&["PTS"]);
        let map = ColumnMap::from_labels(Some(l.as_slice()));
        let row = map.row_from(&record("2025-01-01", &["12"]));
        assert_eq!(row.points, 12);
        assert_eq!(row.rebounds, 0);
        assert_eq!(row.three_pointers, Split::default());
        assert_eq!(row.three_pointers.to_string(), "0-0");
    }

    #[test]
    fn short_stat_array_never_panics() {
        let row = ColumnMap::DEFAULT.row_from(&record("2025-01-01", &["30"]));
        assert_eq!(row.minutes, 30);
        assert_eq!(row.points, 0);
        assert_eq!(row.free_throws, Split::default());
    }

    #[test]
    fn garbage_cells_become_zero() {
        let l = labels(&["PTS", "FG"]);
        let map = ColumnMap::from_labels(Some(l.as_slice()));
        let row = map.row_from(&record("2025-01-01", &["--", "n/a"]));
        assert_eq!(row.points, 0);
        assert_eq!(row.field_goals, Split::default());
    }

    #[test]
    fn undated_rows_reverse_upstream_order() {
        let mut a = record("", &["1"]);
        a.date = None;
        let mut b = record("", &["2"]);
        b.date = None;
        let l = labels(&["PTS"]);
        let rows = normalize_game_log(&[a, b], Some(l.as_slice()));
        assert_eq!(rows.iter().map(|r| r.points).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn espn_style_dates_parse() {
        assert!(parse_game_date("2025-01-15T00:30Z").is_some());
        assert!(parse_game_date("2025-01-15T00:30:00.000+00:00").is_some());
        assert!(parse_game_date("2025-01-15").is_some());
        assert!(parse_game_date("yesterday").is_none());
    }
}
