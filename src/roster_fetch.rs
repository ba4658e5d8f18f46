use std::collections::HashMap;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http_client::get_text;
use crate::state::{FALLBACK_HEADSHOT, RosterEntry, RosterSnapshot};

const ESPN_TEAM_URL: &str = "https://site.api.espn.com/apis/site/v2/sports/basketball/nba/teams";

/// League abbreviations the roster endpoint spells differently.
static TEAM_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("UTA", "utah"),
        ("NOP", "no"),
        ("SAS", "sa"),
        ("GSW", "gs"),
        ("NYK", "ny"),
        ("WAS", "wsh"),
        ("PHX", "phx"),
        ("BKN", "bkn"),
        ("OKC", "okc"),
        ("ATL", "atl"),
        ("BOS", "bos"),
        ("CHA", "cha"),
        ("CHI", "chi"),
        ("CLE", "cle"),
        ("DAL", "dal"),
        ("DEN", "den"),
        ("DET", "det"),
        ("HOU", "hou"),
        ("IND", "ind"),
        ("LAC", "lac"),
        ("LAL", "lal"),
        ("MEM", "mem"),
        ("MIA", "mia"),
        ("MIL", "mil"),
        ("MIN", "min"),
        ("ORL", "orl"),
        ("PHI", "phi"),
        ("POR", "por"),
        ("SAC", "sac"),
        ("TOR", "tor"),
    ])
});

pub const NBA_TEAMS: &[&str] = &[
    "ATL", "BOS", "BKN", "CHA", "CHI", "CLE", "DAL", "DEN", "DET", "GSW", "HOU", "IND", "LAC",
    "LAL", "MEM", "MIA", "MIL", "MIN", "NOP", "NYK", "OKC", "ORL", "PHI", "PHX", "POR", "SAC",
    "SAS", "TOR", "UTA", "WAS",
];

pub fn provider_team_code(team: &str) -> String {
    let trimmed = team.trim();
    let upper = trimmed.to_ascii_uppercase();
    match TEAM_ALIASES.get(upper.as_str()) {
        Some(code) => (*code).to_string(),
        None => trimmed.to_ascii_lowercase(),
    }
}

/// Roster for `team`; any failure degrades to an empty snapshot.
pub fn fetch_roster(client: &Client, team: &str) -> RosterSnapshot {
    let code = provider_team_code(team);
    let url = format!("{ESPN_TEAM_URL}/{code}/roster");
    let entries = match get_text(client, &url).and_then(|body| parse_roster_json(&body)) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(team, mapped = %code, "roster fetch failed: {err:#}");
            Vec::new()
        }
    };
    debug!(team, players = entries.len(), "roster loaded");
    RosterSnapshot::new(team.trim().to_ascii_uppercase(), entries)
}

pub fn parse_roster_json(raw: &str) -> Result<Vec<RosterEntry>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow::anyhow!("empty roster response"));
    }
    let parsed: RosterResponse = serde_json::from_str(trimmed).context("invalid roster json")?;

    let mut athletes = Vec::new();
    for item in parsed.athletes {
        match item {
            AthleteItem::Group { items } => athletes.extend(items),
            AthleteItem::Athlete(athlete) => athletes.push(athlete),
        }
    }

    Ok(athletes
        .into_iter()
        .filter(|a| !a.full_name.trim().is_empty())
        .filter_map(|a| {
            let id = a.id.as_ref()?.to_string();
            Some(RosterEntry {
                id,
                display_name: a.full_name.trim().to_string(),
                position: a
                    .position
                    .and_then(|p| p.abbreviation)
                    .unwrap_or_else(|| "-".to_string()),
                image_ref: a
                    .headshot
                    .and_then(|h| h.href)
                    .unwrap_or_else(|| FALLBACK_HEADSHOT.to_string()),
                jersey_number: a.jersey,
            })
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct RosterResponse {
    #[serde(default)]
    athletes: Vec<AthleteItem>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AthleteItem {
    Group { items: Vec<Athlete> },
    Athlete(Athlete),
}

#[derive(Debug, Deserialize)]
struct Athlete {
    id: Option<IdValue>,
    #[serde(rename = "fullName", default)]
    full_name: String,
    position: Option<Position>,
    headshot: Option<Headshot>,
    jersey: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Number(u64),
}

impl std::fmt::Display for IdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdValue::Text(s) => f.write_str(s),
            IdValue::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Position {
    abbreviation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Headshot {
    href: Option<String>,
}
