use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http_client::get_text;
use crate::stat_normalize::{RawGameRecord, normalize_game_log};
use crate::state::GameStatRow;

const ESPN_GAMELOG_URL: &str =
    "https://site.web.api.espn.com/apis/common/v3/sports/basketball/nba/athletes";
const REGULAR_SEASON_ID: &str = "2";
const REGULAR_SEASON_SLUG: &str = "regular-season";

/// Raw regular-season game log: label row plus positional records, oldest first.
#[derive(Debug, Clone, Default)]
pub struct GameLogPayload {
    pub labels: Option<Vec<String>>,
    pub records: Vec<RawGameRecord>,
}

impl GameLogPayload {
    pub fn normalize(&self) -> Vec<GameStatRow> {
        normalize_game_log(&self.records, self.labels.as_deref())
    }
}

/// Last ten played games for `player_id`, newest first. Failures degrade to
/// an empty log so callers fall back to manual entry.
pub fn fetch_game_log(client: &Client, player_id: &str) -> Vec<GameStatRow> {
    let url = format!("{ESPN_GAMELOG_URL}/{}/gamelog", player_id.trim());
    match get_text(client, &url).and_then(|body| parse_game_log_json(&body)) {
        Ok(payload) => {
            let rows = payload.normalize();
            debug!(
                player_id,
                upstream = payload.records.len(),
                played = rows.len(),
                "game log loaded"
            );
            rows
        }
        Err(err) => {
            warn!(player_id, "game log fetch failed: {err:#}");
            Vec::new()
        }
    }
}

pub fn parse_game_log_json(raw: &str) -> Result<GameLogPayload> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow::anyhow!("empty game log response"));
    }
    let parsed: GameLogResponse =
        serde_json::from_str(trimmed).context("invalid game log json")?;

    let season = parsed
        .season_types
        .iter()
        .find(|s| {
            s.id.as_deref() == Some(REGULAR_SEASON_ID)
                || s.slug.as_deref() == Some(REGULAR_SEASON_SLUG)
        })
        .or_else(|| parsed.season_types.first());
    let Some(season) = season else {
        return Ok(GameLogPayload {
            labels: parsed.labels,
            records: Vec::new(),
        });
    };

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    // Categories are listed newest month first; events within one are oldest first.
    for category in season.categories.iter().rev() {
        for event in &category.events {
            let event_id = event.event_id.clone().unwrap_or_default();
            if !event_id.is_empty() && !seen.insert(event_id.clone()) {
                continue;
            }
            let meta = parsed.events.get(&event_id);
            records.push(RawGameRecord {
                date: meta
                    .and_then(|m| m.game_date.clone())
                    .or_else(|| event.game_date.clone()),
                opponent: meta
                    .and_then(|m| m.opponent.as_ref())
                    .or(event.opponent.as_ref())
                    .and_then(|o| o.abbreviation.clone()),
                result: meta
                    .and_then(|m| m.game_result.clone())
                    .or_else(|| event.game_result.clone()),
                score: meta
                    .and_then(|m| m.score.clone())
                    .or_else(|| event.score.clone()),
                stats: event.stats.clone(),
                event_id,
            });
        }
    }

    Ok(GameLogPayload {
        labels: parsed.labels,
        records,
    })
}

#[derive(Debug, Deserialize)]
struct GameLogResponse {
    labels: Option<Vec<String>>,
    #[serde(default)]
    events: HashMap<String, EventMeta>,
    #[serde(rename = "seasonTypes", default)]
    season_types: Vec<SeasonType>,
}

#[derive(Debug, Deserialize)]
struct EventMeta {
    #[serde(rename = "gameDate")]
    game_date: Option<String>,
    opponent: Option<Opponent>,
    #[serde(rename = "gameResult")]
    game_result: Option<String>,
    score: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Opponent {
    abbreviation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeasonType {
    id: Option<String>,
    slug: Option<String>,
    #[serde(default)]
    categories: Vec<SeasonCategory>,
}

#[derive(Debug, Deserialize)]
struct SeasonCategory {
    #[serde(default)]
    events: Vec<CategoryEvent>,
}

#[derive(Debug, Deserialize)]
struct CategoryEvent {
    #[serde(rename = "eventId")]
    event_id: Option<String>,
    #[serde(default)]
    stats: Vec<String>,
    #[serde(rename = "gameDate")]
    game_date: Option<String>,
    opponent: Option<Opponent>,
    #[serde(rename = "gameResult")]
    game_result: Option<String>,
    score: Option<String>,
}
