use std::time::Duration;

use anyhow::Result;
use reqwest::blocking::Client;
use tracing::info;

use crate::game_log_fetch::fetch_game_log;
use crate::http_client::build_http_client;
use crate::roster_fetch::fetch_roster;
use crate::state::{GameStatRow, RosterSnapshot};

/// Where rosters and game logs come from. Implementations absorb their own
/// failures into empty results.
pub trait StatsSource: Sync {
    fn roster(&self, team: &str) -> RosterSnapshot;
    fn game_log(&self, player_id: &str) -> Vec<GameStatRow>;
}

pub struct EspnSource {
    client: Client,
}

impl EspnSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
        })
    }
}

impl StatsSource for EspnSource {
    fn roster(&self, team: &str) -> RosterSnapshot {
        fetch_roster(&self.client, team)
    }

    fn game_log(&self, player_id: &str) -> Vec<GameStatRow> {
        fetch_game_log(&self.client, player_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchupData {
    /// Full team roster, subject player included.
    pub team_roster: RosterSnapshot,
    pub opponent_roster: RosterSnapshot,
    pub player_id: Option<String>,
    pub game_log: Vec<GameStatRow>,
}

impl MatchupData {
    pub fn teammates(&self, player_name: &str) -> RosterSnapshot {
        self.team_roster.without_player(player_name)
    }
}

/// Both rosters for a matchup, plus the subject player's game log when the
/// player can be found on the team roster.
pub fn load_matchup(
    source: &dyn StatsSource,
    team: &str,
    opponent: &str,
    player_name: &str,
) -> MatchupData {
    let (team_roster, opponent_roster) =
        rayon::join(|| source.roster(team), || source.roster(opponent));

    let player_id = team_roster
        .entries
        .iter()
        .find(|e| e.display_name == player_name.trim())
        .map(|e| e.id.clone());
    let game_log = match &player_id {
        Some(id) => source.game_log(id),
        None => Vec::new(),
    };

    info!(
        team,
        opponent,
        player = player_name,
        teammates = team_roster.entries.len(),
        opponents = opponent_roster.entries.len(),
        games = game_log.len(),
        "matchup loaded"
    );

    MatchupData {
        team_roster,
        opponent_roster,
        player_id,
        game_log,
    }
}
