use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const FALLBACK_HEADSHOT: &str =
    "https://cdn.nba.com/headshots/nba/latest/1040x760/fallback.png";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub display_name: String,
    pub position: String,
    pub image_ref: String,
    pub jersey_number: Option<String>,
}

/// Point-in-time roster for one team. The display names are the only thing
/// carried into inference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterSnapshot {
    pub team_code: String,
    pub entries: Vec<RosterEntry>,
}

impl RosterSnapshot {
    pub fn new(team_code: impl Into<String>, entries: Vec<RosterEntry>) -> Self {
        Self {
            team_code: team_code.into(),
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.display_name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// Comma-joined display names, in roster order.
    pub fn name_list(&self) -> String {
        self.names().collect::<Vec<_>>().join(", ")
    }

    pub fn without_player(&self, name: &str) -> Self {
        Self {
            team_code: self.team_code.clone(),
            entries: self
                .entries
                .iter()
                .filter(|e| e.display_name != name)
                .cloned()
                .collect(),
        }
    }
}

/// A `(made, attempted)` shooting pair, rendered upstream as `"7-14"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Split {
    pub made: u32,
    pub attempted: u32,
}

impl Split {
    pub fn new(made: u32, attempted: u32) -> Self {
        Self { made, attempted }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let (made, attempted) = raw.trim().split_once('-')?;
        Some(Self {
            made: made.trim().parse().ok()?,
            attempted: attempted.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.made, self.attempted)
    }
}

impl From<Split> for String {
    fn from(split: Split) -> Self {
        split.to_string()
    }
}

impl TryFrom<String> for Split {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Split::parse(&raw).ok_or_else(|| format!("invalid split: {raw}"))
    }
}

/// One played game, fixed shape. Every numeric field is populated; absent
/// upstream values are zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameStatRow {
    pub date: String,
    pub opponent_abbrev: String,
    pub result: String,
    pub score: String,
    pub minutes: u32,
    pub points: u32,
    pub rebounds: u32,
    pub assists: u32,
    pub steals: u32,
    pub blocks: u32,
    pub turnovers: u32,
    pub field_goals: Split,
    pub three_pointers: Split,
    pub free_throws: Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "OUT")]
    Out,
    #[serde(rename = "OUT_FOR_SEASON")]
    OutForSeason,
    #[serde(rename = "DOUBTFUL")]
    Doubtful,
    #[serde(rename = "QUESTIONABLE")]
    Questionable,
    #[serde(rename = "PROBABLE")]
    Probable,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Out,
        Severity::OutForSeason,
        Severity::Doubtful,
        Severity::Questionable,
        Severity::Probable,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Severity::Out => "OUT",
            Severity::OutForSeason => "OUT_FOR_SEASON",
            Severity::Doubtful => "DOUBTFUL",
            Severity::Questionable => "QUESTIONABLE",
            Severity::Probable => "PROBABLE",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Severity::ALL
            .into_iter()
            .find(|sev| sev.label() == key)
            .ok_or_else(|| format!("unknown injury status: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjuryAnnotation {
    pub player_name: String,
    pub severity: Severity,
}

/// Injury annotations for one side of the matchup, unique by player name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjuryList {
    items: Vec<InjuryAnnotation>,
}

impl InjuryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the name is blank or already annotated.
    pub fn add(&mut self, player_name: &str, severity: Severity) -> bool {
        let name = player_name.trim();
        if name.is_empty() || self.items.iter().any(|i| i.player_name == name) {
            return false;
        }
        self.items.push(InjuryAnnotation {
            player_name: name.to_string(),
            severity,
        });
        true
    }

    pub fn remove(&mut self, player_name: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.player_name != player_name);
        self.items.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &InjuryAnnotation> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlowoutRisk {
    #[default]
    No,
    Maybe,
    Yes,
}

impl BlowoutRisk {
    pub fn label(self) -> &'static str {
        match self {
            BlowoutRisk::No => "No",
            BlowoutRisk::Maybe => "Maybe",
            BlowoutRisk::Yes => "Yes",
        }
    }
}

impl FromStr for BlowoutRisk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "no" => Ok(BlowoutRisk::No),
            "maybe" => Ok(BlowoutRisk::Maybe),
            "yes" => Ok(BlowoutRisk::Yes),
            _ => Err(format!("unknown blowout risk: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pick {
    #[serde(rename = "OVER")]
    Over,
    #[serde(rename = "UNDER")]
    Under,
}

impl Pick {
    pub fn label(self) -> &'static str {
        match self {
            Pick::Over => "OVER",
            Pick::Under => "UNDER",
        }
    }
}

// Exact literals only: the provider contract does not allow "Over" or "over".
impl FromStr for Pick {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OVER" => Ok(Pick::Over),
            "UNDER" => Ok(Pick::Under),
            _ => Err(format!("pick must be \"OVER\" or \"UNDER\", got {s:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Risky,
    Medium,
    Strong,
}

impl Confidence {
    pub fn label(self) -> &'static str {
        match self {
            Confidence::Strong => "Strong",
            Confidence::Medium => "Medium",
            Confidence::Risky => "Risky",
        }
    }

    pub fn shifted(self, delta: ConfidenceDelta) -> Self {
        match (delta, self) {
            (ConfidenceDelta::Same, c) => c,
            (ConfidenceDelta::Increased, Confidence::Risky) => Confidence::Medium,
            (ConfidenceDelta::Increased, _) => Confidence::Strong,
            (ConfidenceDelta::Decreased, Confidence::Strong) => Confidence::Medium,
            (ConfidenceDelta::Decreased, _) => Confidence::Risky,
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Strong" => Ok(Confidence::Strong),
            "Medium" => Ok(Confidence::Medium),
            "Risky" => Ok(Confidence::Risky),
            _ => Err(format!(
                "confidence must be \"Strong\", \"Medium\" or \"Risky\", got {s:?}"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceDelta {
    Increased,
    Decreased,
    Same,
}

impl ConfidenceDelta {
    pub fn label(self) -> &'static str {
        match self {
            ConfidenceDelta::Increased => "Increased",
            ConfidenceDelta::Decreased => "Decreased",
            ConfidenceDelta::Same => "Same",
        }
    }
}

impl FromStr for ConfidenceDelta {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Increased" => Ok(ConfidenceDelta::Increased),
            "Decreased" => Ok(ConfidenceDelta::Decreased),
            "Same" => Ok(ConfidenceDelta::Same),
            _ => Err(format!(
                "confidence_change must be \"Increased\", \"Decreased\" or \"Same\", got {s:?}"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub pick: Pick,
    pub confidence: Confidence,
    pub reasoning_steps: Vec<String>,
    pub safer_alternative: String,
    pub riskier_alternative: String,
    pub pivot_suggestion: String,
}

impl PredictionResult {
    /// The judgment after one accepted revision turn.
    pub fn revised(&self, turn: &ChatTurn) -> Self {
        let mut next = self.clone();
        if turn.adjusted_pick != next.pick {
            next.pick = turn.adjusted_pick;
        }
        next.confidence = next.confidence.shifted(turn.confidence_delta);
        next
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub user_message: String,
    pub reply: String,
    pub adjusted_pick: Pick,
    pub confidence_delta: ConfidenceDelta,
}
