use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::entitlement::{EntitlementGate, Identity};
use crate::error::{PropError, Result};
use crate::inference::{CompletionRequest, InferenceGateway, declined, parse_object, required};
use crate::prompt;

/// Canned note skeletons the user fills in before building a parlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickPrompt {
    pub label: &'static str,
    pub text: &'static str,
}

pub const QUICK_PROMPTS: &[QuickPrompt] = &[
    QuickPrompt {
        label: "Late Night Special",
        text: "Only one game left: [ENTER HOME TEAM] vs [ENTER AWAY TEAM].\n\nCONTEXT:\n- Home Team Injuries: [PASTE HERE]\n- Away Team Injuries: [PASTE HERE]\n\nAnalyze fatigue and give me the best prop.",
    },
    QuickPrompt {
        label: "Best Locks Only",
        text: "Look at these matchups: [PASTE MATCHUPS HERE].\n\nINJURY NEWS: [PASTE INJURIES HERE].\n\nWhat are the absolute best locks? Analyze everything based on this news.",
    },
    QuickPrompt {
        label: "2-Leg All-In",
        text: "I want a 2-leg ALL-IN parlay for [ENTER TEAM NAME] right now.\n\nNOTE: [PLAYER NAME] is OUT today.\n\nGive me the safest, most logical plays based on that outage.",
    },
    QuickPrompt {
        label: "8-Leg Blowout Unders",
        text: "Analyze [ENTER TEAMS]. Give me an 8-leg parlay of UNDERS assuming a blowout.\n\nCONTEXT: [Explain why you think it's a blowout]",
    },
    QuickPrompt {
        label: "Coach's Mindset",
        text: "For the [ENTER TEAM NAME] game: Who do you think will be the top scorer?\n\nOPPONENT DEFENSE: [Paste Defensive Stats or Ranking]\n\nThink like a coach countering AI-driven game plans.",
    },
    QuickPrompt {
        label: "Hidden Gems",
        text: "Since [ENTER TEAM NAME] is an inside team, who should I take OVER or UNDER on rebounds for [ENTER OPPONENT NAME]? Find me hidden gems.",
    },
];

pub fn quick_prompt(label: &str) -> Option<&'static QuickPrompt> {
    QUICK_PROMPTS
        .iter()
        .find(|p| p.label.eq_ignore_ascii_case(label.trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(format!("risk_level must be Low, Medium or High, got {s:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParlayLeg {
    pub game: String,
    pub bet: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParlaySuggestion {
    pub name: String,
    pub total_odds: String,
    pub risk_level: RiskLevel,
    pub legs: Vec<ParlayLeg>,
    pub analysis: String,
}

#[derive(Debug, Deserialize)]
struct ParlayWire {
    parlay_name: Option<String>,
    total_odds: Option<String>,
    risk_level: Option<String>,
    legs: Option<Vec<LegWire>>,
    analysis: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegWire {
    game: Option<String>,
    bet: Option<String>,
    reason: Option<String>,
}

fn non_blank(field: &str, value: Option<String>) -> Result<String> {
    let value = required(field, value)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PropError::invalid_output(format!("`{field}` is blank")));
    }
    Ok(trimmed.to_string())
}

pub fn parse_parlay(raw: &str) -> Result<ParlaySuggestion> {
    let wire: ParlayWire = parse_object(raw)?;
    declined(wire.error)?;

    let legs = wire
        .legs
        .ok_or_else(|| PropError::invalid_output("missing field `legs`"))?;
    if legs.is_empty() {
        return Err(PropError::invalid_output("parlay has no legs"));
    }
    let legs = legs
        .into_iter()
        .map(|leg| {
            Ok(ParlayLeg {
                game: non_blank("game", leg.game)?,
                bet: non_blank("bet", leg.bet)?,
                reason: non_blank("reason", leg.reason)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ParlaySuggestion {
        name: non_blank("parlay_name", wire.parlay_name)?,
        total_odds: non_blank("total_odds", wire.total_odds)?,
        risk_level: required("risk_level", wire.risk_level)?
            .parse()
            .map_err(PropError::ModelOutputInvalid)?,
        legs,
        analysis: non_blank("analysis", wire.analysis)?,
    })
}

/// Build a parlay from free-text notes. The notes are the only facts the
/// model is given.
pub fn generate_parlay(
    notes: &str,
    identity: &Identity,
    gate: &EntitlementGate,
    gateway: &InferenceGateway,
) -> Result<ParlaySuggestion> {
    gate.check(identity)?;
    let notes = notes.trim();
    if notes.is_empty() {
        return Err(PropError::InvalidInput(
            "add some notes (matchups, injuries) before building a parlay".to_string(),
        ));
    }

    let today = Utc::now().format("%A, %B %-d, %Y").to_string();
    let prompt = prompt::parlay_prompt(notes, &today);
    info!(notes_len = notes.len(), "requesting parlay");
    let raw = gateway.complete_raw(&CompletionRequest {
        system: prompt::PARLAY_SYSTEM,
        prompt: &prompt,
        temperature: prompt::PARLAY_TEMPERATURE,
    })?;
    let parlay = parse_parlay(&raw)?;
    info!(name = %parlay.name, legs = parlay.legs.len(), "parlay received");
    Ok(parlay)
}
