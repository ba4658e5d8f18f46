// Prompt templates for the three inference modes: initial judgment,
// revision (debate), and parlay construction. Every template pins the exact
// JSON shape the gateway validates against.

use crate::context_assembly::PredictionContext;
use crate::state::{ChatTurn, PredictionResult};

pub const INSUFFICIENT_DATA_MARKER: &str = "INSUFFICIENT_DATA";

pub const INITIAL_SYSTEM: &str =
    "You are a helpful sports betting assistant that outputs strict JSON.";
pub const REVISION_SYSTEM: &str = "You are a stubborn but logical NBA analyst. Output JSON.";
pub const PARLAY_SYSTEM: &str = "You are a Vegas handicapper. Output JSON.";

pub const INITIAL_TEMPERATURE: f32 = 0.0;
pub const REVISION_TEMPERATURE: f32 = 0.5;
pub const PARLAY_TEMPERATURE: f32 = 0.2;

fn or_unknown<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

pub fn initial_prompt(ctx: &PredictionContext) -> String {
    let roster = or_unknown(&ctx.roster, "Unknown");
    let opponent_roster = or_unknown(&ctx.opponent_roster, "Unknown");
    let injuries = if ctx.injuries.is_empty() {
        "None".to_string()
    } else {
        ctx.injuries.join(", ")
    };

    let history = if ctx.has_evidence() {
        ctx.trend_evidence.clone()
    } else {
        format!(
            "NO DATA SUPPLIED.\n\
             No game log, manual entries or analyst notes were provided for this player.\n\
             Do NOT invent a hypothetical scenario or guess from memory. Instead return exactly:\n\
             {{\"error\": \"{INSUFFICIENT_DATA_MARKER}: <one sentence asking the user for recent game data>\"}}"
        )
    };

    let deep = match &ctx.latest_game {
        Some(g) => format!(
            "- Shooting Splits: {} FG / {} 3PT / {} FT\n\
             - Defense: {} Stl, {} Blk\n\
             - Turnovers: {}\n\
             - Minutes: {}",
            g.field_goals, g.three_pointers, g.free_throws, g.steals, g.blocks, g.turnovers, g.minutes
        ),
        None => "- No automatic box score available.".to_string(),
    };

    format!(
        "You are a professional NBA Betting Strategist.

### 0. CRITICAL ROSTER CHECK (LIVE DATA)
**A. TEAMMATE CHECK (Usage & Volume)**
- **Active Roster:** [ {roster} ]
- **Instruction:** Compare this Active Roster to the historical game logs.
- **Logic:** If a high-usage starter is ACTIVE today but was MISSING from the recent logs (returning from injury), assume they will take usage away from {player}.

**B. OPPONENT CHECK (Defense & Matchups)**
- **Opponent Roster:** [ {opponent_roster} ]
- **Instruction:** Look for elite defenders in this list.

These two lists are authoritative. They override anything you believe from training data. Never mention a player who is not in them.

### THE MATCHUP
- Player: {player}
- Opponent: {opponent}
- BET: {prop} @ {line}

### 1. THE DATA (HISTORY)
{history}

### 2. DEEP STAT CONTEXT (most recent game)
{deep}

### 3. CONTEXT
- Blowout Risk: {blowout}
- Injuries: {injuries}
- Matchup: {matchup}

### RULES:
1. TRUST THE ROSTER LISTS ABOVE ALL ELSE.
2. Analyze efficiency over raw points.
3. Be decisive.
4. Use only the data above. If it is missing, follow the NO DATA instruction instead of picking.

### OUTPUT FORMAT (JSON ONLY):
Return a single valid JSON object. No markdown.
{{
  \"pick\": \"OVER\" or \"UNDER\",
  \"confidence\": \"Strong\" or \"Medium\" or \"Risky\",
  \"thought_process\": [\"1. Roster Check: ...\", \"2. ...\", \"3. ...\"],
  \"safe_line\": \"Alternative safe bet\",
  \"risky_line\": \"High risk ladder play\",
  \"better_prop\": \"Pivot suggestion\"
}}

IMPORTANT: \"pick\" MUST be exactly \"OVER\" or \"UNDER\". No other words.
IMPORTANT: \"confidence\" MUST be exactly \"Strong\", \"Medium\", or \"Risky\".
",
        player = ctx.player,
        opponent = ctx.opponent,
        prop = ctx.prop.label(),
        line = ctx.line,
        blowout = ctx.blowout.label(),
        matchup = ctx.matchup,
    )
}

pub fn revision_prompt(
    ctx: &PredictionContext,
    current: &PredictionResult,
    transcript: &[ChatTurn],
    user_message: &str,
    today: &str,
) -> String {
    let roster = or_unknown(&ctx.roster, "Unknown Roster");
    let opponent_roster = or_unknown(&ctx.opponent_roster, "Unknown Opponent");

    let mut steps = String::new();
    for step in &current.reasoning_steps {
        steps.push_str("\n  - ");
        steps.push_str(step);
    }

    let mut history = String::new();
    for turn in transcript {
        history.push_str(&format!(
            "\n- USER: \"{}\"\n  YOU: \"{}\" (pick {}, confidence {})",
            turn.user_message,
            turn.reply,
            turn.adjusted_pick.label(),
            turn.confidence_delta.label(),
        ));
    }
    if history.is_empty() {
        history.push_str("\n- (none)");
    }

    format!(
        "You are a stubborn but logical NBA Analyst. Today is {today}.

### CRITICAL INSTRUCTION: ROSTER LOCK
You are forbidden from using your internal training data regarding teams.
You must ONLY use the live rosters provided below.

**CURRENT TEAMMATES FOR {player}:** [ {roster} ]

**CURRENT OPPONENTS ({opponent}):** [ {opponent_roster} ]

**RULE:** If a player is NOT in the lists above, THEY ARE NOT ON THE TEAM.
**RULE:** Do NOT mention historical teammates who are no longer on the roster.
**RULE:** If the user states a roster or injury fact that does not contradict the lists above, accept it as true and reason from it.
**RULE:** You may double down on your pick only when the user's argument is not based on evidence.

### YOUR CURRENT JUDGMENT
- Bet: {prop} @ {line}
- Pick: {pick}
- Confidence: {confidence}
- Reasoning:{steps}

### DEBATE SO FAR{history}

### USER'S ARGUMENT:
\"{user_message}\"

### OUTPUT (JSON ONLY):
Return a single valid JSON object:
{{
  \"reply\": \"At most two sentences. Direct, professional, accurate to the roster.\",
  \"adjusted_pick\": \"OVER\" or \"UNDER\",
  \"confidence_change\": \"Increased\" or \"Decreased\" or \"Same\"
}}
",
        player = ctx.player,
        opponent = ctx.opponent,
        prop = ctx.prop.label(),
        line = ctx.line,
        pick = current.pick.label(),
        confidence = current.confidence.label(),
        user_message = user_message.trim(),
    )
}

pub fn parlay_prompt(notes: &str, date: &str) -> String {
    format!(
        "You are a High-Stakes Vegas Handicapper. Today is {date}.

### USER NOTES (THE SOURCE OF TRUTH):
\"{notes}\"

### TASK:
Construct a 3-Leg Parlay based ONLY on the user notes above.
Do not reference players, games or injuries that the notes do not mention.

### OUTPUT (JSON ONLY):
{{
  \"parlay_name\": \"short title\",
  \"total_odds\": \"e.g. +600\",
  \"risk_level\": \"Low\" or \"Medium\" or \"High\",
  \"legs\": [{{\"game\": \"AWAY @ HOME\", \"bet\": \"Player OVER 24.5 Points\", \"reason\": \"one line\"}}],
  \"analysis\": \"why these legs fit together\"
}}
",
        notes = notes.trim(),
    )
}
