use chrono::Utc;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::InferenceConfig;
use crate::context_assembly::PredictionContext;
use crate::error::{PropError, Result};
use crate::prompt::{self, INSUFFICIENT_DATA_MARKER};
use crate::state::{ChatTurn, Confidence, ConfidenceDelta, Pick, PredictionResult};

pub const MAX_REPLY_SENTENCES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
}

/// One prompt in, one JSON-shaped text payload out. A single attempt per call.
pub trait InferenceProvider: Send + Sync {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String>;
}

/// OpenAI-compatible `chat/completions` client.
pub struct OpenAiProvider {
    client: Client,
    config: InferenceConfig,
}

impl OpenAiProvider {
    pub fn new(config: InferenceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| PropError::MissingConfiguration(format!("http client: {err}")))?;
        Ok(Self { client, config })
    }
}

impl InferenceProvider for OpenAiProvider {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let api_key = self.config.require_api_key()?;
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "response_format": { "type": "json_object" },
            "temperature": request.temperature,
        });

        debug!(model = %self.config.model, temperature = request.temperature, "sending completion request");
        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    PropError::invalid_output(format!(
                        "provider timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else {
                    PropError::invalid_output(format!("provider request failed: {err}"))
                }
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|err| PropError::invalid_output(format!("failed reading provider body: {err}")))?;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PropError::MissingConfiguration(format!(
                "provider rejected credentials (http {status})"
            )));
        }
        if !status.is_success() {
            warn!(%status, "provider returned an error status");
            return Err(PropError::invalid_output(format!("provider http {status}")));
        }

        completion_content(&text)
    }
}

/// The payload text from a `chat/completions` envelope.
fn completion_content(raw: &str) -> Result<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(raw)
        .map_err(|err| PropError::invalid_output(format!("invalid provider envelope: {err}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| PropError::invalid_output("no response from provider"))
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Validated answer to a contest message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionReply {
    pub reply: String,
    pub adjusted_pick: Pick,
    pub confidence_delta: ConfidenceDelta,
}

/// Renders prompts, calls the injected provider once, validates the payload.
pub struct InferenceGateway {
    provider: Box<dyn InferenceProvider>,
}

impl InferenceGateway {
    pub fn new(provider: Box<dyn InferenceProvider>) -> Self {
        Self { provider }
    }

    pub fn from_config(config: InferenceConfig) -> Result<Self> {
        Ok(Self::new(Box::new(OpenAiProvider::new(config)?)))
    }

    pub fn judge(&self, ctx: &PredictionContext) -> Result<PredictionResult> {
        let prompt = prompt::initial_prompt(ctx);
        info!(player = %ctx.player, prop = ctx.prop.label(), line = ctx.line, "requesting judgment");
        let raw = self.provider.complete(&CompletionRequest {
            system: prompt::INITIAL_SYSTEM,
            prompt: &prompt,
            temperature: prompt::INITIAL_TEMPERATURE,
        })?;
        parse_judgment(&raw)
    }

    pub fn revise(
        &self,
        ctx: &PredictionContext,
        current: &PredictionResult,
        transcript: &[ChatTurn],
        user_message: &str,
    ) -> Result<RevisionReply> {
        let today = Utc::now().format("%A, %B %-d, %Y").to_string();
        let prompt = prompt::revision_prompt(ctx, current, transcript, user_message, &today);
        info!(player = %ctx.player, turn = transcript.len() + 1, "requesting revision");
        let raw = self.provider.complete(&CompletionRequest {
            system: prompt::REVISION_SYSTEM,
            prompt: &prompt,
            temperature: prompt::REVISION_TEMPERATURE,
        })?;
        parse_revision(&raw)
    }

    pub(crate) fn complete_raw(&self, request: &CompletionRequest<'_>) -> Result<String> {
        self.provider.complete(request)
    }
}

#[derive(Debug, Deserialize)]
struct JudgmentWire {
    pick: Option<String>,
    confidence: Option<String>,
    thought_process: Option<Vec<String>>,
    safe_line: Option<String>,
    risky_line: Option<String>,
    better_prop: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RevisionWire {
    reply: Option<String>,
    adjusted_pick: Option<String>,
    confidence_change: Option<String>,
    error: Option<String>,
}

pub(crate) fn parse_object<T: for<'de> Deserialize<'de>>(raw: &str) -> Result<T> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return Err(PropError::invalid_output("response is not a JSON object"));
    }
    serde_json::from_str(trimmed)
        .map_err(|err| PropError::invalid_output(format!("response does not match schema: {err}")))
}

pub(crate) fn declined(error: Option<String>) -> Result<()> {
    match error {
        Some(msg) if msg.contains(INSUFFICIENT_DATA_MARKER) => Err(PropError::invalid_output(
            format!("model requested real data: {msg}"),
        )),
        Some(msg) => Err(PropError::invalid_output(format!("model reported an error: {msg}"))),
        None => Ok(()),
    }
}

pub(crate) fn required(field: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| PropError::invalid_output(format!("missing field `{field}`")))
}

pub fn parse_judgment(raw: &str) -> Result<PredictionResult> {
    let wire: JudgmentWire = parse_object(raw)?;
    declined(wire.error)?;

    let pick: Pick = required("pick", wire.pick)?
        .parse()
        .map_err(PropError::ModelOutputInvalid)?;
    let confidence: Confidence = required("confidence", wire.confidence)?
        .parse()
        .map_err(PropError::ModelOutputInvalid)?;
    let steps = wire
        .thought_process
        .ok_or_else(|| PropError::invalid_output("missing field `thought_process`"))?;
    if steps.is_empty() {
        return Err(PropError::invalid_output("thought_process is empty"));
    }
    if steps.iter().any(|s| s.trim().is_empty()) {
        return Err(PropError::invalid_output("thought_process contains an empty step"));
    }

    Ok(PredictionResult {
        pick,
        confidence,
        reasoning_steps: steps,
        safer_alternative: required("safe_line", wire.safe_line)?,
        riskier_alternative: required("risky_line", wire.risky_line)?,
        pivot_suggestion: required("better_prop", wire.better_prop)?,
    })
}

pub fn parse_revision(raw: &str) -> Result<RevisionReply> {
    let wire: RevisionWire = parse_object(raw)?;
    declined(wire.error)?;

    let reply = required("reply", wire.reply)?;
    let reply = reply.trim().to_string();
    if reply.is_empty() {
        return Err(PropError::invalid_output("reply is empty"));
    }
    let sentences = count_sentences(&reply);
    if sentences > MAX_REPLY_SENTENCES {
        return Err(PropError::invalid_output(format!(
            "reply has {sentences} sentences; at most {MAX_REPLY_SENTENCES} allowed"
        )));
    }

    Ok(RevisionReply {
        reply,
        adjusted_pick: required("adjusted_pick", wire.adjusted_pick)?
            .parse()
            .map_err(PropError::ModelOutputInvalid)?,
        confidence_delta: required("confidence_change", wire.confidence_change)?
            .parse()
            .map_err(PropError::ModelOutputInvalid)?,
    })
}

const ABBREVIATIONS: &[&str] = &["vs", "jr", "sr", "mr", "st", "approx", "etc"];

/// Sentences ending in `.`, `!` or `?` followed by whitespace or the end of
/// the text. Common abbreviations and decimals do not end a sentence.
pub fn count_sentences(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut count = 0;
    let mut word = String::new();
    let mut pending = false;
    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.get(i + 1).is_none_or(|n| n.is_whitespace());
            let abbreviation = c == '.' && ABBREVIATIONS.contains(&word.to_ascii_lowercase().as_str());
            if at_boundary && !abbreviation && pending {
                count += 1;
                pending = false;
            }
            word.clear();
        } else if c.is_whitespace() {
            word.clear();
        } else {
            word.push(c);
            pending = true;
        }
    }
    if pending {
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const GOOD: &str = r#"{
        "pick": "OVER",
        "confidence": "Medium",
        "thought_process": ["1. Roster Check: C is active", "2. Volume is up"],
        "safe_line": "Over 21.5",
        "risky_line": "30+ ladder",
        "better_prop": "Pts + Asts"
    }"#;

    #[test]
    fn valid_judgment_parses() {
        let r = parse_judgment(GOOD).expect("valid");
        assert_eq!(r.pick, Pick::Over);
        assert_eq!(r.confidence, Confidence::Medium);
        assert_eq!(r.reasoning_steps.len(), 2);
        assert_eq!(r.pivot_suggestion, "Pts + Asts");
    }

    #[test]
    fn loose_literals_are_rejected() {
        for bad in [
            GOOD.replace("\"OVER\"", "\"Over\""),
            GOOD.replace("\"OVER\"", "\"LEAN OVER\""),
            GOOD.replace("\"Medium\"", "\"High\""),
            GOOD.replace("\"safe_line\"", "\"safe\""),
        ] {
            let err = parse_judgment(&bad).expect_err("must reject");
            assert_eq!(err.kind(), ErrorKind::ModelOutputInvalid, "{bad}");
        }
    }

    #[test]
    fn empty_reasoning_is_rejected() {
        let raw = r#"{"pick":"UNDER","confidence":"Risky","thought_process":[],
            "safe_line":"","risky_line":"","better_prop":""}"#;
        assert!(parse_judgment(raw).is_err());
    }

    #[test]
    fn diagnostic_error_is_model_output_invalid() {
        let raw = r#"{"error":"INSUFFICIENT_DATA: please paste the last five games"}"#;
        let err = parse_judgment(raw).expect_err("declined");
        assert_eq!(err.kind(), ErrorKind::ModelOutputInvalid);
        assert!(err.to_string().contains("requested real data"));
    }

    #[test]
    fn markdown_wrapped_json_is_rejected() {
        let raw = format!("```json\n{GOOD}\n```");
        assert!(parse_judgment(&raw).is_err());
        assert!(parse_judgment("OVER, strong").is_err());
    }

    #[test]
    fn revision_parses_and_checks_length() {
        let ok = r#"{"reply":"Fair point vs. Denver. I still like the over.",
            "adjusted_pick":"OVER","confidence_change":"Same"}"#;
        let r = parse_revision(ok).expect("valid");
        assert_eq!(r.confidence_delta, ConfidenceDelta::Same);

        let long = r#"{"reply":"One. Two. Three.","adjusted_pick":"UNDER","confidence_change":"Decreased"}"#;
        assert!(parse_revision(long).is_err());

        let bad = r#"{"reply":"Ok.","adjusted_pick":"UNDER","confidence_change":"Lower"}"#;
        assert!(parse_revision(bad).is_err());
    }

    fn provider(api_key: Option<&str>, base_url: &str) -> OpenAiProvider {
        OpenAiProvider::new(InferenceConfig {
            api_key: api_key.map(str::to_string),
            base_url: base_url.to_string(),
            timeout: std::time::Duration::from_secs(2),
            ..InferenceConfig::default()
        })
        .expect("client should build")
    }

    fn request() -> CompletionRequest<'static> {
        CompletionRequest {
            system: prompt::INITIAL_SYSTEM,
            prompt: "{}",
            temperature: 0.0,
        }
    }

    #[test]
    fn missing_key_fails_before_any_request() {
        let err = provider(None, "http://127.0.0.1:1")
            .complete(&request())
            .expect_err("no key");
        assert_eq!(err.kind(), ErrorKind::MissingConfiguration);
    }

    #[test]
    fn unreachable_provider_is_model_output_invalid() {
        let err = provider(Some("sk-test"), "http://127.0.0.1:1")
            .complete(&request())
            .expect_err("connection refused");
        assert_eq!(err.kind(), ErrorKind::ModelOutputInvalid);
    }

    #[test]
    fn envelope_without_choices_is_rejected() {
        let err = completion_content(r#"{"choices":[]}"#).expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::ModelOutputInvalid);
        assert!(err.to_string().contains("no response from provider"));

        let blank = r#"{"choices":[{"message":{"content":"  "}}]}"#;
        assert!(completion_content(blank).is_err());
        assert!(completion_content("<html>").is_err());

        let ok = r#"{"choices":[{"message":{"content":"{\"pick\":\"OVER\"}"}}]}"#;
        assert_eq!(
            completion_content(ok).expect("content"),
            r#"{"pick":"OVER"}"#
        );
    }

    #[test]
    fn sentence_counter_ignores_decimals_and_abbreviations() {
        assert_eq!(count_sentences("He is at 24.5 tonight."), 1);
        assert_eq!(count_sentences("Gobert is OUT. Take the over!"), 2);
        assert_eq!(count_sentences("Edwards vs. Murray is the key"), 1);
        assert_eq!(count_sentences(""), 0);
    }

    #[test]
    fn leading_no_still_ends_a_sentence() {
        assert_eq!(count_sentences("No. The line is too high. Stay over."), 3);
        let raw = r#"{"reply":"No. The line is too high. Stay over.",
            "adjusted_pick":"OVER","confidence_change":"Same"}"#;
        assert!(parse_revision(raw).is_err());
    }
}
