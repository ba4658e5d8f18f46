use tracing::{debug, info, warn};

use crate::context_assembly::PredictionContext;
use crate::entitlement::{EntitlementGate, Identity};
use crate::error::{PropError, Result};
use crate::inference::InferenceGateway;
use crate::state::{ChatTurn, PredictionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    AwaitingJudgment,
    Judged,
    Contested,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SessionEvent {
    Submit(Box<PredictionContext>),
    Judged(PredictionResult),
    JudgmentFailed,
    Contest,
    Revised(ChatTurn),
    RevisionFailed,
    Reset,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::Submit(_) => "submit",
            SessionEvent::Judged(_) => "judged",
            SessionEvent::JudgmentFailed => "judgment_failed",
            SessionEvent::Contest => "contest",
            SessionEvent::Revised(_) => "revised",
            SessionEvent::RevisionFailed => "revision_failed",
            SessionEvent::Reset => "reset",
        }
    }
}

/// Legal phase changes. `None` means the event is not allowed from `phase`.
pub(crate) fn next_phase(phase: SessionPhase, event: &SessionEvent) -> Option<SessionPhase> {
    use SessionPhase::*;
    match (phase, event) {
        (_, SessionEvent::Reset) => Some(Idle),
        (Idle, SessionEvent::Submit(_)) => Some(AwaitingJudgment),
        (AwaitingJudgment, SessionEvent::Judged(_)) => Some(Judged),
        (AwaitingJudgment, SessionEvent::JudgmentFailed) => Some(Idle),
        (Judged, SessionEvent::Contest) => Some(Contested),
        (Contested, SessionEvent::Revised(_)) => Some(Judged),
        (Contested, SessionEvent::RevisionFailed) => Some(Judged),
        _ => None,
    }
}

/// One analysis run: the context it was built from, the initial judgment,
/// and the debate transcript. The current judgment is always the initial
/// one replayed through the transcript.
#[derive(Debug, Default)]
pub struct Session {
    phase: SessionPhase,
    context: Option<PredictionContext>,
    judgment: Option<PredictionResult>,
    transcript: Vec<ChatTurn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn context(&self) -> Option<&PredictionContext> {
        self.context.as_ref()
    }

    pub fn initial_judgment(&self) -> Option<&PredictionResult> {
        self.judgment.as_ref()
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn current_result(&self) -> Option<PredictionResult> {
        let initial = self.judgment.as_ref()?;
        Some(
            self.transcript
                .iter()
                .fold(initial.clone(), |acc, turn| acc.revised(turn)),
        )
    }

    fn apply(&mut self, event: SessionEvent) -> Result<()> {
        let Some(next) = next_phase(self.phase, &event) else {
            return Err(PropError::InvalidState(format!(
                "cannot {} while {:?}",
                event.name(),
                self.phase
            )));
        };
        debug!(from = ?self.phase, to = ?next, event = event.name(), "session transition");
        match event {
            SessionEvent::Submit(ctx) => {
                self.context = Some(*ctx);
                self.judgment = None;
                self.transcript.clear();
            }
            SessionEvent::Judged(result) => self.judgment = Some(result),
            SessionEvent::JudgmentFailed | SessionEvent::Reset => {
                self.context = None;
                self.judgment = None;
                self.transcript.clear();
            }
            SessionEvent::Revised(turn) => self.transcript.push(turn),
            SessionEvent::Contest | SessionEvent::RevisionFailed => {}
        }
        self.phase = next;
        Ok(())
    }

    /// Discard everything and return to `Idle`.
    pub fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
        self.context = None;
        self.judgment = None;
        self.transcript.clear();
    }

    /// Start a new run. The gate is consulted first; a denial leaves the
    /// session exactly as it was. Any previous run is discarded once the
    /// call is allowed.
    pub fn run_analysis(
        &mut self,
        ctx: PredictionContext,
        identity: &Identity,
        gate: &EntitlementGate,
        gateway: &InferenceGateway,
    ) -> Result<PredictionResult> {
        gate.check(identity)?;
        self.reset();
        self.apply(SessionEvent::Submit(Box::new(ctx)))?;

        let outcome = match self.context.as_ref() {
            Some(ctx) => gateway.judge(ctx),
            None => Err(PropError::InvalidState("no context held".to_string())),
        };
        match outcome {
            Ok(result) => {
                info!(pick = result.pick.label(), confidence = result.confidence.label(), "judgment received");
                self.apply(SessionEvent::Judged(result.clone()))?;
                Ok(result)
            }
            Err(err) => {
                warn!("judgment failed: {err}");
                self.apply(SessionEvent::JudgmentFailed)?;
                Err(err)
            }
        }
    }

    /// Argue with the current judgment. Only valid once a judgment is held;
    /// on failure the judgment and transcript are left untouched.
    pub fn contest(
        &mut self,
        user_message: &str,
        identity: &Identity,
        gate: &EntitlementGate,
        gateway: &InferenceGateway,
    ) -> Result<ChatTurn> {
        if self.phase != SessionPhase::Judged {
            return Err(PropError::InvalidState(format!(
                "no judgment to contest while {:?}",
                self.phase
            )));
        }
        let message = user_message.trim();
        if message.is_empty() {
            return Err(PropError::InvalidInput("contest message is empty".to_string()));
        }
        gate.check(identity)?;

        let (Some(ctx), Some(current)) = (self.context.clone(), self.current_result()) else {
            return Err(PropError::InvalidState("judged session without a result".to_string()));
        };
        self.apply(SessionEvent::Contest)?;

        match gateway.revise(&ctx, &current, &self.transcript, message) {
            Ok(reply) => {
                let turn = ChatTurn {
                    user_message: message.to_string(),
                    reply: reply.reply,
                    adjusted_pick: reply.adjusted_pick,
                    confidence_delta: reply.confidence_delta,
                };
                if turn.adjusted_pick != current.pick {
                    info!(from = current.pick.label(), to = turn.adjusted_pick.label(), "pick revised");
                }
                self.apply(SessionEvent::Revised(turn.clone()))?;
                Ok(turn)
            }
            Err(err) => {
                warn!("revision failed: {err}");
                self.apply(SessionEvent::RevisionFailed)?;
                Err(err)
            }
        }
    }
}
