use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, warn};

use crate::error::{PropError, Result};

pub const PRO_PLAN: &str = "pro";
pub const DEFAULT_TRIAL_HOURS: u64 = 24;

/// Who is asking. Issued by the identity provider; the gate only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub plan: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(
        user_id: impl Into<String>,
        plan: Option<&str>,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            user_id: Some(user_id.into()),
            plan: plan.map(str::to_string),
            created_at,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn is_pro(&self) -> bool {
        self.plan.as_deref() == Some(PRO_PLAN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    ProOnly,
    ProOrTrial { trial_hours: u64 },
}

type PolicyFn = dyn Fn(&Identity, DateTime<Utc>) -> bool + Send + Sync;
type ClockFn = dyn Fn() -> DateTime<Utc> + Send + Sync;

/// The one place that decides whether an inference call may run.
pub struct EntitlementGate {
    policy: Box<PolicyFn>,
    clock: Box<ClockFn>,
}

impl std::fmt::Debug for EntitlementGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementGate").finish_non_exhaustive()
    }
}

impl EntitlementGate {
    pub fn new(policy: impl Fn(&Identity, DateTime<Utc>) -> bool + Send + Sync + 'static) -> Self {
        Self {
            policy: Box::new(policy),
            clock: Box::new(Utc::now),
        }
    }

    pub fn from_kind(kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::ProOnly => Self::new(|id, _| id.is_signed_in() && id.is_pro()),
            PolicyKind::ProOrTrial { trial_hours } => {
                let window = trial_window(trial_hours);
                Self::new(move |id, now| {
                    if !id.is_signed_in() {
                        return false;
                    }
                    id.is_pro() || id.created_at.is_some_and(|created| now - created < window)
                })
            }
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn is_allowed(&self, identity: &Identity) -> bool {
        (self.policy)(identity, (self.clock)())
    }

    pub fn check(&self, identity: &Identity) -> Result<()> {
        if self.is_allowed(identity) {
            Ok(())
        } else {
            info!(user = identity.user_id.as_deref().unwrap_or("anonymous"), "entitlement denied");
            Err(PropError::EntitlementDenied)
        }
    }
}

/// Trial length as a duration. Values chrono cannot represent fall back to
/// [`DEFAULT_TRIAL_HOURS`].
fn trial_window(hours: u64) -> TimeDelta {
    match i64::try_from(hours).ok().and_then(TimeDelta::try_hours) {
        Some(window) => window,
        None => {
            warn!(hours, default = DEFAULT_TRIAL_HOURS, "trial window out of range; using default");
            TimeDelta::hours(DEFAULT_TRIAL_HOURS as i64)
        }
    }
}
