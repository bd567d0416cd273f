//! Ordered, deny-precedent policy evaluation.
//!
//! A [`RuleEngine`] folds the verdicts of its rules into one:
//!
//! 1. start from `Neutral` with no reason
//! 2. the first `Deny` is returned immediately; later rules never run
//! 3. an `Allow` replaces the running verdict (reasons are not merged)
//! 4. after the last rule, the running verdict is returned
//!
//! Rules are evaluated against a caller-defined context `C` (for example the
//! channel policy loaded for the current message) and the envelope.
//!
//! A failing rule is not isolated: its error stops evaluation and reaches the
//! caller as a [`RuleError`] naming the rule.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::foundation::envelope::Envelope;
use crate::foundation::error::{BoxError, RuleError};

/// Outcome of a single rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
    #[default]
    Neutral,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Neutral => "neutral",
        })
    }
}

/// A decision with an optional human-readable reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verdict {
    /// `Neutral` with no reason.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Allow,
            reason: Some(reason.into()),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Deny,
            reason: Some(reason.into()),
        }
    }

    /// A decision without a reason.
    pub fn bare(decision: Decision) -> Self {
        Self {
            decision,
            reason: None,
        }
    }

    pub fn is_denied(&self) -> bool {
        self.decision == Decision::Deny
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allow
    }
}

/// A single policy check.
///
/// Rules keep no state tied to the engine; side effects of a verdict (deleting
/// a message, auditing) belong to whoever consumes it.
#[async_trait]
pub trait Rule<C: ?Sized + Sync>: Send + Sync {
    /// Identity used in traces and in [`RuleError`].
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn evaluate(&self, context: &C, envelope: &Envelope) -> Result<Verdict, BoxError>;
}

/// An ordered list of rules.
pub struct RuleEngine<C: ?Sized + Sync> {
    rules: Vec<Box<dyn Rule<C>>>,
}

impl<C: ?Sized + Sync> Default for RuleEngine<C> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<C: ?Sized + Sync> RuleEngine<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule; rules run in the order they were added.
    pub fn add(&mut self, rule: impl Rule<C> + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, rule: impl Rule<C> + 'static) -> Self {
        self.add(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names of the rules in evaluation order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Evaluates every rule in order with deny precedence.
    pub async fn evaluate(&self, context: &C, envelope: &Envelope) -> Result<Verdict, RuleError> {
        let mut verdict = Verdict::neutral();

        for rule in &self.rules {
            let result = rule
                .evaluate(context, envelope)
                .await
                .map_err(|e| RuleError::new(rule.name(), e))?;

            trace!(rule = rule.name(), decision = %result.decision, reason = ?result.reason, "Rule evaluated");

            match result.decision {
                Decision::Deny => return Ok(result),
                Decision::Allow => verdict = result,
                Decision::Neutral => {}
            }
        }

        Ok(verdict)
    }
}
