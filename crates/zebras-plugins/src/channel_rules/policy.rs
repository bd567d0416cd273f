//! Posting rules evaluated against a channel policy.

use async_trait::async_trait;
use zebras_core::{BoxError, Envelope, Rule, RuleEngine, Verdict};
use zebras_framework::store::ChannelPolicy;

/// What the posting rules see besides the message itself.
#[derive(Debug, Clone)]
pub struct PostContext {
    pub policy: ChannelPolicy,
}

/// Denies bot posts where bots are not allowed.
pub struct BotPostRule;

#[async_trait]
impl Rule<PostContext> for BotPostRule {
    fn name(&self) -> &str {
        "bots"
    }

    async fn evaluate(&self, ctx: &PostContext, envelope: &Envelope) -> Result<Verdict, BoxError> {
        if envelope.is_bot_message() && !ctx.policy.allow_bots {
            return Ok(Verdict::deny("Bot posts are not allowed in this channel."));
        }
        Ok(Verdict::neutral())
    }
}

/// Denies new top-level messages where only threads are allowed.
pub struct TopLevelPostRule;

#[async_trait]
impl Rule<PostContext> for TopLevelPostRule {
    fn name(&self) -> &str {
        "top_level"
    }

    async fn evaluate(&self, ctx: &PostContext, envelope: &Envelope) -> Result<Verdict, BoxError> {
        if !envelope.is_thread_reply() && !ctx.policy.allow_top_level_posts {
            return Ok(Verdict::deny(
                "Top-level posts are disabled in this channel. Please reply in a thread.",
            ));
        }
        Ok(Verdict::neutral())
    }
}

/// Denies thread replies where threads are disabled.
pub struct ThreadReplyRule;

#[async_trait]
impl Rule<PostContext> for ThreadReplyRule {
    fn name(&self) -> &str {
        "thread_replies"
    }

    async fn evaluate(&self, ctx: &PostContext, envelope: &Envelope) -> Result<Verdict, BoxError> {
        if envelope.is_thread_reply() && !ctx.policy.allow_thread_replies {
            return Ok(Verdict::deny("Thread replies are disabled in this channel."));
        }
        Ok(Verdict::neutral())
    }
}

/// The posting rules in evaluation order.
pub fn post_rules() -> RuleEngine<PostContext> {
    RuleEngine::new()
        .with(BotPostRule)
        .with(TopLevelPostRule)
        .with(ThreadReplyRule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zebras_core::Decision;

    fn ctx(top: bool, threads: bool, bots: bool) -> PostContext {
        PostContext {
            policy: ChannelPolicy {
                channel_id: "C1".into(),
                allow_top_level_posts: top,
                allow_thread_replies: threads,
                allow_bots: bots,
            },
        }
    }

    fn post(extra: serde_json::Value) -> Envelope {
        let mut event = json!({ "type": "message", "channel": "C1", "user": "U1", "ts": "2.0" });
        if let (Some(event), Some(extra)) = (event.as_object_mut(), extra.as_object()) {
            event.extend(extra.clone());
        }
        Envelope::new(json!({ "type": "event_callback", "event": event }))
    }

    #[tokio::test]
    async fn test_permissive_policy_is_neutral() {
        let engine = post_rules();
        assert_eq!(engine.rule_names(), vec!["bots", "top_level", "thread_replies"]);

        let verdict = engine.evaluate(&ctx(true, true, true), &post(json!({}))).await.unwrap();
        assert_eq!(verdict, Verdict::neutral());
    }

    #[tokio::test]
    async fn test_top_level_denied_but_thread_reply_allowed() {
        let engine = post_rules();
        let policy = ctx(false, true, true);

        let top = engine.evaluate(&policy, &post(json!({}))).await.unwrap();
        assert_eq!(top.decision, Decision::Deny);
        assert!(top.reason.unwrap().contains("Top-level"));

        let reply = engine
            .evaluate(&policy, &post(json!({ "thread_ts": "1.0" })))
            .await
            .unwrap();
        assert_eq!(reply.decision, Decision::Neutral);
    }

    #[tokio::test]
    async fn test_thread_replies_denied() {
        let verdict = post_rules()
            .evaluate(&ctx(true, false, true), &post(json!({ "thread_ts": "1.0" })))
            .await
            .unwrap();
        assert!(verdict.is_denied());
        assert!(verdict.reason.unwrap().contains("Thread replies"));
    }

    #[tokio::test]
    async fn test_bot_rule_wins_first() {
        let verdict = post_rules()
            .evaluate(&ctx(false, true, false), &post(json!({ "bot_id": "B1" })))
            .await
            .unwrap();
        assert_eq!(verdict.reason.as_deref(), Some("Bot posts are not allowed in this channel."));
    }
}
