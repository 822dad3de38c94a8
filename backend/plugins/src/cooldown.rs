//! Command cooldowns: per-command, per-user token buckets.
//!
//! An exhausted bucket stops the invocation without a reply. Expired buckets are
//! swept at most once per window from inside `check`.

use async_trait::async_trait;
use patto_commands::{CommandContext, Flow, Plugin};
use patto_core::CommandResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Cooldown policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CooldownPolicy {
    /// Invocations allowed per window.
    pub max_uses: u32,
    /// Window duration in seconds.
    pub window_secs: u64,
    /// If true, each user has their own bucket; otherwise one bucket per command.
    pub per_user: bool,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            max_uses: 3,
            window_secs: 10,
            per_user: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CooldownResult {
    pub allowed: bool,
    /// Seconds until the bucket refills.
    pub reset_in_secs: u64,
    pub remaining: u32,
}

/// Command key plus the user id when buckets are per user.
type BucketKey = (String, Option<u64>);

struct Bucket {
    used: u32,
    opened_at: Instant,
}

impl Bucket {
    fn open(now: Instant) -> Self {
        Self { used: 0, opened_at: now }
    }

    fn expired(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.opened_at) >= window
    }

    /// Refill if the window has passed, then try to consume one use.
    fn take(&mut self, now: Instant, window: Duration, max_uses: u32) -> CooldownResult {
        if self.expired(now, window) {
            *self = Self::open(now);
        }
        let reset_in_secs = (self.opened_at + window).saturating_duration_since(now).as_secs();
        let allowed = self.used < max_uses;
        if allowed {
            self.used += 1;
        }
        CooldownResult { allowed, reset_in_secs, remaining: max_uses.saturating_sub(self.used) }
    }
}

struct Buckets {
    map: HashMap<BucketKey, Bucket>,
    last_sweep: Instant,
}

impl Buckets {
    fn sweep(&mut self, now: Instant, window: Duration) {
        let before = self.map.len();
        self.map.retain(|_, bucket| !bucket.expired(now, window));
        self.last_sweep = now;
        let dropped = before - self.map.len();
        if dropped > 0 {
            debug!(dropped, remaining = self.map.len(), "[Cooldown] Swept expired buckets");
        }
    }
}

pub struct CooldownPlugin {
    policy: CooldownPolicy,
    buckets: Mutex<Buckets>,
}

impl CooldownPlugin {
    pub fn new(policy: CooldownPolicy) -> Self {
        let buckets = Buckets { map: HashMap::new(), last_sweep: Instant::now() };
        Self { policy, buckets: Mutex::new(buckets) }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.policy.window_secs)
    }

    /// Consume one use for a (command, user) pair.
    pub async fn check(&self, command: &str, user_id: u64) -> CooldownResult {
        let key: BucketKey = (command.to_string(), self.policy.per_user.then_some(user_id));
        let (now, window) = (Instant::now(), self.window());

        let mut buckets = self.buckets.lock().await;
        if now.duration_since(buckets.last_sweep) >= window {
            buckets.sweep(now, window);
        }
        let result = buckets
            .map
            .entry(key)
            .or_insert_with(|| Bucket::open(now))
            .take(now, window, self.policy.max_uses);

        if result.allowed {
            debug!(command, user_id, remaining = result.remaining, "[Cooldown] Allowed");
        } else {
            debug!(command, user_id, reset_in_secs = result.reset_in_secs, "[Cooldown] Denied");
        }
        result
    }

    /// Forget buckets whose window has passed.
    pub async fn cleanup(&self) {
        let (now, window) = (Instant::now(), self.window());
        self.buckets.lock().await.sweep(now, window);
    }

    pub async fn tracked(&self) -> usize {
        self.buckets.lock().await.map.len()
    }
}

#[async_trait]
impl Plugin for CooldownPlugin {
    fn name(&self) -> &str {
        "cooldown"
    }

    async fn before_execute(&self, ctx: &CommandContext) -> CommandResult<Flow> {
        let result = self.check(&ctx.entry().key, ctx.user().id).await;
        Ok(if result.allowed { Flow::Continue } else { Flow::Stop })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context_for, guarded_registry, member_invoker};
    use patto_core::{BufferedResponder, Permissions};

    #[tokio::test]
    async fn limits_after_max() {
        let plugin = CooldownPlugin::new(CooldownPolicy { max_uses: 2, window_secs: 60, per_user: true });
        assert!(plugin.check("ping", 1).await.allowed);
        assert!(plugin.check("ping", 1).await.allowed);
        let third = plugin.check("ping", 1).await;
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
    }

    #[tokio::test]
    async fn users_and_commands_have_separate_buckets() {
        let plugin = CooldownPlugin::new(CooldownPolicy { max_uses: 1, window_secs: 60, per_user: true });
        assert!(plugin.check("ping", 1).await.allowed);
        assert!(plugin.check("ping", 2).await.allowed);
        assert!(plugin.check("help", 1).await.allowed);
        assert_eq!(plugin.tracked().await, 3);
    }

    #[tokio::test]
    async fn shared_bucket_when_not_per_user() {
        let plugin = CooldownPlugin::new(CooldownPolicy { max_uses: 1, window_secs: 60, per_user: false });
        assert!(plugin.check("ping", 1).await.allowed);
        assert!(!plugin.check("ping", 2).await.allowed);
    }

    #[tokio::test]
    async fn zero_window_never_blocks_and_cleans_up() {
        let plugin = CooldownPlugin::new(CooldownPolicy { max_uses: 1, window_secs: 0, per_user: true });
        assert!(plugin.check("ping", 1).await.allowed);
        assert!(plugin.check("ping", 1).await.allowed);
        plugin.cleanup().await;
        assert_eq!(plugin.tracked().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn check_sweeps_expired_buckets() {
        let plugin = CooldownPlugin::new(CooldownPolicy { max_uses: 1, window_secs: 10, per_user: true });
        assert!(plugin.check("ping", 1).await.allowed);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(plugin.check("ping", 2).await.allowed);
        assert_eq!(plugin.tracked().await, 2);

        // User 1's window has closed; user 2's is still open.
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(!plugin.check("ping", 2).await.allowed);
        assert_eq!(plugin.tracked().await, 1);
    }

    #[tokio::test]
    async fn exhausted_bucket_stops_silently() {
        let registry = std::sync::Arc::new(guarded_registry(Permissions::NONE));
        let responder = std::sync::Arc::new(BufferedResponder::new());
        let ctx = context_for(&registry, member_invoker(Permissions::NONE), responder.clone());
        let plugin = CooldownPlugin::new(CooldownPolicy { max_uses: 1, window_secs: 60, per_user: true });

        assert_eq!(plugin.before_execute(&ctx).await.unwrap(), Flow::Continue);
        assert_eq!(plugin.before_execute(&ctx).await.unwrap(), Flow::Stop);
        assert!(responder.is_empty());
    }
}
