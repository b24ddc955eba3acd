use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{MessagingCapabilities, TextFormat},
    },
    Result,
};

/// Per-chat limiters kept before idle ones are dropped.
const MAX_TRACKED_CHATS: usize = 1024;

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* Telegram API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between calls per chat (Telegram 1 msg/sec style limits).
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve_at(&mut self, now: Instant) -> Duration {
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }

    fn reserve(&mut self) -> Duration {
        self.reserve_at(Instant::now())
    }
}

type ChatLimiters = HashMap<i64, Arc<Mutex<IntervalLimiter>>>;

/// Drop limiters whose next slot is already free; they would not delay anything.
/// Limiters currently locked by a caller are kept.
fn prune_idle(map: &mut ChatLimiters, now: Instant) {
    map.retain(|_, lim| lim.try_lock().map_or(true, |l| l.next > now));
}

/// MessagingPort decorator that rate-limits outbound calls.
///
/// Batch replies, notification pushes from the backend and reminder edits can
/// land on the same chat in bursts; spacing them keeps Telegram 429s rare.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<ChatLimiters>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_chat(&self, chat_id: i64) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_chat.lock().await;
        if map.len() >= MAX_TRACKED_CHATS && !map.contains_key(&chat_id) {
            prune_idle(&mut map, Instant::now());
        }
        map.entry(chat_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_chat_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle_chat(&self, chat_id: i64) {
        let global_wait = { self.global.lock().await.reserve() };
        let chat_wait = {
            let lim = self.limiter_for_chat(chat_id).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = global_wait.max(chat_wait);
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }

    async fn throttle_global(&self) {
        let wait = { self.global.lock().await.reserve() };
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id.0).await;
        self.inner.send_text(chat_id, text, format).await
    }

    async fn edit_text(&self, msg: MessageRef, text: &str, format: TextFormat) -> Result<()> {
        self.throttle_chat(msg.chat_id.0).await;
        self.inner.edit_text(msg, text, format).await
    }

    async fn set_reaction(&self, msg: MessageRef, emoji: &str) -> Result<()> {
        self.throttle_chat(msg.chat_id.0).await;
        self.inner.set_reaction(msg, emoji).await
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        // No chat_id available here; apply global throttling only.
        self.throttle_global().await;
        self.inner.answer_callback_query(callback_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_spaces_consecutive_reservations() {
        let mut lim = IntervalLimiter::new(Duration::from_millis(100));
        let now = lim.next;

        assert_eq!(lim.reserve_at(now), Duration::ZERO);
        assert_eq!(lim.reserve_at(now), Duration::from_millis(100));
        assert_eq!(lim.reserve_at(now), Duration::from_millis(200));

        // Once the slot has passed there is no wait.
        assert_eq!(
            lim.reserve_at(now + Duration::from_secs(1)),
            Duration::ZERO
        );
    }

    #[test]
    fn idle_chat_limiters_are_pruned() {
        let now = Instant::now();
        let interval = Duration::from_millis(100);

        let mut idle = IntervalLimiter::new(interval);
        idle.next = now;
        let mut busy = IntervalLimiter::new(interval);
        busy.next = now + interval;

        let mut map = ChatLimiters::new();
        map.insert(1, Arc::new(Mutex::new(idle)));
        map.insert(2, Arc::new(Mutex::new(busy)));

        prune_idle(&mut map, now);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![2]);
    }
}
