//! One polling policy shared by every server-state watcher.
//!
//! A poller asks its [`PollSource`] for news since the last token, hands any
//! update to a [`PollObserver`], and lets [`PollPolicy`] decide when to ask
//! again. Battle status, auto-clicker sync and achievement checks are all the
//! same loop with different sources and cadences.

mod achievements;
mod auto_clicker;
mod battle;

pub use achievements::AchievementSource;
pub use auto_clicker::AutoClickerSource;
pub use battle::BattleSource;

use crate::config::ClickerConfig;
use crate::error::ClickerError;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::future::Future;

/// Which of the policy's idle delays applies after a quiet poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Fast,
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub fast_delay_ms: u32,
    pub slow_delay_ms: u32,
    pub error_backoff_ms: u32,
    pub cadence: Cadence,
}

/// What to do after a poll completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPoll {
    Immediately,
    After(u32),
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Updated { token: String, data: T },
    NoChange,
    Failed(ClickerError),
}

impl PollPolicy {
    /// Long-poll against the battle endpoint.
    pub fn battle(config: &ClickerConfig) -> Self {
        Self {
            fast_delay_ms: config.battle_poll_ms,
            slow_delay_ms: config.battle_poll_ms,
            error_backoff_ms: config.poll_error_backoff_ms,
            cadence: Cadence::Fast,
        }
    }

    pub fn auto_clicker_sync(config: &ClickerConfig) -> Self {
        Self::slow(config, config.auto_clicker_sync_ms)
    }

    pub fn achievements(config: &ClickerConfig) -> Self {
        Self::slow(config, config.achievement_check_ms)
    }

    /// Interval-style watcher: failures simply wait for the next round.
    fn slow(config: &ClickerConfig, interval_ms: u32) -> Self {
        Self {
            fast_delay_ms: config.battle_poll_ms,
            slow_delay_ms: interval_ms,
            error_backoff_ms: interval_ms.max(config.poll_error_backoff_ms),
            cadence: Cadence::Slow,
        }
    }

    pub fn idle_delay_ms(&self) -> u32 {
        match self.cadence {
            Cadence::Fast => self.fast_delay_ms,
            Cadence::Slow => self.slow_delay_ms,
        }
    }

    pub fn next_step<T>(&self, outcome: &PollOutcome<T>, terminal: bool) -> NextPoll {
        if terminal {
            return NextPoll::Stop;
        }
        match (outcome, self.cadence) {
            (PollOutcome::Updated { .. }, Cadence::Fast) => NextPoll::Immediately,
            (PollOutcome::Updated { .. }, Cadence::Slow) | (PollOutcome::NoChange, _) => {
                NextPoll::After(self.idle_delay_ms())
            }
            (PollOutcome::Failed(_), _) => NextPoll::After(self.error_backoff_ms),
        }
    }
}

/// Per-resource poll bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSession {
    resource_id: String,
    last_token: String,
    in_flight: bool,
    running: bool,
    polls: u64,
}

impl PollSession {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            ..Self::default()
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn last_token(&self) -> &str {
        &self.last_token
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Claim the request slot. `false` means a request is already out.
    pub fn try_begin(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        self.polls += 1;
        true
    }

    /// Release the request slot and advance the token on news.
    pub fn finish<T>(&mut self, outcome: &PollOutcome<T>) {
        self.in_flight = false;
        if let PollOutcome::Updated { token, .. } = outcome {
            self.last_token.clone_from(token);
        }
    }
}

/// Something that can be asked for news since a token.
#[allow(async_fn_in_trait)]
pub trait PollSource {
    type Data;

    async fn fetch(&mut self, last_token: &str) -> PollOutcome<Self::Data>;

    /// An update that ends polling for good.
    fn is_terminal(&self, _data: &Self::Data) -> bool {
        false
    }
}

/// Receives accepted updates. `finalize` runs once, after the terminal
/// update has been applied.
pub trait PollObserver<D> {
    fn apply(&mut self, data: &D);

    fn finalize(&mut self, _data: &D) {}
}

/// Why a poll loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    Finished,
    AlreadyRunning,
}

/// Single guarded request. Returns `None` when another request for the same
/// session is still in flight.
pub async fn poll_once<S: PollSource>(
    session: &RefCell<PollSession>,
    source: &mut S,
) -> Option<PollOutcome<S::Data>> {
    let token = {
        let mut s = session.borrow_mut();
        if !s.try_begin() {
            debug!("Poll for {} already in flight", s.resource_id());
            return None;
        }
        s.last_token().to_string()
    };
    let outcome = source.fetch(&token).await;
    session.borrow_mut().finish(&outcome);
    Some(outcome)
}

/// Poll until the source reports a terminal update. `sleep` is awaited
/// between rounds so the caller owns the clock.
pub async fn run_poll_loop<S, O, F, Fut>(
    session: &RefCell<PollSession>,
    policy: &PollPolicy,
    source: &mut S,
    observer: &mut O,
    mut sleep: F,
) -> PollExit
where
    S: PollSource,
    O: PollObserver<S::Data>,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ()>,
{
    {
        let mut s = session.borrow_mut();
        if s.running {
            debug!("Poller for {} already running", s.resource_id());
            return PollExit::AlreadyRunning;
        }
        s.running = true;
    }

    let resource = session.borrow().resource_id().to_string();
    info!("Polling {}", resource);

    loop {
        let Some(outcome) = poll_once(session, source).await else {
            // A one-off request holds the slot; wait it out and retry.
            sleep(policy.error_backoff_ms).await;
            continue;
        };

        let terminal = match &outcome {
            PollOutcome::Updated { data, .. } => {
                observer.apply(data);
                source.is_terminal(data)
            }
            PollOutcome::NoChange => false,
            PollOutcome::Failed(e) => {
                warn!("Poll for {} failed: {}", resource, e);
                false
            }
        };

        match policy.next_step(&outcome, terminal) {
            NextPoll::Stop => {
                if let PollOutcome::Updated { data, .. } = &outcome {
                    observer.finalize(data);
                }
                info!("Polling {} finished", resource);
                session.borrow_mut().running = false;
                return PollExit::Finished;
            }
            NextPoll::Immediately => {}
            NextPoll::After(ms) => sleep(ms).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::future::{ready, Ready};
    use std::collections::VecDeque;

    struct Script(VecDeque<PollOutcome<u32>>);

    impl PollSource for Script {
        type Data = u32;

        async fn fetch(&mut self, _last_token: &str) -> PollOutcome<u32> {
            self.0.pop_front().unwrap_or(PollOutcome::Updated {
                token: "end".into(),
                data: 0,
            })
        }

        fn is_terminal(&self, data: &u32) -> bool {
            *data == 0
        }
    }

    #[derive(Default)]
    struct Recorder {
        applied: Vec<u32>,
        finalized: Vec<u32>,
    }

    impl PollObserver<u32> for Recorder {
        fn apply(&mut self, data: &u32) {
            self.applied.push(*data);
        }

        fn finalize(&mut self, data: &u32) {
            self.finalized.push(*data);
        }
    }

    fn updated(token: &str, data: u32) -> PollOutcome<u32> {
        PollOutcome::Updated {
            token: token.into(),
            data,
        }
    }

    fn run(policy: PollPolicy, script: Vec<PollOutcome<u32>>) -> (Recorder, Vec<u32>, PollSession) {
        let session = RefCell::new(PollSession::new("test"));
        let mut source = Script(script.into());
        let mut recorder = Recorder::default();
        let mut sleeps = Vec::new();
        let exit = block_on(run_poll_loop(&session, &policy, &mut source, &mut recorder, |ms| -> Ready<()> {
            sleeps.push(ms);
            ready(())
        }));
        assert_eq!(exit, PollExit::Finished);
        (recorder, sleeps, session.into_inner())
    }

    #[test]
    fn fast_policy_repolls_at_once_after_news() {
        let policy = PollPolicy::battle(&ClickerConfig::default());
        let (recorder, sleeps, session) = run(policy, vec![updated("a", 1), updated("b", 2)]);
        assert_eq!(recorder.applied, vec![1, 2, 0]);
        assert_eq!(recorder.finalized, vec![0]);
        assert!(sleeps.is_empty());
        assert_eq!(session.last_token(), "end");
        assert!(!session.is_running());
    }

    #[test]
    fn no_change_waits_idle_delay() {
        let policy = PollPolicy::battle(&ClickerConfig::default());
        let (recorder, sleeps, _) = run(policy, vec![PollOutcome::NoChange]);
        assert_eq!(sleeps, vec![100]);
        assert_eq!(recorder.applied, vec![0]);
    }

    #[test]
    fn failures_back_off() {
        let policy = PollPolicy::battle(&ClickerConfig::default());
        let (_, sleeps, session) = run(
            policy,
            vec![
                PollOutcome::Failed(ClickerError::Network("down".into())),
                PollOutcome::Failed(ClickerError::HttpStatus(502)),
            ],
        );
        assert_eq!(sleeps, vec![1000, 1000]);
        assert_eq!(session.polls(), 3);
    }

    #[test]
    fn slow_policy_waits_after_news_too() {
        let policy = PollPolicy::achievements(&ClickerConfig::default());
        assert_eq!(policy.next_step(&updated("x", 1), false), NextPoll::After(30_000));
        assert_eq!(
            policy.next_step::<u32>(&PollOutcome::Failed(ClickerError::HttpStatus(500)), false),
            NextPoll::After(30_000)
        );
        assert_eq!(policy.next_step(&updated("x", 1), true), NextPoll::Stop);
    }

    #[test]
    fn in_flight_request_blocks_second_poll() {
        let session = RefCell::new(PollSession::new("battle-1"));
        assert!(session.borrow_mut().try_begin());
        let mut source = Script(VecDeque::new());
        assert_eq!(block_on(poll_once(&session, &mut source)), None);
        assert_eq!(session.borrow().polls(), 1);
    }

    #[test]
    fn running_loop_is_not_started_twice() {
        let session = RefCell::new(PollSession::new("battle-1"));
        session.borrow_mut().running = true;
        let mut source = Script(VecDeque::new());
        let mut recorder = Recorder::default();
        let exit = block_on(run_poll_loop(
            &session,
            &PollPolicy::battle(&ClickerConfig::default()),
            &mut source,
            &mut recorder,
            |_| ready(()),
        ));
        assert_eq!(exit, PollExit::AlreadyRunning);
        assert!(recorder.applied.is_empty());
    }

    #[test]
    fn loop_waits_for_a_one_off_request_to_land() {
        let session = RefCell::new(PollSession::new("battle-1"));
        assert!(session.borrow_mut().try_begin());
        let mut source = Script(VecDeque::new());
        let mut recorder = Recorder::default();
        let mut sleeps = Vec::new();
        let exit = block_on(run_poll_loop(
            &session,
            &PollPolicy::battle(&ClickerConfig::default()),
            &mut source,
            &mut recorder,
            |ms| {
                sleeps.push(ms);
                session.borrow_mut().finish::<u32>(&PollOutcome::NoChange);
                ready(())
            },
        ));
        assert_eq!(exit, PollExit::Finished);
        assert_eq!(sleeps, vec![1000]);
        assert_eq!(recorder.finalized, vec![0]);
        assert_eq!(session.borrow().polls(), 2);
        assert!(!session.borrow().is_running());
    }

    #[test]
    fn finish_keeps_token_on_quiet_polls() {
        let mut session = PollSession::new("r");
        session.try_begin();
        session.finish(&updated("t1", 1));
        session.try_begin();
        session.finish::<u32>(&PollOutcome::NoChange);
        assert_eq!(session.last_token(), "t1");
        assert!(!session.is_in_flight());
    }
}
