//! The thinker: generate -> record -> sleep, forever, feeding each thought
//! back in as the next prompt.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::SoulConfig;
use crate::error::SoulError;
use crate::llm::LanguageModel;
use crate::observer::ThoughtObserver;

/// Lifecycle of the think loop.
///
/// `start` moves Idle/Stopped to Running and spawns a loop, or turns a
/// pending Stopping back into Running without spawning. `stop` moves Running
/// to Stopping; the loop observes it at the next cycle boundary and settles
/// in Stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkerPhase {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Point-in-time view of the thinker for status endpoints.
#[derive(Debug, Clone)]
pub struct ThinkerStatus {
    pub phase: ThinkerPhase,
    pub running: bool,
    pub current_prompt: String,
    /// Cycles attempted, successful or not.
    pub cycles: u64,
    pub failures: u64,
    /// Unix timestamp of the last recorded thought.
    pub last_thought_at: Option<i64>,
}

struct ThinkerState {
    prompt: String,
    phase: ThinkerPhase,
    /// Bumped each time a loop is spawned; a finished loop only clears the
    /// phase it owns.
    run_id: u64,
    cycles: u64,
    failures: u64,
    last_thought_at: Option<i64>,
}

/// Chains model outputs into an unbounded sequence of thoughts.
pub struct Thinker {
    model: Arc<dyn LanguageModel>,
    observer: Arc<dyn ThoughtObserver>,
    system_prompt: String,
    think_interval: Duration,
    retry_interval: Duration,
    state: Mutex<ThinkerState>,
}

impl Thinker {
    /// Create an idle thinker seeded with `config.initial_prompt`.
    pub fn new(
        config: &SoulConfig,
        model: Arc<dyn LanguageModel>,
        observer: Arc<dyn ThoughtObserver>,
    ) -> Self {
        Self {
            model,
            observer,
            system_prompt: config.personality.clone(),
            think_interval: config.think_interval(),
            retry_interval: config.retry_interval(),
            state: Mutex::new(ThinkerState {
                prompt: config.initial_prompt.clone(),
                phase: ThinkerPhase::Idle,
                run_id: 0,
                cycles: 0,
                failures: 0,
                last_thought_at: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ThinkerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the think loop as a background tokio task.
    ///
    /// Returns the new task's handle, or `None` when a loop is already alive.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let run_id = {
            let mut state = self.state();
            match state.phase {
                ThinkerPhase::Running => return None,
                ThinkerPhase::Stopping => {
                    state.phase = ThinkerPhase::Running;
                    tracing::info!("Thinker stop cancelled, loop keeps running");
                    return None;
                }
                ThinkerPhase::Idle | ThinkerPhase::Stopped => {
                    state.phase = ThinkerPhase::Running;
                    state.run_id += 1;
                    state.run_id
                }
            }
        };

        let thinker = Arc::clone(self);
        Some(tokio::spawn(async move {
            thinker.run(run_id).await;
        }))
    }

    /// Ask the loop to stop at its next cycle boundary. Does not interrupt an
    /// in-flight model call or sleep.
    pub fn stop(&self) {
        let mut state = self.state();
        if state.phase == ThinkerPhase::Running {
            state.phase = ThinkerPhase::Stopping;
            tracing::info!("Thinker stop requested");
        }
    }

    pub fn is_running(&self) -> bool {
        self.state().phase == ThinkerPhase::Running
    }

    pub fn phase(&self) -> ThinkerPhase {
        self.state().phase
    }

    /// The prompt the next cycle will submit.
    pub fn current_prompt(&self) -> String {
        self.state().prompt.clone()
    }

    pub fn status(&self) -> ThinkerStatus {
        let state = self.state();
        ThinkerStatus {
            phase: state.phase,
            running: state.phase == ThinkerPhase::Running,
            current_prompt: state.prompt.clone(),
            cycles: state.cycles,
            failures: state.failures,
            last_thought_at: state.last_thought_at,
        }
    }

    async fn run(&self, run_id: u64) {
        let _guard = RunGuard {
            thinker: self,
            run_id,
        };
        tracing::info!(
            model = self.model.name(),
            think_interval_secs = self.think_interval.as_secs(),
            retry_interval_secs = self.retry_interval.as_secs(),
            "Thinker loop started"
        );

        while self.keep_running(run_id) {
            let delay = match self.cycle().await {
                Ok(_) => self.think_interval,
                Err(e) => {
                    tracing::warn!(error = %e, "Thought generation failed, retrying");
                    self.retry_interval
                }
            };
            tokio::time::sleep(delay).await;
        }

        tracing::info!("Thinker loop stopped");
    }

    /// Cycle-boundary check. Settles a pending stop into Stopped.
    fn keep_running(&self, run_id: u64) -> bool {
        let mut state = self.state();
        if state.run_id != run_id {
            return false;
        }
        match state.phase {
            ThinkerPhase::Running => true,
            ThinkerPhase::Stopping => {
                state.phase = ThinkerPhase::Stopped;
                false
            }
            ThinkerPhase::Idle | ThinkerPhase::Stopped => false,
        }
    }

    /// Run one generation cycle without sleeping.
    ///
    /// On success the observer has seen `(input, thought)` and the prompt is
    /// now `thought`. On failure neither has happened.
    pub async fn cycle(&self) -> Result<String, SoulError> {
        let result = self.generate().await;

        let mut state = self.state();
        state.cycles += 1;
        match &result {
            Ok(thought) => {
                state.prompt = thought.clone();
                state.last_thought_at = Some(chrono::Utc::now().timestamp());
            }
            Err(_) => state.failures += 1,
        }
        result
    }

    async fn generate(&self) -> Result<String, SoulError> {
        let input = self.current_prompt();

        let thought = self.model.complete(&self.system_prompt, &input).await?;
        if thought.trim().is_empty() {
            return Err(SoulError::Llm("empty completion".to_string()));
        }

        self.observer.on_thought(&input, &thought).await?;
        Ok(thought)
    }
}

/// Marks the loop's run as Stopped however the task ends, including abort.
struct RunGuard<'a> {
    thinker: &'a Thinker,
    run_id: u64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.thinker.state();
        if state.run_id == self.run_id {
            state.phase = ThinkerPhase::Stopped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ThoughtHistory;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Plays back a fixed script, then hangs forever.
    struct ScriptedModel {
        script: Mutex<VecDeque<Result<String, SoulError>>>,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(script: Vec<Result<&str, &str>>) -> Arc<Self> {
            let script = script
                .into_iter()
                .map(|r| r.map(str::to_string).map_err(|e| SoulError::Llm(e.into())))
                .collect();
            Arc::new(Self {
                script: Mutex::new(script),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LanguageModel for ScriptedModel {
        fn complete<'a>(
            &'a self,
            _system_prompt: &'a str,
            user_prompt: &'a str,
        ) -> BoxFuture<'a, Result<String, SoulError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(user_prompt.to_string());
            match self.script.lock().unwrap().pop_front() {
                Some(result) => futures::future::ready(result).boxed(),
                None => futures::future::pending().boxed(),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct RejectingObserver;

    impl ThoughtObserver for RejectingObserver {
        fn on_thought<'a>(
            &'a self,
            _input: &'a str,
            _thought: &'a str,
        ) -> BoxFuture<'a, Result<(), SoulError>> {
            futures::future::ready(Err(SoulError::Observer("store unavailable".into()))).boxed()
        }
    }

    fn config(seed: &str) -> SoulConfig {
        SoulConfig {
            initial_prompt: seed.to_string(),
            ..SoulConfig::default()
        }
    }

    fn thinker(
        seed: &str,
        model: &Arc<ScriptedModel>,
    ) -> (Arc<Thinker>, Arc<ThoughtHistory>) {
        let history = Arc::new(ThoughtHistory::new());
        let thinker = Arc::new(Thinker::new(&config(seed), model.clone(), history.clone()));
        (thinker, history)
    }

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test]
    async fn first_success_records_seed_as_input() {
        let model = ScriptedModel::new(vec![Ok("Y")]);
        let (thinker, history) = thinker("X", &model);

        let thought = thinker.cycle().await.unwrap();
        assert_eq!(thought, "Y");

        let record = history.latest().await.unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.input, "X");
        assert_eq!(record.thought, "Y");
        assert_eq!(thinker.current_prompt(), "Y");
    }

    #[tokio::test(start_paused = true)]
    async fn loop_chains_three_thoughts() {
        let model = ScriptedModel::new(vec![Ok("A"), Ok("B"), Ok("C")]);
        let (thinker, history) = thinker("seed", &model);

        thinker.start().unwrap();
        advance(3 * 600 + 1).await;

        let records = history.list_all().await;
        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        let inputs: Vec<&str> = records.iter().map(|r| r.input.as_str()).collect();
        let thoughts: Vec<&str> = records.iter().map(|r| r.thought.as_str()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(inputs, vec!["seed", "A", "B"]);
        assert_eq!(thoughts, vec!["A", "B", "C"]);

        // Fourth cycle is in flight with the latest thought as its prompt.
        assert_eq!(model.calls(), 4);
        assert_eq!(model.prompts.lock().unwrap()[3], "C");
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_prompt_and_retries_after_short_interval() {
        let model = ScriptedModel::new(vec![Err("rate limited"), Ok("Y")]);
        let (thinker, history) = thinker("X", &model);

        thinker.start().unwrap();
        advance(30).await;

        assert!(history.is_empty().await);
        assert_eq!(thinker.current_prompt(), "X");
        assert_eq!(thinker.status().failures, 1);
        assert!(thinker.is_running());

        advance(31).await;
        let record = history.latest().await.unwrap();
        assert_eq!((record.id, record.input.as_str()), (1, "X"));
        assert_eq!(thinker.current_prompt(), "Y");

        let status = thinker.status();
        assert_eq!((status.cycles, status.failures), (2, 1));
        assert!(status.last_thought_at.is_some());
    }

    #[tokio::test]
    async fn empty_completion_counts_as_failure() {
        let model = ScriptedModel::new(vec![Ok("  \n")]);
        let (thinker, history) = thinker("X", &model);

        let err = thinker.cycle().await.unwrap_err();
        assert!(matches!(err, SoulError::Llm(_)));
        assert!(history.is_empty().await);
        assert_eq!(thinker.current_prompt(), "X");
    }

    #[tokio::test]
    async fn observer_failure_leaves_prompt_unchanged() {
        let model = ScriptedModel::new(vec![Ok("Y")]);
        let thinker = Thinker::new(&config("X"), model.clone(), Arc::new(RejectingObserver));

        let err = thinker.cycle().await.unwrap_err();
        assert!(matches!(err, SoulError::Observer(_)));
        assert_eq!(thinker.current_prompt(), "X");
        assert_eq!(thinker.status().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_running_is_a_no_op() {
        let model = ScriptedModel::new(vec![Ok("A"), Ok("B")]);
        let (thinker, history) = thinker("seed", &model);

        assert!(thinker.start().is_some());
        assert!(thinker.start().is_none());
        assert!(thinker.start().is_none());
        advance(1).await;

        assert_eq!(model.calls(), 1);
        assert_eq!(history.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_takes_effect_at_cycle_boundary() {
        let model = ScriptedModel::new(vec![Ok("A"), Ok("B")]);
        let (thinker, history) = thinker("seed", &model);

        let handle = thinker.start().unwrap();
        advance(1).await;
        thinker.stop();

        assert_eq!(thinker.phase(), ThinkerPhase::Stopping);
        assert!(!thinker.is_running());

        advance(600).await;
        handle.await.unwrap();
        assert_eq!(thinker.phase(), ThinkerPhase::Stopped);
        assert_eq!(model.calls(), 1);
        assert_eq!(history.len().await, 1);

        // A stopped thinker can be started again and resumes from its prompt.
        thinker.start().unwrap();
        advance(1).await;
        assert_eq!(model.calls(), 2);
        assert_eq!(model.prompts.lock().unwrap()[1], "A");
    }

    #[tokio::test(start_paused = true)]
    async fn start_during_stopping_keeps_the_same_loop() {
        let model = ScriptedModel::new(vec![Ok("A"), Ok("B")]);
        let (thinker, _history) = thinker("seed", &model);

        thinker.start().unwrap();
        advance(1).await;
        thinker.stop();
        assert!(thinker.start().is_none());
        assert_eq!(thinker.phase(), ThinkerPhase::Running);

        advance(600).await;
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_loop_clears_running_flag() {
        let model = ScriptedModel::new(vec![]);
        let (thinker, _history) = thinker("seed", &model);

        let handle = thinker.start().unwrap();
        advance(1).await;
        assert!(thinker.is_running());

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert_eq!(thinker.phase(), ThinkerPhase::Stopped);
        assert!(!thinker.is_running());
    }

    #[test]
    fn new_thinker_is_idle_with_seed_prompt() {
        let model = ScriptedModel::new(vec![]);
        let (thinker, _history) = thinker("seed", &model);
        let status = thinker.status();
        assert_eq!(status.phase, ThinkerPhase::Idle);
        assert!(!status.running);
        assert_eq!(status.current_prompt, "seed");
        assert_eq!(status.cycles, 0);
    }
}
