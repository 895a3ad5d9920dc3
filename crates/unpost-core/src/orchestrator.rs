//! The run loop.
//!
//! ```text
//! Discovering ──► Deciding ──► Acting ──► Checkpointing ──┐
//!      ▲                                                  │
//!      └──────────────────────────────────────────────────┘
//! terminal: Exhausted | CapReached | BudgetStopped | FatalError
//! ```
//!
//! One item is carried all the way through before the next one starts.
//! Items already in the checkpoint are counted as skipped without touching
//! the executor. Every settled item is persisted before moving on, so a
//! stop at any point leaves a checkpoint that is safe to resume from.

use crate::checkpoint::{CheckpointState, CheckpointStore};
use crate::executor::{ActionExecutor, ActionOutcome, Classification, ExecutorError};
use crate::source::{ContentSource, SourceError};
use crate::types::{CandidateItem, RunMode};
use serde::Serialize;
use std::time::Instant;

// ---------------------------------------------------------------------------
// Options / stats / report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Maximum number of items acted on (or, in dry mode, classified) in
    /// this run. `None` means no cap.
    pub max_items: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub processed: u64,
    pub deleted: u64,
    pub unreposted: u64,
    pub skipped: u64,
    pub errors: u64,
    pub retries: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Exhausted,
    CapReached,
    BudgetStopped { reason: String },
    FatalError { message: String },
}

impl RunState {
    pub fn label(&self) -> &'static str {
        match self {
            RunState::Exhausted => "exhausted",
            RunState::CapReached => "cap_reached",
            RunState::BudgetStopped { .. } => "budget_stopped",
            RunState::FatalError { .. } => "fatal_error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    #[serde(flatten)]
    pub state: RunState,
    pub stats: RunStats,
    pub elapsed_ms: u64,
    /// Size of the processed-id set at the end of the run.
    pub checkpointed: usize,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    source: Box<dyn ContentSource>,
    executor: Box<dyn ActionExecutor>,
    store: CheckpointStore,
    checkpoint: CheckpointState,
    options: RunOptions,
    stats: RunStats,
    attempted: u64,
    /// Set once any batch leaves an item unsettled; the stored cursor must
    /// not move past that batch for the rest of the run.
    cursor_pinned: bool,
}

enum Flow {
    Continue,
    Stop(RunState),
}

impl Orchestrator {
    pub fn new(
        source: Box<dyn ContentSource>,
        executor: Box<dyn ActionExecutor>,
        store: CheckpointStore,
        checkpoint: CheckpointState,
        options: RunOptions,
    ) -> Self {
        Self {
            source,
            executor,
            store,
            checkpoint,
            options,
            stats: RunStats::default(),
            attempted: 0,
            cursor_pinned: false,
        }
    }

    pub async fn run(mut self) -> RunReport {
        let started = Instant::now();
        tracing::info!(
            mode = ?self.options.mode,
            max_items = ?self.options.max_items,
            already_processed = self.checkpoint.len(),
            "Run started"
        );

        let state = self.drive().await;

        let report = RunReport {
            mode: self.options.mode,
            state,
            stats: self.stats,
            elapsed_ms: started.elapsed().as_millis() as u64,
            checkpointed: self.checkpoint.len(),
        };
        tracing::info!(
            state = report.state.label(),
            processed = report.stats.processed,
            deleted = report.stats.deleted,
            unreposted = report.stats.unreposted,
            skipped = report.stats.skipped,
            errors = report.stats.errors,
            retries = report.stats.retries,
            elapsed_ms = report.elapsed_ms,
            "Run finished"
        );
        report
    }

    async fn drive(&mut self) -> RunState {
        loop {
            let batch = match self.source.next_batch().await {
                Ok(batch) => batch,
                Err(SourceError::Exhausted) => return self.finish(RunState::Exhausted),
                Err(SourceError::Unavailable(reason)) => {
                    tracing::warn!(reason = %reason, "Source unavailable, stopping run");
                    return self.finish(RunState::BudgetStopped { reason });
                }
                Err(SourceError::Unexpected(message)) => {
                    tracing::error!(error = %message, "Source failed");
                    return RunState::FatalError { message };
                }
            };

            if batch.items.is_empty() && (batch.exhausted || self.source.cursor().is_none()) {
                tracing::info!("No new items discovered");
                return self.finish(RunState::Exhausted);
            }

            let mut settled_all = true;
            for item in &batch.items {
                if self.checkpoint.contains(&item.id) {
                    self.stats.processed += 1;
                    self.stats.skipped += 1;
                    tracing::debug!(item_id = %item.id, "Already processed, skipping");
                    continue;
                }
                if self.cap_reached() {
                    return self.finish(RunState::CapReached);
                }

                match self.handle(item, &mut settled_all).await {
                    Flow::Continue => {}
                    Flow::Stop(state) => return state,
                }

                if self.cap_reached() {
                    tracing::info!(attempted = self.attempted, "Item cap reached");
                    return self.finish(RunState::CapReached);
                }
            }

            if let Flow::Stop(state) = self.advance_cursor(settled_all) {
                return state;
            }
            if batch.exhausted {
                return self.finish(RunState::Exhausted);
            }
        }
    }

    /// Decide, act and checkpoint a single item that is not yet settled.
    async fn handle(&mut self, item: &CandidateItem, settled_all: &mut bool) -> Flow {
        let class = self.executor.classify(item);

        if self.options.mode.is_dry() {
            self.attempted += 1;
            self.stats.processed += 1;
            match class {
                Classification::Original => self.stats.deleted += 1,
                Classification::RetractionOfRepost { .. } => self.stats.unreposted += 1,
            }
            tracing::info!(item_id = %item.id, ?class, "Dry run: would retract");
            return Flow::Continue;
        }

        let report = match self.executor.act(item).await {
            Ok(report) => report,
            Err(ExecutorError::Quota(q)) => {
                tracing::warn!(item_id = %item.id, error = %q, "Quota exhausted, stopping run");
                return Flow::Stop(self.finish(RunState::BudgetStopped {
                    reason: q.to_string(),
                }));
            }
            Err(ExecutorError::Unexpected(message)) => {
                tracing::error!(item_id = %item.id, error = %message, "Executor failed");
                return Flow::Stop(RunState::FatalError { message });
            }
        };
        self.stats.retries += u64::from(report.retries);

        let settled = match &report.outcome {
            ActionOutcome::Deleted => {
                self.stats.deleted += 1;
                true
            }
            ActionOutcome::Unreposted => {
                self.stats.unreposted += 1;
                true
            }
            ActionOutcome::AlreadyGone | ActionOutcome::Skipped { .. } => {
                self.stats.skipped += 1;
                true
            }
            ActionOutcome::Failed { reason } => {
                tracing::warn!(item_id = %item.id, reason = %reason, "Action not confirmed");
                self.stats.errors += 1;
                *settled_all = false;
                false
            }
            ActionOutcome::RateLimited { detail } => {
                tracing::warn!(item_id = %item.id, detail = %detail, "Rate limited, stopping run");
                return Flow::Stop(self.finish(RunState::BudgetStopped {
                    reason: format!("rate limited: {detail}"),
                }));
            }
        };
        self.attempted += 1;
        self.stats.processed += 1;
        tracing::info!(item_id = %item.id, outcome = ?report.outcome, "Item processed");

        if settled {
            self.checkpoint.insert(item.id.clone());
            if let Err(e) = self.store.save(&self.checkpoint) {
                return Flow::Stop(RunState::FatalError {
                    message: format!("failed to save checkpoint: {e}"),
                });
            }
        }
        Flow::Continue
    }

    fn advance_cursor(&mut self, settled_all: bool) -> Flow {
        if self.options.mode.is_dry() {
            return Flow::Continue;
        }
        self.cursor_pinned |= !settled_all;
        if self.cursor_pinned {
            return Flow::Continue;
        }
        let next = self.source.cursor().map(str::to_string);
        if next.as_deref() == self.checkpoint.cursor() {
            return Flow::Continue;
        }
        tracing::debug!(cursor = ?next, "Advancing checkpoint cursor");
        self.checkpoint.set_cursor(next);
        match self.store.save(&self.checkpoint) {
            Ok(()) => Flow::Continue,
            Err(e) => Flow::Stop(RunState::FatalError {
                message: format!("failed to save checkpoint: {e}"),
            }),
        }
    }

    fn cap_reached(&self) -> bool {
        self.options
            .max_items
            .is_some_and(|max| self.attempted >= max)
    }

    /// Persist the final state (never in dry mode) and enter `state`.
    fn finish(&mut self, state: RunState) -> RunState {
        if self.options.mode.is_dry() {
            return state;
        }
        match self.store.save(&self.checkpoint) {
            Ok(()) => state,
            Err(e) => RunState::FatalError {
                message: format!("failed to save checkpoint: {e}"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ActionReport;
    use crate::source::{Batch, DiscoveryOptions, DiscoverySource};
    use crate::ui::fake::{entry, FakePage};
    use crate::ui::Pacer;
    use crate::usage::QuotaExceeded;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    // -- fakes ---------------------------------------------------------------

    /// Pages addressed by cursor `p{index}`; the first page has no cursor.
    struct FakeSource {
        pages: Vec<Vec<CandidateItem>>,
        next: Option<usize>,
        cursor: Option<String>,
        fail_with: Option<fn() -> SourceError>,
    }

    impl FakeSource {
        fn new(pages: Vec<Vec<CandidateItem>>, start: Option<&str>) -> Self {
            let next = match start {
                None => Some(0),
                Some(c) => c.trim_start_matches('p').parse().ok(),
            };
            Self {
                pages,
                next,
                cursor: start.map(str::to_string),
                fail_with: None,
            }
        }

        fn failing(f: fn() -> SourceError) -> Self {
            Self {
                pages: Vec::new(),
                next: Some(0),
                cursor: None,
                fail_with: Some(f),
            }
        }
    }

    #[async_trait]
    impl ContentSource for FakeSource {
        async fn next_batch(&mut self) -> Result<Batch, SourceError> {
            if let Some(f) = self.fail_with {
                return Err(f());
            }
            let Some(idx) = self.next else {
                return Err(SourceError::Exhausted);
            };
            let items = self.pages.get(idx).cloned().unwrap_or_default();
            let has_more = idx + 1 < self.pages.len();
            self.next = has_more.then_some(idx + 1);
            self.cursor = has_more.then(|| format!("p{}", idx + 1));
            Ok(Batch {
                items,
                exhausted: !has_more,
            })
        }

        fn cursor(&self) -> Option<&str> {
            self.cursor.as_deref()
        }
    }

    #[derive(Clone, Default)]
    struct FakeExecutor {
        outcomes: HashMap<String, ActionOutcome>,
        quota_at: Option<String>,
        unexpected_at: Option<String>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeExecutor {
        fn with(mut self, id: &str, outcome: ActionOutcome) -> Self {
            self.outcomes.insert(id.to_string(), outcome);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionExecutor for FakeExecutor {
        async fn act(&mut self, item: &CandidateItem) -> Result<ActionReport, ExecutorError> {
            self.calls.lock().unwrap().push(item.id.clone());
            if self.quota_at.as_deref() == Some(item.id.as_str()) {
                return Err(ExecutorError::Quota(QuotaExceeded {
                    window: crate::usage::Window::Daily,
                    limit: 1,
                    used: 1,
                    cost: 1,
                    label: "delete".into(),
                }));
            }
            if self.unexpected_at.as_deref() == Some(item.id.as_str()) {
                return Err(ExecutorError::Unexpected("boom".into()));
            }
            let outcome = self.outcomes.get(&item.id).cloned().unwrap_or_else(|| {
                match self.classify(item) {
                    Classification::Original => ActionOutcome::Deleted,
                    Classification::RetractionOfRepost { .. } => ActionOutcome::Unreposted,
                }
            });
            Ok(outcome.into())
        }
    }

    // -- helpers -------------------------------------------------------------

    fn originals(range: std::ops::Range<u32>) -> Vec<CandidateItem> {
        range.map(|i| CandidateItem::original(i.to_string())).collect()
    }

    fn auto(max_items: Option<u64>) -> RunOptions {
        RunOptions {
            mode: RunMode::Auto,
            max_items,
        }
    }

    async fn run(
        dir: &TempDir,
        source: FakeSource,
        executor: FakeExecutor,
        resume: bool,
        options: RunOptions,
    ) -> RunReport {
        let store = CheckpointStore::at_root(dir.path());
        let checkpoint = store.load(resume).unwrap();
        Orchestrator::new(Box::new(source), Box::new(executor), store, checkpoint, options)
            .run()
            .await
    }

    fn saved(dir: &TempDir) -> CheckpointState {
        CheckpointStore::at_root(dir.path()).load(true).unwrap()
    }

    fn ids(state: &CheckpointState) -> Vec<String> {
        state.ids().map(str::to_string).collect()
    }

    fn assert_stats_balance(stats: &RunStats) {
        assert_eq!(
            stats.processed,
            stats.deleted + stats.unreposted + stats.skipped + stats.errors
        );
    }

    // -- properties ----------------------------------------------------------

    #[tokio::test]
    async fn full_run_settles_everything_and_exhausts() {
        let dir = TempDir::new().unwrap();
        let mut page = originals(0..3);
        page.push(CandidateItem::repost("r1", "other"));
        let exec = FakeExecutor::default();

        let report = run(&dir, FakeSource::new(vec![page], None), exec.clone(), false, auto(None)).await;

        assert_eq!(report.state, RunState::Exhausted);
        assert_eq!(report.stats.deleted, 3);
        assert_eq!(report.stats.unreposted, 1);
        assert_stats_balance(&report.stats);
        assert_eq!(saved(&dir).len(), 4);
        assert_eq!(exec.calls(), vec!["0", "1", "2", "r1"]);
    }

    #[tokio::test]
    async fn cap_stops_mid_batch_with_exactly_cap_items_checkpointed() {
        let dir = TempDir::new().unwrap();
        let exec = FakeExecutor::default();

        let report = run(
            &dir,
            FakeSource::new(vec![originals(0..20)], None),
            exec.clone(),
            false,
            auto(Some(5)),
        )
        .await;

        assert_eq!(report.state, RunState::CapReached);
        assert_eq!(report.stats.processed, 5);
        assert_eq!(exec.calls().len(), 5);
        assert_eq!(ids(&saved(&dir)), vec!["0", "1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn already_gone_counts_as_skipped_and_is_checkpointed() {
        let dir = TempDir::new().unwrap();
        let exec = FakeExecutor::default().with("1", ActionOutcome::AlreadyGone);

        let report = run(&dir, FakeSource::new(vec![originals(0..2)], None), exec, false, auto(None)).await;

        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.stats.errors, 0);
        assert!(saved(&dir).contains("1"));
    }

    #[tokio::test]
    async fn failed_action_is_counted_and_left_unsettled() {
        let dir = TempDir::new().unwrap();
        let exec = FakeExecutor::default().with(
            "1",
            ActionOutcome::Failed {
                reason: "unconfirmed".into(),
            },
        );

        let report = run(
            &dir,
            FakeSource::new(vec![originals(0..3), originals(3..5)], None),
            exec,
            false,
            auto(None),
        )
        .await;

        assert_eq!(report.state, RunState::Exhausted);
        assert_eq!(report.stats.errors, 1);
        assert_stats_balance(&report.stats);
        let state = saved(&dir);
        assert!(!state.contains("1"));
        assert_eq!(state.len(), 4);
        // cursor never moved past the page with the failure
        assert_eq!(state.cursor(), None);
    }

    #[tokio::test]
    async fn rate_limit_stops_the_whole_run() {
        let dir = TempDir::new().unwrap();
        let exec = FakeExecutor::default().with(
            "2",
            ActionOutcome::RateLimited {
                detail: "429".into(),
            },
        );

        let report = run(&dir, FakeSource::new(vec![originals(0..5)], None), exec.clone(), false, auto(None)).await;

        assert!(matches!(report.state, RunState::BudgetStopped { .. }));
        assert_eq!(exec.calls(), vec!["0", "1", "2"]);
        assert_eq!(report.stats.processed, 2);
        assert_eq!(ids(&saved(&dir)), vec!["0", "1"]);
    }

    #[tokio::test]
    async fn quota_error_is_budget_stop() {
        let dir = TempDir::new().unwrap();
        let exec = FakeExecutor {
            quota_at: Some("1".into()),
            ..Default::default()
        };

        let report = run(&dir, FakeSource::new(vec![originals(0..3)], None), exec, false, auto(None)).await;
        assert!(matches!(report.state, RunState::BudgetStopped { .. }));
        assert_eq!(ids(&saved(&dir)), vec!["0"]);
    }

    #[tokio::test]
    async fn unexpected_executor_error_is_fatal_with_progress_kept() {
        let dir = TempDir::new().unwrap();
        let exec = FakeExecutor {
            unexpected_at: Some("2".into()),
            ..Default::default()
        };

        let report = run(&dir, FakeSource::new(vec![originals(0..5)], None), exec.clone(), false, auto(None)).await;
        assert!(matches!(report.state, RunState::FatalError { .. }));
        assert_eq!(exec.calls(), vec!["0", "1", "2"]);
        assert_eq!(ids(&saved(&dir)), vec!["0", "1"]);
    }

    #[tokio::test]
    async fn source_unavailable_is_budget_stop_and_unexpected_is_fatal() {
        let dir = TempDir::new().unwrap();
        let report = run(
            &dir,
            FakeSource::failing(|| SourceError::Unavailable("429".into())),
            FakeExecutor::default(),
            false,
            auto(None),
        )
        .await;
        assert!(matches!(report.state, RunState::BudgetStopped { .. }));

        let report = run(
            &dir,
            FakeSource::failing(|| SourceError::Unexpected("bad json".into())),
            FakeExecutor::default(),
            false,
            auto(None),
        )
        .await;
        assert!(matches!(report.state, RunState::FatalError { .. }));
    }

    #[tokio::test]
    async fn empty_discovery_batch_means_exhausted() {
        let dir = TempDir::new().unwrap();
        // A cursor-less source that returns nothing (not flagged exhausted).
        struct Empty;
        #[async_trait]
        impl ContentSource for Empty {
            async fn next_batch(&mut self) -> Result<Batch, SourceError> {
                Ok(Batch::default())
            }
        }
        let store = CheckpointStore::at_root(dir.path());
        let report = Orchestrator::new(
            Box::new(Empty),
            Box::new(FakeExecutor::default()),
            store,
            CheckpointState::default(),
            auto(None),
        )
        .run()
        .await;
        assert_eq!(report.state, RunState::Exhausted);
        assert_eq!(report.stats, RunStats::default());
    }

    fn discovery_over(sample: Vec<crate::ui::EntrySnapshot>) -> DiscoverySource {
        let page = Arc::new(FakePage::new());
        page.push_sample(sample);
        DiscoverySource::new(page, DiscoveryOptions::default(), Pacer::immediate())
    }

    fn mixed_timeline() -> Vec<crate::ui::EntrySnapshot> {
        vec![
            entry("e1", Some("/u/status/1"), None, false),
            entry("e2", None, Some("no permalink here"), false),
            entry("e3", None, None, false),
            entry("e4", Some("/u/status/4"), None, true),
        ]
    }

    #[tokio::test]
    async fn dry_discovery_run_with_unidentifiable_entry_exhausts() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::at_root(dir.path());
        let report = Orchestrator::new(
            Box::new(discovery_over(mixed_timeline())),
            Box::new(FakeExecutor::default()),
            store,
            CheckpointState::default(),
            RunOptions {
                mode: RunMode::Dry,
                max_items: None,
            },
        )
        .run()
        .await;

        assert_eq!(report.state, RunState::Exhausted);
        assert_eq!(report.stats.processed, 4);
        assert_eq!(report.stats.deleted, 3);
        assert_eq!(report.stats.unreposted, 1);
    }

    #[tokio::test]
    async fn discovery_run_settles_each_visible_entry_once() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::at_root(dir.path());
        let exec = FakeExecutor::default();
        let report = Orchestrator::new(
            Box::new(discovery_over(mixed_timeline())),
            Box::new(exec.clone()),
            store,
            CheckpointState::default(),
            auto(None),
        )
        .run()
        .await;

        assert_eq!(report.state, RunState::Exhausted);
        assert_stats_balance(&report.stats);
        let calls = exec.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], "1");
        assert!(calls[1].starts_with("content:"));
        assert!(calls[2].starts_with("anon:"));
        assert_eq!(calls[3], "4");
        assert_eq!(saved(&dir).len(), 4);
    }

    #[tokio::test]
    async fn resume_never_repeats_settled_items() {
        let pages = vec![originals(0..5), originals(5..10), originals(10..12)];

        // Uninterrupted reference run.
        let reference_dir = TempDir::new().unwrap();
        run(
            &reference_dir,
            FakeSource::new(pages.clone(), None),
            FakeExecutor::default(),
            false,
            auto(None),
        )
        .await;
        let reference = ids(&saved(&reference_dir));

        // Interrupted at item 7 by a rate limit.
        let dir = TempDir::new().unwrap();
        let first_exec = FakeExecutor::default().with(
            "7",
            ActionOutcome::RateLimited {
                detail: "429".into(),
            },
        );
        let first = run(&dir, FakeSource::new(pages.clone(), None), first_exec.clone(), false, auto(None)).await;
        assert!(matches!(first.state, RunState::BudgetStopped { .. }));
        let after_first = saved(&dir);
        assert_eq!(after_first.cursor(), Some("p1"));

        // Resume from the stored cursor.
        let second_exec = FakeExecutor::default();
        let second = run(
            &dir,
            FakeSource::new(pages.clone(), after_first.cursor()),
            second_exec.clone(),
            true,
            auto(None),
        )
        .await;
        assert_eq!(second.state, RunState::Exhausted);

        let first_settled: Vec<String> = ids(&after_first);
        for id in second_exec.calls() {
            assert!(!first_settled.contains(&id), "{id} was acted on twice");
        }
        assert_eq!(second.stats.skipped, 2); // items 5 and 6 from page p1
        assert_eq!(ids(&saved(&dir)), reference);
    }

    #[tokio::test]
    async fn checkpointed_items_do_not_count_toward_cap() {
        let dir = TempDir::new().unwrap();
        let mut state = CheckpointState::default();
        for i in 0..3 {
            state.insert(i.to_string());
        }
        CheckpointStore::at_root(dir.path()).save(&state).unwrap();

        let exec = FakeExecutor::default();
        let report = run(&dir, FakeSource::new(vec![originals(0..10)], None), exec.clone(), true, auto(Some(2))).await;

        assert_eq!(report.state, RunState::CapReached);
        assert_eq!(exec.calls(), vec!["3", "4"]);
        assert_eq!(report.stats.skipped, 3);
        assert_eq!(report.stats.processed, 5);
    }

    #[tokio::test]
    async fn dry_run_counts_but_never_acts_or_persists() {
        let dir = TempDir::new().unwrap();
        let mut page = originals(0..3);
        page.push(CandidateItem::repost("r", "t"));
        let exec = FakeExecutor::default();

        let report = run(
            &dir,
            FakeSource::new(vec![page, originals(3..5)], None),
            exec.clone(),
            false,
            RunOptions {
                mode: RunMode::Dry,
                max_items: None,
            },
        )
        .await;

        assert_eq!(report.state, RunState::Exhausted);
        assert_eq!(report.stats.deleted, 5);
        assert_eq!(report.stats.unreposted, 1);
        assert!(exec.calls().is_empty());
        assert!(saved(&dir).is_empty());
        assert!(!CheckpointStore::at_root(dir.path()).path().exists());
    }

    #[tokio::test]
    async fn cursor_advances_after_each_settled_page() {
        let dir = TempDir::new().unwrap();
        let report = run(
            &dir,
            FakeSource::new(vec![originals(0..2), originals(2..4), originals(4..6)], None),
            FakeExecutor::default(),
            false,
            auto(Some(4)),
        )
        .await;
        assert_eq!(report.state, RunState::CapReached);
        // stopped at the end of page p1 before its cursor advance
        assert_eq!(saved(&dir).cursor(), Some("p1"));
    }
}
