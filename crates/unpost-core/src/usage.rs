//! Durable daily/monthly consumption counters for the metered API.
//!
//! Every public call first compares the stored calendar keys against today
//! and zeroes a window whose key no longer matches. A consumption that would
//! push either window past its limit is refused before anything is spent,
//! and every accepted consumption is written to disk before returning.

use crate::error::{Result, UnpostError};
use crate::io::{atomic_write, read_optional};
use crate::paths;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Window / limits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    Daily,
    Monthly,
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::Daily => f.write_str("daily"),
            Window::Monthly => f.write_str("monthly"),
        }
    }
}

/// Per-window caps. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLimits {
    #[serde(default)]
    pub daily: Option<u64>,
    #[serde(default)]
    pub monthly: Option<u64>,
}

impl UsageLimits {
    pub fn get(&self, window: Window) -> Option<u64> {
        match window {
            Window::Daily => self.daily,
            Window::Monthly => self.monthly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{window} quota exceeded: {used} of {limit} used, {cost} requested for {label}")]
pub struct QuotaExceeded {
    pub window: Window,
    pub limit: u64,
    pub used: u64,
    pub cost: u64,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "count")]
pub enum Remaining {
    Unlimited,
    Count(u64),
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of the current calendar date (UTC).
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

// ---------------------------------------------------------------------------
// UsageState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageState {
    pub day_key: String,
    pub month_key: String,
    pub daily_count: u64,
    pub monthly_count: u64,
}

impl UsageState {
    fn fresh(today: NaiveDate) -> Self {
        Self {
            day_key: day_key(today),
            month_key: month_key(today),
            daily_count: 0,
            monthly_count: 0,
        }
    }

    /// Zero any window whose calendar key no longer matches `today`.
    fn roll(&mut self, today: NaiveDate) {
        let day = day_key(today);
        if self.day_key != day {
            tracing::info!(from = %self.day_key, to = %day, "Daily usage window rolled over");
            self.day_key = day;
            self.daily_count = 0;
        }
        let month = month_key(today);
        if self.month_key != month {
            tracing::info!(from = %self.month_key, to = %month, "Monthly usage window rolled over");
            self.month_key = month;
            self.monthly_count = 0;
        }
    }

    pub fn count(&self, window: Window) -> u64 {
        match window {
            Window::Daily => self.daily_count,
            Window::Monthly => self.monthly_count,
        }
    }
}

// ---------------------------------------------------------------------------
// UsageTracker
// ---------------------------------------------------------------------------

pub struct UsageTracker {
    path: PathBuf,
    limits: UsageLimits,
    clock: Box<dyn Clock>,
    state: Mutex<UsageState>,
}

impl UsageTracker {
    pub fn open(path: impl Into<PathBuf>, limits: UsageLimits) -> Result<Self> {
        Self::with_clock(path, limits, Box::new(SystemClock))
    }

    pub fn at_root(root: &Path, limits: UsageLimits) -> Result<Self> {
        Self::open(paths::usage_path(root), limits)
    }

    pub fn with_clock(
        path: impl Into<PathBuf>,
        limits: UsageLimits,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        let path = path.into();
        let today = clock.today();
        let state = match read_optional(&path)? {
            None => UsageState::fresh(today),
            Some(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Usage file unreadable, resetting counters");
                UsageState::fresh(today)
            }),
        };
        Ok(Self {
            path,
            limits,
            clock,
            state: Mutex::new(state),
        })
    }

    pub fn limits(&self) -> UsageLimits {
        self.limits
    }

    /// Spend `cost` units against both windows, or refuse without spending.
    pub fn consume(&self, cost: u64, label: &str) -> Result<()> {
        let mut state = self.lock();
        state.roll(self.clock.today());

        for window in [Window::Daily, Window::Monthly] {
            if let Some(limit) = self.limits.get(window) {
                let used = state.count(window);
                if used.saturating_add(cost) > limit {
                    tracing::warn!(%window, used, limit, cost, label, "Quota exhausted");
                    return Err(UnpostError::Quota(QuotaExceeded {
                        window,
                        limit,
                        used,
                        cost,
                        label: label.to_string(),
                    }));
                }
            }
        }

        let mut next = state.clone();
        next.daily_count += cost;
        next.monthly_count += cost;
        let data = serde_json::to_vec_pretty(&next)?;
        atomic_write(&self.path, &data)?;
        *state = next;
        tracing::debug!(
            label,
            daily = state.daily_count,
            monthly = state.monthly_count,
            "Usage consumed"
        );
        Ok(())
    }

    pub fn remaining(&self, window: Window) -> Remaining {
        let mut state = self.lock();
        state.roll(self.clock.today());
        match self.limits.get(window) {
            None => Remaining::Unlimited,
            Some(limit) => Remaining::Count(limit.saturating_sub(state.count(window))),
        }
    }

    /// Current counters after a window check.
    pub fn snapshot(&self) -> UsageState {
        let mut state = self.lock();
        state.roll(self.clock.today());
        state.clone()
    }

    fn lock(&self) -> MutexGuard<'_, UsageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
