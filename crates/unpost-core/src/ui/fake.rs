//! Scripted in-memory [`Page`] for discovery and executor tests.

use super::{EntrySnapshot, Locator, Page, PageError};
use crate::types::ElementHandle;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

type ControlKey = (Option<String>, Locator);

#[derive(Default)]
struct Inner {
    samples: VecDeque<Vec<EntrySnapshot>>,
    last: Vec<EntrySnapshot>,
    after_reload_samples: Vec<Vec<EntrySnapshot>>,
    controls: HashMap<ControlKey, String>,
    after_reload_controls: Vec<(ControlKey, String)>,
    stale_scopes: HashSet<String>,
    clicks: Vec<String>,
    scrolls: usize,
    reloads: usize,
}

pub(crate) struct FakePage {
    inner: Mutex<Inner>,
}

pub(crate) fn entry(handle: &str, permalink: Option<&str>, text: Option<&str>, reposted: bool) -> EntrySnapshot {
    EntrySnapshot {
        handle: ElementHandle(handle.to_string()),
        permalink: permalink.map(str::to_string),
        text: text.map(str::to_string),
        reposted,
    }
}

impl FakePage {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Queue the result of the next `entries()` call. Once the queue is
    /// drained, the last sample keeps being returned.
    pub(crate) fn push_sample(&self, sample: Vec<EntrySnapshot>) {
        self.inner.lock().unwrap().samples.push_back(sample);
    }

    pub(crate) fn add_control(&self, scope: Option<&str>, locator: Locator, handle: &str) {
        self.inner
            .lock()
            .unwrap()
            .controls
            .insert((scope.map(str::to_string), locator), handle.to_string());
    }

    /// Control that only appears once the page has been reloaded.
    pub(crate) fn add_control_after_reload(&self, scope: Option<&str>, locator: Locator, handle: &str) {
        self.inner
            .lock()
            .unwrap()
            .after_reload_controls
            .push(((scope.map(str::to_string), locator), handle.to_string()));
    }

    /// Samples that replace the queue when the page is reloaded.
    pub(crate) fn set_samples_after_reload(&self, samples: Vec<Vec<EntrySnapshot>>) {
        self.inner.lock().unwrap().after_reload_samples = samples;
    }

    pub(crate) fn mark_stale(&self, scope: &str) {
        self.inner.lock().unwrap().stale_scopes.insert(scope.to_string());
    }

    pub(crate) fn clicks(&self) -> Vec<String> {
        self.inner.lock().unwrap().clicks.clone()
    }

    pub(crate) fn scrolls(&self) -> usize {
        self.inner.lock().unwrap().scrolls
    }

    pub(crate) fn reloads(&self) -> usize {
        self.inner.lock().unwrap().reloads
    }
}

#[async_trait]
impl Page for FakePage {
    async fn entries(&self) -> Result<Vec<EntrySnapshot>, PageError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(next) = inner.samples.pop_front() {
            inner.last = next;
        }
        Ok(inner.last.clone())
    }

    async fn reveal_more(&self) -> Result<(), PageError> {
        self.inner.lock().unwrap().scrolls += 1;
        Ok(())
    }

    async fn reload(&self) -> Result<(), PageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.reloads += 1;
        inner.stale_scopes.clear();
        let pending = std::mem::take(&mut inner.after_reload_controls);
        for (key, handle) in pending {
            inner.controls.insert(key, handle);
        }
        let samples = std::mem::take(&mut inner.after_reload_samples);
        if !samples.is_empty() {
            inner.samples = samples.into();
            inner.last = Vec::new();
        }
        Ok(())
    }

    async fn find(
        &self,
        scope: Option<&ElementHandle>,
        locator: &Locator,
    ) -> Result<Option<ElementHandle>, PageError> {
        let inner = self.inner.lock().unwrap();
        if let Some(s) = scope {
            if inner.stale_scopes.contains(&s.0) {
                return Err(PageError::Stale(s.0.clone()));
            }
        }
        let key = (scope.map(|s| s.0.clone()), locator.clone());
        Ok(inner.controls.get(&key).map(|h| ElementHandle(h.clone())))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError> {
        self.inner.lock().unwrap().clicks.push(element.0.clone());
        Ok(())
    }
}
