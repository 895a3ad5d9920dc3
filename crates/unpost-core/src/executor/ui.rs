use super::{ActionExecutor, ActionOutcome, ActionReport, Classification, ExecutorError};
use crate::source::discovery::identity_key;
use crate::types::{CandidateItem, ElementHandle};
use crate::ui::{LocatorChain, Locators, Pacer, Page, PageError};
use async_trait::async_trait;
use std::sync::Arc;

/// Samples taken while looking for an item again after a reload.
const RELOCATE_SAMPLES: u32 = 5;

/// Retracts items by clicking through the page: find control, click, wait,
/// find confirmation, click, wait.
pub struct UiExecutor {
    page: Arc<dyn Page>,
    locators: Locators,
    pacer: Pacer,
    max_retries: u32,
}

/// Result of one click step.
enum Step {
    Clicked,
    Missing,
}

impl UiExecutor {
    pub fn new(page: Arc<dyn Page>, locators: Locators, pacer: Pacer, max_retries: u32) -> Self {
        Self {
            page,
            locators,
            pacer,
            max_retries,
        }
    }

    async fn step(
        &self,
        chain: &LocatorChain,
        scope: Option<&ElementHandle>,
    ) -> Result<Step, PageError> {
        let Some(control) = chain.first_match(self.page.as_ref(), scope).await? else {
            return Ok(Step::Missing);
        };
        self.page.click(&control).await?;
        self.pacer.pause().await;
        Ok(Step::Clicked)
    }

    async fn undo_repost(&self, entry: &ElementHandle) -> Result<ActionOutcome, PageError> {
        let l = &self.locators;
        if let Step::Missing = self.step(&l.unrepost, Some(entry)).await? {
            return Ok(ActionOutcome::Skipped {
                reason: "undo-repost control not present".into(),
            });
        }
        if let Step::Missing = self.step(&l.unrepost_confirm, None).await? {
            return Ok(ActionOutcome::Failed {
                reason: "undo-repost confirmation not found".into(),
            });
        }
        Ok(ActionOutcome::Unreposted)
    }

    async fn delete(&self, entry: &ElementHandle) -> Result<ActionOutcome, PageError> {
        let l = &self.locators;
        if let Step::Missing = self.step(&l.more_menu, Some(entry)).await? {
            return Ok(ActionOutcome::Skipped {
                reason: "post menu not present".into(),
            });
        }
        if let Step::Missing = self.step(&l.delete_menu_item, None).await? {
            return Ok(ActionOutcome::Failed {
                reason: "delete menu item not found".into(),
            });
        }
        if let Step::Missing = self.step(&l.delete_confirm, None).await? {
            return Ok(ActionOutcome::Failed {
                reason: "delete confirmation not found".into(),
            });
        }
        Ok(ActionOutcome::Deleted)
    }

    async fn attempt(&self, entry: &ElementHandle, class: &Classification) -> ActionOutcome {
        let result = match class {
            Classification::RetractionOfRepost { .. } => self.undo_repost(entry).await,
            Classification::Original => self.delete(entry).await,
        };
        result.unwrap_or_else(|e| ActionOutcome::Failed {
            reason: e.to_string(),
        })
    }

    /// Find the entry for `id` on a freshly loaded page.
    async fn relocate(&self, id: &str) -> Result<Option<ElementHandle>, PageError> {
        for _ in 0..RELOCATE_SAMPLES {
            let entries = self.page.entries().await?;
            if let Some(found) = entries.into_iter().find(|e| identity_key(e) == id) {
                return Ok(Some(found.handle));
            }
            self.page.reveal_more().await?;
            self.pacer.pause().await;
        }
        Ok(None)
    }
}

#[async_trait]
impl ActionExecutor for UiExecutor {
    async fn act(&mut self, item: &CandidateItem) -> Result<ActionReport, ExecutorError> {
        let class = self.classify(item);
        let mut handle = item.handle.clone();
        let mut retries = 0u32;

        loop {
            let outcome = match &handle {
                Some(entry) => self.attempt(entry, &class).await,
                None => ActionOutcome::Failed {
                    reason: "item not located on page".into(),
                },
            };

            let failure = match &outcome {
                ActionOutcome::Failed { reason } => Some(reason.clone()),
                _ => None,
            };
            let Some(reason) = failure.filter(|_| retries < self.max_retries) else {
                return Ok(ActionReport { outcome, retries });
            };

            retries += 1;
            tracing::warn!(item_id = %item.id, retry = retries, reason = %reason, "UI action failed, reloading");
            let reloaded = async {
                self.page.reload().await?;
                self.pacer.pause().await;
                self.relocate(&item.id).await
            }
            .await;
            handle = match reloaded {
                Ok(h) => h,
                Err(e) => {
                    return Ok(ActionReport {
                        outcome: ActionOutcome::Failed {
                            reason: e.to_string(),
                        },
                        retries,
                    })
                }
            };
        }
    }
}
