//! The audit orchestrator: fans every catalog step out to the evaluator,
//! collects the results in catalog order, and hands them to the scoring
//! engine.
//!
//!   Validate → Transcript → [Evaluate × N, bounded] → Reorder → Score
//!
//! A step's failure is data on its `StepResult` and never stops the other
//! steps. Only an invalid conversation, the conversation-level deadline, or
//! an aggregation error fails the run, and then no `AuditResult` exists.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use threadaudit_catalog::AuditCatalog;
use threadaudit_contracts::{
    conversation::Conversation,
    error::{ThreadAuditError, ThreadAuditResult},
    oracle::OracleError,
    result::{AuditResult, StepResult},
};

use crate::{
    evaluator::StepEvaluator,
    scoring::ScoringEngine,
    traits::{ReasoningOracle, RunLedger},
};

/// What happened to one conversation of a batch.
#[derive(Debug)]
pub enum ConversationOutcome {
    /// Scored. `case_number` is set when a ledger recorded the audit.
    Audited {
        conversation_id: Option<String>,
        case_number: Option<String>,
        result: AuditResult,
    },

    /// Already in the ledger; not re-audited.
    Skipped {
        conversation_id: Option<String>,
        case_number: String,
    },

    /// The run for this conversation aborted. Other conversations are unaffected.
    Failed {
        conversation_id: Option<String>,
        error: ThreadAuditError,
    },
}

impl ConversationOutcome {
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            Self::Audited { conversation_id, .. }
            | Self::Skipped { conversation_id, .. }
            | Self::Failed { conversation_id, .. } => conversation_id.as_deref(),
        }
    }

    pub fn result(&self) -> Option<&AuditResult> {
        match self {
            Self::Audited { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Drives audits for one oracle. Cheap to clone.
#[derive(Clone)]
pub struct AuditOrchestrator {
    oracle: Arc<dyn ReasoningOracle>,
}

impl AuditOrchestrator {
    pub fn new(oracle: Arc<dyn ReasoningOracle>) -> Self {
        Self { oracle }
    }

    /// Audit one conversation against `catalog`.
    ///
    /// # Errors
    ///
    /// - `Input` if the conversation is unusable (checked before any step runs)
    /// - `ConversationTimeout` if every step together exceeds the deadline
    /// - `Aggregation` if results and catalog disagree
    pub async fn run(
        &self,
        conversation: &Conversation,
        catalog: &Arc<AuditCatalog>,
    ) -> ThreadAuditResult<AuditResult> {
        conversation.validate()?;

        let settings = catalog.settings();
        let deadline = settings.evaluation.conversation_timeout();
        let transcript: Arc<str> = Arc::from(conversation.transcript());

        debug!(
            conversation_id = %conversation.label(),
            steps = catalog.steps().len(),
            concurrency = settings.evaluation.concurrency,
            "audit run starting"
        );

        let results = match timeout(deadline, self.evaluate_all(catalog, transcript)).await {
            Ok(results) => results,
            Err(_) => {
                warn!(
                    conversation_id = %conversation.label(),
                    timeout_secs = settings.evaluation.conversation_timeout_secs,
                    "conversation deadline elapsed; discarding partial results"
                );
                return Err(ThreadAuditError::ConversationTimeout {
                    timeout_secs: settings.evaluation.conversation_timeout_secs,
                });
            }
        };

        let result = ScoringEngine::new(settings.scoring.scale).score(
            catalog.steps(),
            catalog.schema(),
            results,
        )?;

        info!(
            conversation_id = %conversation.label(),
            run_id = %result.run_id.0,
            quality_score = result.quality_score,
            final_score = result.final_score,
            fatal = result.fatal_transaction,
            errored_steps = result.errored_steps().count(),
            "audit run complete"
        );
        Ok(result)
    }

    /// Evaluate every step with at most `concurrency` oracle calls in flight.
    ///
    /// Returned in catalog order. Dropping this future aborts all tasks.
    async fn evaluate_all(&self, catalog: &Arc<AuditCatalog>, transcript: Arc<str>) -> Vec<StepResult> {
        let settings = catalog.settings();
        let evaluator = StepEvaluator::new(
            Arc::clone(&self.oracle),
            settings.scoring.clone(),
            settings.evaluation.clone(),
        );
        let sem = Arc::new(Semaphore::new(settings.evaluation.concurrency.max(1)));
        let mut join_set = JoinSet::new();

        for (idx, step) in catalog.steps().steps_in_order().iter().enumerate() {
            let sem = Arc::clone(&sem);
            let evaluator = evaluator.clone();
            let step = step.clone();
            let transcript = Arc::clone(&transcript);
            join_set.spawn(async move {
                // The semaphore is never closed; a missing permit only
                // means the bound is not applied to this task.
                let _permit = sem.acquire_owned().await.ok();
                (idx, evaluator.evaluate_transcript(&step, transcript).await)
            });
        }

        let mut slots: Vec<Option<StepResult>> = vec![None; catalog.steps().len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => error!(error = %e, "step evaluation task failed"),
            }
        }

        slots
            .into_iter()
            .zip(catalog.steps().steps_in_order())
            .map(|(slot, step)| {
                slot.unwrap_or_else(|| {
                    StepResult::errored(
                        step.id.clone(),
                        OracleError::Transport {
                            reason: "evaluation task ended without a result".to_string(),
                        },
                        0,
                    )
                })
            })
            .collect()
    }

    /// Audit a batch of conversations, at most `parallel_conversations` at once.
    ///
    /// Returns one outcome per input in input order. With a ledger,
    /// conversations it already knows are skipped and new audits are recorded.
    pub async fn run_batch(
        &self,
        conversations: Vec<Conversation>,
        catalog: Arc<AuditCatalog>,
        ledger: Option<Arc<dyn RunLedger>>,
    ) -> Vec<ConversationOutcome> {
        let parallel = catalog.settings().evaluation.parallel_conversations.max(1);
        let sem = Arc::new(Semaphore::new(parallel));
        let mut join_set = JoinSet::new();
        let ids: Vec<Option<String>> = conversations
            .iter()
            .map(|c| c.conversation_id.clone())
            .collect();

        for (idx, conversation) in conversations.into_iter().enumerate() {
            let sem = Arc::clone(&sem);
            let this = self.clone();
            let catalog = Arc::clone(&catalog);
            let ledger = ledger.clone();
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                (idx, this.run_one(conversation, &catalog, ledger.as_deref()).await)
            });
        }

        let mut slots: Vec<Option<ConversationOutcome>> = ids.iter().map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, outcome)) => slots[idx] = Some(outcome),
                Err(e) => error!(error = %e, "conversation task failed"),
            }
        }

        let outcomes: Vec<ConversationOutcome> = slots
            .into_iter()
            .zip(ids)
            .map(|(slot, conversation_id)| {
                slot.unwrap_or_else(|| ConversationOutcome::Failed {
                    conversation_id,
                    error: ThreadAuditError::Internal {
                        reason: "conversation task ended without a result".to_string(),
                    },
                })
            })
            .collect();

        let audited = outcomes.iter().filter(|o| o.result().is_some()).count();
        let skipped = outcomes
            .iter()
            .filter(|o| matches!(o, ConversationOutcome::Skipped { .. }))
            .count();
        info!(
            total = outcomes.len(),
            audited,
            skipped,
            failed = outcomes.len() - audited - skipped,
            "batch complete"
        );
        outcomes
    }

    async fn run_one(
        &self,
        conversation: Conversation,
        catalog: &Arc<AuditCatalog>,
        ledger: Option<&dyn RunLedger>,
    ) -> ConversationOutcome {
        let conversation_id = conversation.conversation_id.clone();

        if let Some(case_number) = ledger.and_then(|l| l.lookup(&conversation)) {
            info!(
                conversation_id = %conversation.label(),
                case_number = %case_number,
                "conversation already audited; skipping"
            );
            return ConversationOutcome::Skipped {
                conversation_id,
                case_number,
            };
        }

        let result = match self.run(&conversation, catalog).await {
            Ok(result) => result,
            Err(error) => {
                warn!(
                    conversation_id = %conversation.label(),
                    error = %error,
                    "conversation audit failed"
                );
                return ConversationOutcome::Failed {
                    conversation_id,
                    error,
                };
            }
        };

        // A ledger failure does not discard the audit; the row is still
        // reported, just without a case number.
        let case_number = match ledger.map(|l| l.record(&conversation, &result)) {
            Some(Ok(case_number)) => Some(case_number),
            Some(Err(e)) => {
                error!(
                    conversation_id = %conversation.label(),
                    error = %e,
                    "failed to record audit in ledger"
                );
                None
            }
            None => None,
        };

        ConversationOutcome::Audited {
            conversation_id,
            case_number,
            result,
        }
    }
}
