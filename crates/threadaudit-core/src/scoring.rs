//! The scoring engine: per-step results in, one `AuditResult` out.
//!
//! Pure computation; nothing here awaits or performs I/O.
//!
//! 1. Place every result in its catalog slot, rejecting unknown, duplicate,
//!    missing, and out-of-bound results.
//! 2. Category subtotal = Σ raw scores of members; ceiling = Σ max scores.
//! 3. Quality score = Σ(raw/max × weight) / Σ weight over weighted steps,
//!    multiplied by the configured scale.
//! 4. Fatal transaction = some fatal step carries an explicit failing
//!    judgment. Evaluation errors never count.
//! 5. Final score = 0 when fatal, otherwise the quality score.
//!
//! Any desynchronization between results and catalog is an `Aggregation`
//! error. Nothing is silently defaulted to zero.

use chrono::Utc;
use tracing::debug;

use threadaudit_catalog::{CategorySchema, StepCatalog};
use threadaudit_contracts::{
    error::{ThreadAuditError, ThreadAuditResult},
    result::{AuditResult, AuditRunId, CategorySubtotal, StepResult},
    settings::ScoreScale,
};

fn aggregation(reason: impl Into<String>) -> ThreadAuditError {
    ThreadAuditError::Aggregation {
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    scale: ScoreScale,
}

impl ScoringEngine {
    pub fn new(scale: ScoreScale) -> Self {
        Self { scale }
    }

    /// Aggregate `results` into an `AuditResult`.
    ///
    /// `results` may arrive in any order; `per_step_results` is always in
    /// catalog order.
    pub fn score(
        &self,
        catalog: &StepCatalog,
        schema: &CategorySchema,
        results: Vec<StepResult>,
    ) -> ThreadAuditResult<AuditResult> {
        // ── 1. Slot results into catalog order ───────────────────────────────
        let mut slots: Vec<Option<StepResult>> = vec![None; catalog.len()];
        for result in results {
            let idx = catalog.position(&result.step_id).ok_or_else(|| {
                aggregation(format!("result for unknown step '{}'", result.step_id))
            })?;
            let step = &catalog.steps_in_order()[idx];
            if !(result.raw_score.is_finite()
                && result.raw_score >= 0.0
                && result.raw_score <= step.max_score)
            {
                return Err(aggregation(format!(
                    "step '{}' raw score {} is outside 0..={}",
                    step.id, result.raw_score, step.max_score
                )));
            }
            if slots[idx].is_some() {
                return Err(aggregation(format!(
                    "duplicate result for step '{}'",
                    step.id
                )));
            }
            slots[idx] = Some(result);
        }

        let mut ordered = Vec::with_capacity(slots.len());
        for (slot, step) in slots.into_iter().zip(catalog.steps_in_order()) {
            let result =
                slot.ok_or_else(|| aggregation(format!("missing result for step '{}'", step.id)))?;
            ordered.push(result);
        }

        // ── 2. Category subtotals ────────────────────────────────────────────
        let mut category_subtotals = Vec::with_capacity(schema.len());
        for category in schema.categories_in_order() {
            if category.members.is_empty() {
                return Err(aggregation(format!(
                    "category '{}' has no contributing steps",
                    category.id
                )));
            }
            let mut subtotal = 0.0;
            let mut ceiling = 0.0;
            for member in &category.members {
                let idx = catalog.position(member).ok_or_else(|| {
                    aggregation(format!(
                        "category '{}' lists step '{}' which is not in the catalog",
                        category.id, member
                    ))
                })?;
                subtotal += ordered[idx].raw_score;
                ceiling += catalog.steps_in_order()[idx].max_score;
            }
            category_subtotals.push(CategorySubtotal {
                category_id: category.id.clone(),
                title: category.title.clone(),
                subtotal,
                ceiling,
            });
        }

        // ── 3. Weighted quality score ────────────────────────────────────────
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for (step, result) in catalog.steps_in_order().iter().zip(&ordered) {
            if step.is_weighted() {
                weighted_sum += result.raw_score / step.max_score * step.weight;
                total_weight += step.weight;
            }
        }
        if total_weight <= 0.0 {
            return Err(aggregation("no step carries a positive weight"));
        }
        let quality_score = weighted_sum / total_weight * self.scale.factor();

        // ── 4–5. Fatal override ──────────────────────────────────────────────
        let fatal_step = catalog
            .steps_in_order()
            .iter()
            .zip(&ordered)
            .find(|(step, result)| step.is_fatal && result.is_explicit_failure())
            .map(|(step, _)| step.id.clone());
        let fatal_transaction = fatal_step.is_some();
        let final_score = if fatal_transaction { 0.0 } else { quality_score };

        debug!(
            quality_score,
            final_score,
            fatal_step = fatal_step.as_ref().map(|s| s.as_str()).unwrap_or("-"),
            "scored audit"
        );

        Ok(AuditResult {
            run_id: AuditRunId::new(),
            per_step_results: ordered,
            category_subtotals,
            quality_score,
            score_without_fatal: quality_score,
            fatal_transaction,
            final_score,
            scale: self.scale,
            timestamp: Utc::now(),
        })
    }
}
