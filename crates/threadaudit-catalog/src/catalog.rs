//! Validated step catalog and category schema.
//!
//! Loading happens in one pass over the whole document:
//!
//! 1. Categories are checked for missing fields and duplicate ids.
//! 2. Steps are checked for missing fields, duplicate ids and report columns,
//!    score bounds, and resolvable categories.
//! 3. Categories are bound to their member steps (declaration order) and
//!    checked for emptiness.
//! 4. Catalog-wide checks run: at least one step, positive total weight,
//!    category titles distinct from each other and from step columns.
//!
//! Every violation from every stage is collected. A load either returns a
//! fully valid `AuditCatalog` or a single `Config` error listing them all.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use tracing::{debug, warn};

use threadaudit_contracts::{
    error::{ConfigErrorKind, ConfigViolation, ThreadAuditError, ThreadAuditResult},
    settings::AuditSettings,
    step::{CategoryDefinition, CategoryId, StepDefinition, StepId},
};

use crate::config::{CatalogConfig, CategoryConfig, StepConfig};

fn into_result<T>(value: T, violations: Vec<ConfigViolation>) -> ThreadAuditResult<T> {
    if violations.is_empty() {
        Ok(value)
    } else {
        Err(ThreadAuditError::Config { violations })
    }
}

// ── CategorySchema ───────────────────────────────────────────────────────────

/// The declared categories, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySchema {
    categories: Vec<CategoryDefinition>,
}

impl CategorySchema {
    /// Validate category declarations on their own. Members are empty until
    /// the schema is bound to a step catalog.
    pub fn load(categories: &[CategoryConfig]) -> ThreadAuditResult<Self> {
        let (schema, violations) = Self::collect(categories);
        into_result(schema, violations)
    }

    fn collect(categories: &[CategoryConfig]) -> (Self, Vec<ConfigViolation>) {
        let mut violations = Vec::new();
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(categories.len());

        for (idx, cfg) in categories.iter().enumerate() {
            let id = cfg.id.trim();
            if id.is_empty() {
                violations.push(ConfigViolation::new(
                    ConfigErrorKind::MissingField,
                    format!("categories[{idx}]"),
                    "id is empty",
                ));
                continue;
            }
            let subject = format!("category '{id}'");
            if cfg.title.trim().is_empty() {
                violations.push(ConfigViolation::new(
                    ConfigErrorKind::MissingField,
                    subject.clone(),
                    "title is empty",
                ));
            }
            if !seen.insert(id.to_string()) {
                violations.push(ConfigViolation::new(
                    ConfigErrorKind::DuplicateCategoryId,
                    subject,
                    "declared more than once",
                ));
                continue;
            }
            out.push(CategoryDefinition {
                id: CategoryId::new(id),
                title: cfg.title.trim().to_string(),
                members: Vec::new(),
            });
        }

        (Self { categories: out }, violations)
    }

    /// Fill member lists from the catalog and flag categories left empty.
    ///
    /// A category named by a declared step that was itself rejected is not
    /// flagged; that step already carries its own violation.
    fn bind(&mut self, steps: &StepCatalog, declared: &[StepConfig]) -> Vec<ConfigViolation> {
        let claimed: HashSet<&str> = declared.iter().map(|s| s.category.trim()).collect();
        let mut violations = Vec::new();
        for category in &mut self.categories {
            category.members = steps
                .steps_in_order()
                .iter()
                .filter(|s| s.category == category.id)
                .map(|s| s.id.clone())
                .collect();
            if category.members.is_empty() && !claimed.contains(category.id.as_str()) {
                violations.push(ConfigViolation::new(
                    ConfigErrorKind::EmptyCategory,
                    format!("category '{}'", category.id),
                    "no step belongs to this category",
                ));
            }
        }
        violations
    }

    pub fn categories_in_order(&self) -> &[CategoryDefinition] {
        &self.categories
    }

    pub fn contains(&self, category_id: &str) -> bool {
        self.categories.iter().any(|c| c.id.as_str() == category_id)
    }

    pub fn category(&self, category_id: &str) -> ThreadAuditResult<&CategoryDefinition> {
        self.categories
            .iter()
            .find(|c| c.id.as_str() == category_id)
            .ok_or_else(|| ThreadAuditError::CategoryNotFound {
                category_id: category_id.to_string(),
            })
    }

    /// Member step ids of `category_id`, in report column order.
    pub fn members_of(&self, category_id: &str) -> ThreadAuditResult<&[StepId]> {
        self.category(category_id).map(|c| c.members.as_slice())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

// ── StepCatalog ──────────────────────────────────────────────────────────────

/// The validated steps, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StepCatalog {
    steps: Vec<StepDefinition>,
    index: HashMap<StepId, usize>,
}

impl StepCatalog {
    /// Validate step declarations against an already-loaded schema.
    pub fn load(steps: &[StepConfig], schema: &CategorySchema) -> ThreadAuditResult<Self> {
        let (catalog, violations) = Self::collect(steps, schema);
        into_result(catalog, violations)
    }

    fn collect(steps: &[StepConfig], schema: &CategorySchema) -> (Self, Vec<ConfigViolation>) {
        let mut violations = Vec::new();
        let mut columns = HashSet::new();
        let mut out: Vec<StepDefinition> = Vec::with_capacity(steps.len());
        let mut index = HashMap::new();

        for (idx, cfg) in steps.iter().enumerate() {
            let id = cfg.id.trim();
            let subject = if id.is_empty() {
                format!("steps[{idx}]")
            } else {
                format!("step '{id}'")
            };
            let mut ok = true;

            let required = [
                ("id", id),
                ("title", cfg.title.trim()),
                ("prompt", cfg.prompt.trim()),
                ("report_column", cfg.report_column.trim()),
                ("category", cfg.category.trim()),
            ];
            for (field, value) in required {
                if value.is_empty() {
                    violations.push(ConfigViolation::new(
                        ConfigErrorKind::MissingField,
                        subject.clone(),
                        format!("{field} is empty"),
                    ));
                    ok = false;
                }
            }

            if !id.is_empty() && index.contains_key(&StepId::new(id)) {
                violations.push(ConfigViolation::new(
                    ConfigErrorKind::DuplicateId,
                    subject.clone(),
                    "declared more than once",
                ));
                ok = false;
            }

            let column = cfg.report_column.trim();
            if !column.is_empty() && !columns.insert(column.to_string()) {
                violations.push(ConfigViolation::new(
                    ConfigErrorKind::DuplicateReportColumn,
                    subject.clone(),
                    format!("report column '{column}' is already used"),
                ));
                ok = false;
            }

            if !(cfg.max_score.is_finite() && cfg.max_score > 0.0) {
                violations.push(ConfigViolation::new(
                    ConfigErrorKind::InvalidScoreBound,
                    subject.clone(),
                    format!("max_score must be a positive number, got {}", cfg.max_score),
                ));
                ok = false;
            }
            if !(cfg.weight.is_finite() && cfg.weight >= 0.0) {
                violations.push(ConfigViolation::new(
                    ConfigErrorKind::InvalidScoreBound,
                    subject.clone(),
                    format!("weight must be a non-negative number, got {}", cfg.weight),
                ));
                ok = false;
            }

            let category = cfg.category.trim();
            if !category.is_empty() && !schema.contains(category) {
                violations.push(ConfigViolation::new(
                    ConfigErrorKind::UnknownCategory,
                    subject.clone(),
                    format!("category '{category}' is not declared"),
                ));
                ok = false;
            }

            if let Some(profile) = cfg.profile.as_deref() {
                if profile.trim().is_empty() {
                    violations.push(ConfigViolation::new(
                        ConfigErrorKind::MissingField,
                        subject.clone(),
                        "profile is present but empty",
                    ));
                    ok = false;
                }
            }

            if ok {
                index.insert(StepId::new(id), out.len());
                out.push(StepDefinition {
                    id: StepId::new(id),
                    title: cfg.title.trim().to_string(),
                    prompt: cfg.prompt.trim().to_string(),
                    category: CategoryId::new(category),
                    max_score: cfg.max_score,
                    is_fatal: cfg.is_fatal,
                    report_column: column.to_string(),
                    weight: cfg.weight,
                    profile: cfg.profile.as_deref().map(|p| p.trim().to_string()),
                });
            }
        }

        (Self { steps: out, index }, violations)
    }

    /// Steps in declaration order. Stable across calls.
    pub fn steps_in_order(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn by_id(&self, step_id: &str) -> ThreadAuditResult<&StepDefinition> {
        self.index
            .get(&StepId::new(step_id))
            .map(|&i| &self.steps[i])
            .ok_or_else(|| ThreadAuditError::StepNotFound {
                step_id: step_id.to_string(),
            })
    }

    /// Position of `step_id` in catalog order.
    pub fn position(&self, step_id: &StepId) -> Option<usize> {
        self.index.get(step_id).copied()
    }

    pub fn total_weight(&self) -> f64 {
        self.steps.iter().map(|s| s.weight).sum()
    }

    pub fn total_max_score(&self) -> f64 {
        self.steps.iter().map(|s| s.max_score).sum()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ── AuditCatalog ─────────────────────────────────────────────────────────────

/// Steps, categories, and settings loaded together from one catalog file.
///
/// Immutable once built. Share it behind an `Arc` across concurrent runs.
///
/// ```rust,ignore
/// use threadaudit_catalog::AuditCatalog;
///
/// let catalog = AuditCatalog::from_file(Path::new("catalogs/travel.toml"))?;
/// println!("{} steps", catalog.steps().len());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AuditCatalog {
    name: Option<String>,
    steps: StepCatalog,
    schema: CategorySchema,
    settings: AuditSettings,
}

impl AuditCatalog {
    /// Parse `s` as TOML and validate it.
    ///
    /// A TOML syntax or type error is reported as a single `Parse` violation;
    /// otherwise every semantic violation in the document is returned.
    pub fn from_toml_str(s: &str) -> ThreadAuditResult<Self> {
        let config: CatalogConfig = toml::from_str(s).map_err(|e| {
            ThreadAuditError::config(
                ConfigErrorKind::Parse,
                "catalog",
                format!("failed to parse catalog TOML: {e}"),
            )
        })?;
        Self::from_config(config)
    }

    pub fn from_file(path: &Path) -> ThreadAuditResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ThreadAuditError::config(
                ConfigErrorKind::Io,
                path.display().to_string(),
                format!("failed to read catalog file: {e}"),
            )
        })?;
        debug!(path = %path.display(), "loading catalog");
        Self::from_toml_str(&contents)
    }

    pub fn from_config(config: CatalogConfig) -> ThreadAuditResult<Self> {
        let mut violations = config.settings.violations();

        let (mut schema, category_violations) = CategorySchema::collect(&config.categories);
        violations.extend(category_violations);

        let (steps, step_violations) = StepCatalog::collect(&config.steps, &schema);
        violations.extend(step_violations);

        violations.extend(schema.bind(&steps, &config.steps));

        if config.steps.is_empty() {
            violations.push(ConfigViolation::new(
                ConfigErrorKind::MissingField,
                "catalog",
                "no steps are declared",
            ));
        } else if !steps.is_empty() && steps.total_weight() <= 0.0 {
            violations.push(ConfigViolation::new(
                ConfigErrorKind::InvalidScoreBound,
                "catalog",
                "total step weight must be positive",
            ));
        }

        violations.extend(header_collisions(&steps, &schema));

        if !violations.is_empty() {
            warn!(count = violations.len(), "catalog rejected");
            return Err(ThreadAuditError::Config { violations });
        }

        debug!(
            steps = steps.len(),
            categories = schema.len(),
            "catalog loaded"
        );
        Ok(Self {
            name: config.name,
            steps,
            schema,
            settings: config.settings,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn steps(&self) -> &StepCatalog {
        &self.steps
    }

    pub fn schema(&self) -> &CategorySchema {
        &self.schema
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Every oracle profile some step asks for.
    pub fn profiles(&self) -> BTreeSet<String> {
        self.steps
            .steps_in_order()
            .iter()
            .filter_map(|s| s.profile.clone())
            .collect()
    }

    /// Steps in report order: categories in schema order, members in
    /// catalog order within each.
    pub fn report_order(&self) -> Vec<&StepDefinition> {
        self.schema
            .categories_in_order()
            .iter()
            .flat_map(|c| c.members.iter())
            .filter_map(|id| self.steps.by_id(id.as_str()).ok())
            .collect()
    }
}

/// Category titles share the header namespace with step report columns.
fn header_collisions(steps: &StepCatalog, schema: &CategorySchema) -> Vec<ConfigViolation> {
    let columns: HashSet<&str> = steps
        .steps_in_order()
        .iter()
        .map(|s| s.report_column.as_str())
        .collect();
    let mut titles = HashSet::new();
    let mut violations = Vec::new();

    for category in schema.categories_in_order() {
        let title = category.title.as_str();
        if title.is_empty() {
            continue;
        }
        if columns.contains(title) {
            violations.push(ConfigViolation::new(
                ConfigErrorKind::DuplicateReportColumn,
                format!("category '{}'", category.id),
                format!("title '{title}' collides with a step report column"),
            ));
        } else if !titles.insert(title) {
            violations.push(ConfigViolation::new(
                ConfigErrorKind::DuplicateReportColumn,
                format!("category '{}'", category.id),
                format!("title '{title}' is used by another category"),
            ));
        }
    }
    violations
}
