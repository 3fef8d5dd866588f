//! The `run` command: batch audit of conversation JSON files.
//!
//! Pipeline:
//!   1. Load the catalog, derive the report layout, and check that an
//!      existing CSV in `--out` has the same columns (fail fast)
//!   2. Resolve the oracle backend and one backend per catalog profile
//!   3. Read `*.json` conversations; unreadable files count as failed
//!   4. Audit the batch, consulting the ledger when one is given
//!   5. Write `<stem>_report.json` per audited thread; a failed write marks
//!      only that thread as failed
//!   6. Append rows to the batch CSV (header only for a new file) and
//!      persist the ledger

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use threadaudit_catalog::AuditCatalog;
use threadaudit_contracts::{
    conversation::Conversation,
    error::{ThreadAuditError, ThreadAuditResult},
    result::AuditResult,
};
use threadaudit_core::{AuditOrchestrator, ConversationOutcome, ReasoningOracle, RunLedger};
use threadaudit_ledger::InMemoryLedger;
use threadaudit_oracle::{build_router, config::process_env, OracleConfig, OracleOverrides};
use threadaudit_report::{header_record, rows_to_csv, to_csv, ReportLayout, ReportMeta, ReportRow};

pub const CSV_FILE_NAME: &str = "audit_report.csv";

pub struct RunPaths {
    pub catalog: PathBuf,
    pub input: PathBuf,
    pub out: PathBuf,
    pub ledger: Option<PathBuf>,
}

#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub csv_path: PathBuf,
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> ThreadAuditError {
    ThreadAuditError::Io {
        reason: format!("failed to {action} '{}': {err}", path.display()),
    }
}

/// `*.json` files under `input` (sorted), or `input` itself if it is a file.
pub fn discover_inputs(input: &Path) -> ThreadAuditResult<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let entries = std::fs::read_dir(input).map_err(|e| io_error("read directory", input, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| io_error("read directory", input, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "conversation".to_string())
}

/// Parse one conversation file. A missing `conversation_id` defaults to the
/// file stem.
pub fn load_conversation(path: &Path) -> ThreadAuditResult<Conversation> {
    let text = std::fs::read_to_string(path).map_err(|e| io_error("read", path, e))?;
    let mut conversation: Conversation =
        serde_json::from_str(&text).map_err(|e| ThreadAuditError::Input {
            reason: format!("'{}' is not a valid conversation: {e}", path.display()),
        })?;
    if conversation.conversation_id.is_none() {
        conversation.conversation_id = Some(file_stem(path));
    }
    Ok(conversation)
}

/// Check that an existing CSV at `path` was written for this layout.
///
/// Returns `true` when the file is missing or empty and needs a header.
fn csv_needs_header(path: &Path, layout: &ReportLayout) -> ThreadAuditResult<bool> {
    if !path.exists() {
        return Ok(true);
    }
    let existing = std::fs::read_to_string(path).map_err(|e| io_error("read", path, e))?;
    if existing.is_empty() {
        return Ok(true);
    }
    if existing.starts_with(&header_record(layout)) {
        return Ok(false);
    }
    Err(ThreadAuditError::Input {
        reason: format!(
            "'{}' has different report columns than this catalog; move it aside or choose another --out",
            path.display()
        ),
    })
}

/// Append `rows` to the batch CSV, writing the header first for a new file.
fn append_csv(
    path: &Path,
    layout: &ReportLayout,
    rows: &[ReportRow],
    needs_header: bool,
) -> ThreadAuditResult<()> {
    let text = if needs_header {
        to_csv(layout, rows)
    } else {
        rows_to_csv(rows)
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_error("open", path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| io_error("write", path, e))
}

/// Render the CSV row and write `<stem>_report.json` for one audit.
fn write_report(
    out: &Path,
    stem: &str,
    layout: &ReportLayout,
    meta: &ReportMeta,
    result: &AuditResult,
) -> ThreadAuditResult<ReportRow> {
    let row = ReportRow::render(layout, meta, result)?;
    let json_path = out.join(format!("{stem}_report.json"));
    let json = serde_json::to_string_pretty(result).map_err(|e| ThreadAuditError::Io {
        reason: format!("failed to serialize result for '{stem}': {e}"),
    })?;
    std::fs::write(&json_path, json).map_err(|e| io_error("write", &json_path, e))?;
    Ok(row)
}

pub async fn execute(paths: RunPaths, overrides: &OracleOverrides) -> ThreadAuditResult<RunSummary> {
    // ── 1. Catalog, layout, output ───────────────────────────────────────────
    let catalog = Arc::new(AuditCatalog::from_file(&paths.catalog)?);
    let layout = ReportLayout::for_catalog(&catalog)?;
    std::fs::create_dir_all(&paths.out).map_err(|e| io_error("create", &paths.out, e))?;
    let csv_path = paths.out.join(CSV_FILE_NAME);
    let needs_header = csv_needs_header(&csv_path, &layout)?;

    // ── 2. Oracle ─────────────────────────────────────────────────────────────
    let base = OracleConfig::resolve(overrides, &process_env)?;
    let router = build_router(base, catalog.profiles(), &process_env)?;
    let oracle: Arc<dyn ReasoningOracle> = Arc::new(router);

    // ── 3. Inputs ─────────────────────────────────────────────────────────────
    let mut summary = RunSummary {
        csv_path,
        ..RunSummary::default()
    };
    let mut stems = Vec::new();
    let mut conversations = Vec::new();
    for path in discover_inputs(&paths.input)? {
        match load_conversation(&path) {
            Ok(conversation) => {
                stems.push(file_stem(&path));
                conversations.push(conversation);
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "skipping unreadable conversation");
                summary.failed += 1;
            }
        }
    }
    if conversations.is_empty() && summary.failed == 0 {
        warn!(input = %paths.input.display(), "no conversation files found");
    }

    // ── 4. Audit ─────────────────────────────────────────────────────────────
    let ledger = match &paths.ledger {
        Some(path) if path.exists() => Some(Arc::new(InMemoryLedger::load_from(path)?)),
        Some(_) => Some(Arc::new(InMemoryLedger::new())),
        None => None,
    };
    let outcomes = AuditOrchestrator::new(oracle)
        .run_batch(
            conversations.clone(),
            Arc::clone(&catalog),
            ledger.clone().map(|l| l as Arc<dyn RunLedger>),
        )
        .await;

    // ── 5. Reports ───────────────────────────────────────────────────────────
    let mut rows = Vec::new();

    for ((stem, conversation), outcome) in stems.iter().zip(&conversations).zip(outcomes) {
        match outcome {
            ConversationOutcome::Audited {
                case_number,
                result,
                ..
            } => {
                let meta = ReportMeta::from_conversation(conversation, case_number);
                match write_report(&paths.out, stem, &layout, &meta, &result) {
                    Ok(row) => {
                        rows.push(row);
                        summary.processed += 1;
                        info!(
                            conversation = %conversation.label(),
                            final_score = result.final_score,
                            fatal = result.fatal_transaction,
                            "audit written"
                        );
                    }
                    Err(e) => {
                        error!(
                            conversation = %conversation.label(),
                            error = %e,
                            "audited but report could not be written"
                        );
                        summary.failed += 1;
                    }
                }
            }
            ConversationOutcome::Skipped { case_number, .. } => {
                info!(
                    conversation = %conversation.label(),
                    case_number = %case_number,
                    "already audited; skipped"
                );
                summary.skipped += 1;
            }
            ConversationOutcome::Failed { error, .. } => {
                error!(conversation = %conversation.label(), error = %error, "audit failed");
                summary.failed += 1;
            }
        }
    }

    // ── 6. CSV and ledger ────────────────────────────────────────────────────
    // Save the ledger before surfacing a CSV error.
    let csv_written = append_csv(&summary.csv_path, &layout, &rows, needs_header);
    if let (Some(ledger), Some(path)) = (ledger, &paths.ledger) {
        ledger.save_to(path)?;
    }
    csv_written?;

    Ok(summary)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::Path;

    use threadaudit_contracts::error::ThreadAuditError;

    use super::*;

    const CONVERSATION: &str = r#"{
        "transaction_id": "PNR7QK2",
        "messages": [
            {
                "sender": "customer@mail.example",
                "recipients": ["desk@travel.example"],
                "subject": "Quote",
                "timestamp": "2026-03-02T09:12:00Z",
                "body": "Please quote LHR-SYD on 14 April."
            }
        ]
    }"#;

    /// One step, no retries, so an unreachable oracle fails fast.
    const CATALOG: &str = r#"
        [settings.evaluation]
        max_retries = 0
        step_timeout_secs = 5

        [[categories]]
        id = "main"
        title = "Main"

        [[steps]]
        id = "quote"
        title = "Quote"
        prompt = "Was a quote given?"
        category = "main"
        max_score = 3.0
        report_column = "Quotation"
    "#;

    fn unreachable_oracle() -> OracleOverrides {
        OracleOverrides {
            provider: Some("openai".into()),
            base_url: Some("http://127.0.0.1:9".into()),
            api_key: Some("test-key".into()),
            ..OracleOverrides::default()
        }
    }

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    // ── Inputs ────────────────────────────────────────────────────────────────

    #[test]
    fn test_discover_inputs_filters_and_sorts_json() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.json", "{}");
        write(dir.path(), "a.json", "{}");
        write(dir.path(), "notes.txt", "ignore me");

        let found = discover_inputs(dir.path()).unwrap();
        let names: Vec<String> = found.iter().map(|p| file_stem(p)).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_discover_inputs_accepts_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "only.json", "{}");
        assert_eq!(discover_inputs(&file).unwrap(), vec![file]);
    }

    #[test]
    fn test_missing_input_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_inputs(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, ThreadAuditError::Io { .. }));
    }

    #[test]
    fn test_conversation_id_defaults_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "thread-42.json", CONVERSATION);

        let conversation = load_conversation(&path).unwrap();
        assert_eq!(conversation.conversation_id.as_deref(), Some("thread-42"));
        assert_eq!(conversation.transaction_id.as_deref(), Some("PNR7QK2"));
    }

    #[test]
    fn test_invalid_conversation_json_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.json", "{\"messages\": 3}");
        assert!(matches!(
            load_conversation(&path).unwrap_err(),
            ThreadAuditError::Input { .. }
        ));
    }

    // ── End to end ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_execute_with_unreachable_oracle_still_reports() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        write(&input, "thread-1.json", CONVERSATION);
        write(&input, "broken.json", "not json");
        let catalog = write(dir.path(), "catalog.toml", CATALOG);
        let out = dir.path().join("out");
        let ledger = dir.path().join("ledger.json");

        let overrides = unreachable_oracle();
        let paths = || RunPaths {
            catalog: catalog.clone(),
            input: input.clone(),
            out: out.clone(),
            ledger: Some(ledger.clone()),
        };

        let summary = execute(paths(), &overrides).await.unwrap();
        assert_eq!(summary.processed, 1, "errored steps still produce a row");
        assert_eq!(summary.failed, 1, "unparsable file counts as failed");
        assert!(out.join("thread-1_report.json").exists());

        let csv = std::fs::read_to_string(out.join(CSV_FILE_NAME)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Quotation"));
        assert!(lines[1].contains(",ERROR,"), "{}", lines[1]);
        assert!(ledger.exists());

        // Second run: the ledger skips the audited thread and the CSV keeps
        // the first run's row.
        let again = execute(paths(), &overrides).await.unwrap();
        assert_eq!(again.processed, 0);
        assert_eq!(again.skipped, 1);
        let csv = std::fs::read_to_string(out.join(CSV_FILE_NAME)).unwrap();
        assert_eq!(csv.lines().count(), 2, "re-run must not drop earlier rows: {csv}");
    }

    #[tokio::test]
    async fn test_new_rows_are_appended_under_one_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        let catalog = write(dir.path(), "catalog.toml", CATALOG);
        let out = dir.path().join("out");
        let ledger = dir.path().join("ledger.json");
        let paths = || RunPaths {
            catalog: catalog.clone(),
            input: input.clone(),
            out: out.clone(),
            ledger: Some(ledger.clone()),
        };

        write(&input, "first.json", CONVERSATION);
        execute(paths(), &unreachable_oracle()).await.unwrap();
        write(&input, "second.json", &CONVERSATION.replace("LHR-SYD", "LHR-DOH"));
        let summary = execute(paths(), &unreachable_oracle()).await.unwrap();
        assert_eq!((summary.processed, summary.skipped), (1, 1));

        let csv = std::fs::read_to_string(out.join(CSV_FILE_NAME)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3, "{csv}");
        assert_eq!(lines.iter().filter(|l| l.starts_with("Audit ID,")).count(), 1);
        assert!(lines[1].contains(",first,") && lines[2].contains(",second,"), "{csv}");
    }

    #[tokio::test]
    async fn test_existing_csv_with_other_columns_fails_before_auditing() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "thread.json", CONVERSATION);
        let catalog = write(dir.path(), "catalog.toml", CATALOG);
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        write(&out, CSV_FILE_NAME, "Some,Other,Columns\r\n1,2,3\r\n");

        let err = execute(
            RunPaths {
                catalog,
                input,
                out: out.clone(),
                ledger: None,
            },
            &unreachable_oracle(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ThreadAuditError::Input { .. }), "{err}");
        assert!(!out.join("thread_report.json").exists(), "no thread is audited");
        assert_eq!(
            std::fs::read_to_string(out.join(CSV_FILE_NAME)).unwrap(),
            "Some,Other,Columns\r\n1,2,3\r\n"
        );
    }

    #[tokio::test]
    async fn test_report_write_failure_only_fails_that_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        write(&input, "a.json", CONVERSATION);
        write(&input, "b.json", &CONVERSATION.replace("LHR-SYD", "LHR-DOH"));
        let catalog = write(dir.path(), "catalog.toml", CATALOG);
        let out = dir.path().join("out");
        std::fs::create_dir_all(out.join("b_report.json")).unwrap();
        let ledger = dir.path().join("ledger.json");

        let summary = execute(
            RunPaths {
                catalog,
                input,
                out: out.clone(),
                ledger: Some(ledger.clone()),
            },
            &unreachable_oracle(),
        )
        .await
        .unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 1, "the unwritable report fails only thread b");
        assert!(out.join("a_report.json").is_file());
        let csv = std::fs::read_to_string(out.join(CSV_FILE_NAME)).unwrap();
        assert_eq!(csv.lines().count(), 2, "{csv}");
        assert!(ledger.exists(), "the ledger is still saved");
    }
}
