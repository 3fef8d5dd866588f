//! The structured email thread consumed by an audit.
//!
//! Conversations are produced upstream (EML parsing is not part of this
//! workspace) and arrive as JSON. This module only validates them and renders
//! the plain-text transcript the oracle reads.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ThreadAuditError, ThreadAuditResult};

/// Metadata about one attachment. Content is never carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// A single email in a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub subject: String,
    /// UTC-normalized send time.
    pub timestamp: DateTime<Utc>,
    pub body: String,
    /// Previously quoted thread text, if the parser separated it out.
    #[serde(default)]
    pub quoted: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentMeta>,
}

/// One customer-service email thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Caller-assigned identifier (file stem, ticket id, ...).
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Booking or transaction reference, if the parser found one.
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Reject conversations no audit step could meaningfully judge.
    pub fn validate(&self) -> ThreadAuditResult<()> {
        if self.messages.is_empty() {
            return Err(ThreadAuditError::Input {
                reason: format!("conversation {} has no messages", self.label()),
            });
        }
        if let Some(idx) = self.messages.iter().position(|m| m.sender.trim().is_empty()) {
            return Err(ThreadAuditError::Input {
                reason: format!(
                    "conversation {} message {} has no sender",
                    self.label(),
                    idx + 1
                ),
            });
        }
        if self.messages.iter().all(|m| m.body.trim().is_empty()) {
            return Err(ThreadAuditError::Input {
                reason: format!("conversation {} has only empty bodies", self.label()),
            });
        }
        Ok(())
    }

    /// Human-readable identifier for logs and error messages.
    pub fn label(&self) -> String {
        self.conversation_id
            .as_deref()
            .map(|id| format!("'{id}'"))
            .unwrap_or_else(|| "<unnamed>".to_string())
    }

    /// Messages sorted oldest first. Ties keep their original order.
    pub fn chronological(&self) -> Vec<&Message> {
        let mut ordered: Vec<&Message> = self.messages.iter().collect();
        ordered.sort_by_key(|m| m.timestamp);
        ordered
    }

    /// Time of the earliest message; used as the transaction date in reports.
    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.messages.iter().map(|m| m.timestamp).min()
    }

    /// Every sender and recipient, sorted and de-duplicated.
    pub fn participants(&self) -> Vec<String> {
        let mut set = BTreeSet::new();
        for m in &self.messages {
            set.insert(m.sender.clone());
            set.extend(m.recipients.iter().cloned());
            set.extend(m.cc.iter().cloned());
        }
        set.into_iter().collect()
    }

    /// Render the thread as the plain-text transcript given to the oracle.
    pub fn transcript(&self) -> String {
        let ordered = self.chronological();
        let total = ordered.len();
        let mut out = String::new();

        for (idx, m) in ordered.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "--- Message {} of {} ---", idx + 1, total);
            let _ = writeln!(out, "From: {}", m.sender);
            if !m.recipients.is_empty() {
                let _ = writeln!(out, "To: {}", m.recipients.join(", "));
            }
            if !m.cc.is_empty() {
                let _ = writeln!(out, "Cc: {}", m.cc.join(", "));
            }
            let _ = writeln!(out, "Date: {}", m.timestamp.to_rfc3339());
            let _ = writeln!(out, "Subject: {}", m.subject);
            if !m.attachments.is_empty() {
                let names = m
                    .attachments
                    .iter()
                    .map(|a| match &a.content_type {
                        Some(ct) => format!("{} ({ct})", a.filename),
                        None => a.filename.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(out, "Attachments: {names}");
            }
            out.push('\n');
            let _ = writeln!(out, "{}", m.body.trim_end());
            if let Some(quoted) = m.quoted.as_deref().filter(|q| !q.trim().is_empty()) {
                out.push('\n');
                for line in quoted.lines() {
                    let _ = writeln!(out, "> {line}");
                }
            }
        }
        out
    }
}
