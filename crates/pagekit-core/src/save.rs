//! Save handling around the sanitizer.
//!
//! A save bundles the post/template metadata from the form with the
//! serialized editor state. Transport is up to the caller; this module only
//! produces the ordered form fields and tracks whether there are unsaved
//! changes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::node::StateKeys;
use crate::sanitize::{SanitizedState, ValidationReport, sanitize_and_serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDraft {
    pub title: String,
    pub category_id: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "draft".to_string()
}

impl SaveDraft {
    pub fn new(title: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category_id: category_id.into(),
            slug: None,
            status: default_status(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidDraft("title is required".into()));
        }
        if self.category_id.trim().is_empty() {
            return Err(Error::InvalidDraft("category is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub draft: SaveDraft,
    pub state: SanitizedState,
    pub prepared_at: DateTime<Utc>,
}

impl SaveRequest {
    pub fn report(&self) -> &ValidationReport {
        &self.state.report
    }

    /// Multipart form fields in submission order.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("title", self.draft.title.trim().to_string()),
            ("category_id", self.draft.category_id.clone()),
        ];
        if let Some(slug) = self.draft.slug.as_deref().filter(|s| !s.is_empty()) {
            fields.push(("slug", slug.to_string()));
        }
        fields.push(("status", self.draft.status.clone()));
        fields.push((
            "updated_at",
            self.prepared_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
        fields.push(("content", self.state.json.clone()));
        fields
    }
}

/// Validate the draft, then sanitize and serialize the editor state.
pub fn prepare_save(draft: &SaveDraft, nodes: &Map<String, Value>, keys: &StateKeys) -> Result<SaveRequest> {
    draft.validate()?;
    let state = sanitize_and_serialize(nodes, keys)?;
    tracing::info!(
        "Prepared save for \"{}\" ({} node(s), {} repaired)",
        draft.title.trim(),
        state.nodes.len(),
        state.report.repaired_count()
    );
    Ok(SaveRequest {
        draft: draft.clone(),
        state,
        prepared_at: Utc::now(),
    })
}

/// Unsaved-changes indicator for one editing session.
#[derive(Debug, Default)]
pub struct UnsavedChanges {
    dirty: bool,
    in_flight: bool,
}

impl UnsavedChanges {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight
    }

    pub fn begin_save(&mut self) -> Result<()> {
        if self.in_flight {
            return Err(Error::SaveInFlight);
        }
        self.in_flight = true;
        Ok(())
    }

    /// Only a successful save clears the dirty flag.
    pub fn finish_save<T, E>(&mut self, outcome: &std::result::Result<T, E>) {
        self.in_flight = false;
        if outcome.is_ok() {
            self.dirty = false;
        }
    }
}
