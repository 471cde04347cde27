//! Validate-and-repair pass run on the editor's node map before saving.
//!
//! The editor runtime occasionally produces records with malformed
//! collections (a `null` props map, a child list that is an object, ...).
//! These are coerced to empty containers and reported. A record with no data
//! envelope at all cannot be repaired and aborts the save.
//!
//! The caller's map is never modified; repairs are applied to copies.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::json::kind_of;
use crate::node::{NodeView, StateKeys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Data,
    Properties,
    LinkedNodes,
    ChildIdentities,
}

impl core::fmt::Display for Field {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Field::Data => "data",
            Field::Properties => "properties",
            Field::LinkedNodes => "linkedNodes",
            Field::ChildIdentities => "childIdentities",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub node_id: String,
    pub display_name: String,
    pub field: Field,
    /// Offending value; `None` when the field was missing.
    pub found: Option<Value>,
    pub repaired: bool,
}

impl core::fmt::Display for Violation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "node {} ({}): {} ", self.node_id, self.display_name, self.field)?;
        match &self.found {
            Some(v) => write!(f, "was {}", kind_of(v))?,
            None => f.write_str("was missing")?,
        }
        if self.repaired {
            f.write_str(", replaced with an empty value")
        } else {
            f.write_str(", cannot be repaired")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn push(&mut self, v: Violation) {
        self.violations.push(v);
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    pub fn repaired_count(&self) -> usize {
        self.violations.iter().filter(|v| v.repaired).count()
    }

    pub fn unrecoverable_count(&self) -> usize {
        self.violations.iter().filter(|v| !v.repaired).count()
    }

    /// Non-blocking warning for the user when repairs were made.
    pub fn summary(&self) -> Option<String> {
        match self.repaired_count() {
            0 => None,
            1 => Some("1 issue was auto-fixed before saving".to_string()),
            n => Some(format!("{n} issues were auto-fixed before saving")),
        }
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

/// Outcome of checking one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Repair {
    /// Well formed, or legitimately absent. Leave the field as it is.
    Keep,
    /// Malformed; `found` is what was there (`None` if missing).
    Replace { found: Option<Value>, with: Value },
}

fn empty_map() -> Value {
    Value::Object(Map::new())
}

/// `properties` must always be a mapping.
pub fn repair_properties(current: Option<&Value>) -> Repair {
    match current {
        Some(Value::Object(_)) => Repair::Keep,
        other => Repair::Replace {
            found: other.cloned(),
            with: empty_map(),
        },
    }
}

/// `linkedNodes` may be absent; when present it must be a mapping.
pub fn repair_linked_nodes(current: Option<&Value>) -> Repair {
    match current {
        None | Some(Value::Object(_)) => Repair::Keep,
        Some(other) => Repair::Replace {
            found: Some(other.clone()),
            with: empty_map(),
        },
    }
}

/// Child identities may be absent or null; otherwise they must be a sequence.
pub fn repair_child_identities(current: Option<&Value>) -> Repair {
    match current {
        None | Some(Value::Null) | Some(Value::Array(_)) => Repair::Keep,
        Some(other) => Repair::Replace {
            found: Some(other.clone()),
            with: Value::Array(Vec::new()),
        },
    }
}

fn sanitize_envelope(
    view: &NodeView<'_>,
    envelope: &Map<String, Value>,
    keys: &StateKeys,
    report: &mut ValidationReport,
) -> Map<String, Value> {
    let mut data = envelope.clone();
    let checks: [(Field, &str, fn(Option<&Value>) -> Repair); 3] = [
        (Field::Properties, keys.properties.as_str(), repair_properties),
        (Field::LinkedNodes, keys.linked_nodes.as_str(), repair_linked_nodes),
        (Field::ChildIdentities, keys.child_identities.as_str(), repair_child_identities),
    ];
    for (field, key, check) in checks {
        if let Repair::Replace { found, with } = check(data.get(key)) {
            let violation = Violation {
                node_id: view.id.to_string(),
                display_name: view.display_name().to_string(),
                field,
                found,
                repaired: true,
            };
            tracing::warn!("{}", violation);
            report.push(violation);
            data.insert(key.to_string(), with);
        }
    }
    data
}

/// Check and repair every node. Never fails; an unrecoverable node shows up
/// as an unrepaired violation and is left out of the returned map.
pub fn sanitize(nodes: &Map<String, Value>, keys: &StateKeys) -> (Map<String, Value>, ValidationReport) {
    let mut report = ValidationReport::default();
    let mut out = Map::with_capacity(nodes.len());
    for (id, record) in nodes {
        let view = NodeView::new(id, record, keys);
        let Some(envelope) = view.envelope() else {
            let violation = Violation {
                node_id: id.clone(),
                display_name: view.display_name().to_string(),
                field: Field::Data,
                found: record.get(&keys.data).cloned(),
                repaired: false,
            };
            tracing::error!("{}", violation);
            report.push(violation);
            continue;
        };
        let data = sanitize_envelope(&view, envelope, keys, &mut report);
        out.insert(id.clone(), Value::Object(data));
    }
    (out, report)
}

#[derive(Debug, Clone)]
pub struct SanitizedState {
    /// Repaired `identity -> envelope` map that `json` was produced from.
    pub nodes: Map<String, Value>,
    pub json: String,
    pub report: ValidationReport,
}

/// Sanitize the node map and serialize the repaired copy for persistence.
pub fn sanitize_and_serialize(nodes: &Map<String, Value>, keys: &StateKeys) -> Result<SanitizedState> {
    let (out, report) = sanitize(nodes, keys);
    if report.unrecoverable_count() > 0 {
        tracing::error!(
            "Aborting save: {} node(s) have no data envelope",
            report.unrecoverable_count()
        );
        return Err(Error::UnrecoverableState { report });
    }
    if let Some(msg) = report.summary() {
        tracing::warn!("{}", msg);
    }
    let json = serde_json::to_string(&out)?;
    tracing::debug!("Serialized {} node(s), {} bytes", out.len(), json.len());
    Ok(SanitizedState {
        nodes: out,
        json,
        report,
    })
}
