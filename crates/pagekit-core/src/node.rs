//! Node records as the editor runtime hands them over.
//!
//! The node map is `identity -> record`, where each record wraps its
//! configuration in a data envelope:
//!
//! ```json
//! { "ROOT": { "id": "ROOT", "data": { "displayName": "Container",
//!     "props": {}, "nodes": ["a1"], "linkedNodes": {} } } }
//! ```
//!
//! Key names are configurable through [`StateKeys`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::json::read_json_file;

/// JSON key names of the envelope and its checked fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StateKeys {
    pub data: String,
    pub properties: String,
    pub linked_nodes: String,
    pub child_identities: String,
    pub display_name: String,
    pub name: String,
}

impl Default for StateKeys {
    fn default() -> Self {
        Self {
            data: "data".into(),
            properties: "props".into(),
            linked_nodes: "linkedNodes".into(),
            child_identities: "nodes".into(),
            display_name: "displayName".into(),
            name: "name".into(),
        }
    }
}

impl StateKeys {
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        Ok(serde_json::from_value(read_json_file(path)?)?)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    pub id: &'a str,
    record: &'a Value,
    keys: &'a StateKeys,
}

impl<'a> NodeView<'a> {
    pub fn new(id: &'a str, record: &'a Value, keys: &'a StateKeys) -> Self {
        Self { id, record, keys }
    }

    /// The data envelope, if the record has a usable one.
    pub fn envelope(&self) -> Option<&'a Map<String, Value>> {
        self.record.get(&self.keys.data)?.as_object()
    }

    pub fn display_name(&self) -> &'a str {
        self.envelope()
            .and_then(|data| {
                data.get(&self.keys.display_name)
                    .or_else(|| data.get(&self.keys.name))
            })
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
    }

    pub fn properties(&self) -> Option<&'a Map<String, Value>> {
        self.envelope()?.get(&self.keys.properties)?.as_object()
    }

    pub fn property(&self, name: &str) -> Option<&'a Value> {
        self.properties()?.get(name)
    }
}

/// Views over every record of a node map, in map order.
pub fn views<'a>(
    nodes: &'a Map<String, Value>,
    keys: &'a StateKeys,
) -> impl Iterator<Item = NodeView<'a>> + 'a {
    nodes
        .iter()
        .map(move |(id, record)| NodeView::new(id, record, keys))
}
