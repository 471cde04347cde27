//! Live-data text for the display components that support token binding.
//!
//! Only headings and text blocks bind data; their `text` property is run
//! through the resolver on every render. Everything else renders as-is.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::DataContext;
use crate::node::{NodeView, StateKeys, views};
use crate::resolve::{resolve_value, unresolved};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoundComponent {
    Heading,
    Text,
}

impl BoundComponent {
    pub fn from_display_name(name: &str) -> Option<Self> {
        match name {
            "Heading" => Some(Self::Heading),
            "Text" | "Paragraph" => Some(Self::Text),
            _ => None,
        }
    }

    /// Property holding the bindable text.
    pub fn text_property(self) -> &'static str {
        "text"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedText {
    pub node_id: String,
    pub component: BoundComponent,
    pub text: Value,
    /// Token paths left unreplaced in `text`.
    pub unresolved: Vec<String>,
}

/// Resolve the bound text of one node. `None` for components that do not
/// bind data or have no text property.
pub fn render_node(view: &NodeView<'_>, ctx: &DataContext) -> Option<RenderedText> {
    let component = BoundComponent::from_display_name(view.display_name())?;
    let raw = view.property(component.text_property())?;
    let missing: Vec<String> = raw
        .as_str()
        .map(|s| unresolved(s, ctx).into_iter().map(|p| p.trim().to_string()).collect())
        .unwrap_or_default();
    Some(RenderedText {
        node_id: view.id.to_string(),
        component,
        text: resolve_value(raw, ctx),
        unresolved: missing,
    })
}

/// Bound text of every heading and text node in the map.
pub fn render_all(nodes: &Map<String, Value>, keys: &StateKeys, ctx: &DataContext) -> Vec<RenderedText> {
    views(nodes, keys)
        .filter_map(|view| render_node(&view, ctx))
        .collect()
}
