//! pagekit-core: editor state persistence and live-data text binding
//!
//! This crate focuses on a small, well-factored surface:
//! - Token resolution of `{{path}}` placeholders against a data context
//! - Validate-and-repair of the editor's node map before it is saved
//! - Text binding for the display components that support live data
//! - Save request assembly and the unsaved-changes tracker
//!
pub mod context;
pub mod error;
pub mod json;
pub mod node;
pub mod render;
pub mod resolve;
pub mod sanitize;
pub mod save;

pub use context::{ContextProvider, DataContext};
pub use error::{Error, Result};
pub use node::{NodeView, StateKeys};
pub use render::{BoundComponent, RenderedText, render_all, render_node};
pub use resolve::{parse_path, resolve, resolve_value, tokens};
pub use sanitize::{
    Field, SanitizedState, ValidationReport, Violation, sanitize, sanitize_and_serialize,
};
pub use save::{SaveDraft, SaveRequest, UnsavedChanges, prepare_save};
