//! `{{path}}` token resolution for live-data text.
//!
//! A token names a path into the [`DataContext`], e.g. `{{user.name}}` or
//! `{{items[1].title}}`. Tokens that cannot be resolved are left in the output
//! exactly as written, braces included, so half-configured content stays
//! visible in the editor instead of disappearing.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::context::DataContext;
use crate::json::display_text;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*?)\}\}").expect("token pattern"));
static INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("index pattern"));

/// Split a token path into lookup segments.
///
/// `a[0].b` yields `a`, `0`, `b`. Segments are trimmed; empty segments are
/// kept and never match anything.
pub fn parse_path(path: &str) -> Vec<String> {
    let dotted = INDEX.replace_all(path, ".$1");
    dotted.split('.').map(|s| s.trim().to_string()).collect()
}

/// Walk `segments` from the context root.
pub fn lookup<'a, S: AsRef<str>>(ctx: &'a DataContext, segments: &[S]) -> Option<&'a Value> {
    let mut cur = ctx.root();
    for seg in segments {
        let seg = seg.as_ref();
        cur = match cur {
            Value::Object(map) => map.get(seg)?,
            Value::Array(items) => {
                if seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                items.get(seg.parse::<usize>().ok()?)?
            }
            _ => return None,
        };
    }
    match cur {
        Value::Null => None,
        v => Some(v),
    }
}

fn resolve_token(path: &str, ctx: &DataContext) -> Option<String> {
    lookup(ctx, parse_path(path).as_slice()).map(display_text)
}

/// Substitute every resolvable token in `template`.
pub fn resolve<'t>(template: &'t str, ctx: &DataContext) -> Cow<'t, str> {
    TOKEN.replace_all(template, |caps: &Captures<'_>| {
        let path = &caps[1];
        match resolve_token(path, ctx) {
            Some(text) => text,
            None => {
                tracing::debug!("Unresolved token {{{{{}}}}}", path);
                caps[0].to_string()
            }
        }
    })
}

/// Resolve a JSON value used as display text. Anything other than a string
/// is returned unchanged.
pub fn resolve_value(template: &Value, ctx: &DataContext) -> Value {
    match template {
        Value::String(s) => Value::String(resolve(s, ctx).into_owned()),
        other => other.clone(),
    }
}

/// Raw paths of all tokens in `template`, in order of appearance.
pub fn tokens(template: &str) -> Vec<&str> {
    TOKEN
        .captures_iter(template)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Tokens in `template` that do not resolve against `ctx`.
pub fn unresolved<'t>(template: &'t str, ctx: &DataContext) -> Vec<&'t str> {
    tokens(template)
        .into_iter()
        .filter(|path| resolve_token(path, ctx).is_none())
        .collect()
}
