use std::panic::AssertUnwindSafe;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::{Notification, RenderFn, Rendered, Renderer, TemplateStrings};

static TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("placeholder pattern is valid"));

pub const FALLBACK_TITLE: &str = "Notification";

/// Replace `{{ dotted.path }}` placeholders with values looked up in `payload`.
/// Missing or null values render as the empty string.
pub fn substitute(template: &str, payload: &Value) -> String {
    TEMPLATE_RE
        .replace_all(template, |caps: &regex::Captures| {
            resolve(&caps[1], payload).unwrap_or_default()
        })
        .to_string()
}

fn resolve(path: &str, payload: &Value) -> Option<String> {
    if path.is_empty() {
        return None;
    }

    let mut current = payload;
    for segment in path.split('.') {
        let segment = segment.trim();
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    match current {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Produce the renderer's own output for `payload`. Never fails: a callable
/// that errors, panics or returns a non-object yields an empty result.
pub fn render(renderer: &Renderer, payload: &Value) -> Rendered {
    match renderer {
        Renderer::Callable(f) => render_callable(f.as_ref(), payload),
        Renderer::TemplateStrings(strings) => render_strings(strings, payload),
        Renderer::BodyTemplate(body) => Rendered {
            body: Some(substitute(body, payload)),
            ..Rendered::default()
        },
    }
}

fn render_callable(f: &RenderFn, payload: &Value) -> Rendered {
    let output = match std::panic::catch_unwind(AssertUnwindSafe(|| f(payload))) {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::warn!("Template renderer failed: {e}");
            return Rendered::default();
        }
        Err(_) => {
            tracing::warn!("Template renderer panicked");
            return Rendered::default();
        }
    };

    let Value::Object(mut map) = output else {
        tracing::debug!("Template renderer returned a non-object, ignoring");
        return Rendered::default();
    };

    let title = map.remove("title").and_then(text_field);
    let body = map.remove("body").and_then(text_field);
    let data = map.remove("data").filter(|v| !v.is_null());

    Rendered {
        title,
        body,
        data,
        extra: map,
    }
}

fn render_strings(strings: &TemplateStrings, payload: &Value) -> Rendered {
    Rendered {
        title: strings.title.as_deref().map(|t| substitute(t, payload)),
        body: strings.body.as_deref().map(|b| substitute(b, payload)),
        data: Some(payload.clone()),
        extra: strings.extra.clone(),
    }
}

fn text_field(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Merge rendered output with the caller's payload fallbacks.
pub fn compose(rendered: Rendered, payload: &Value) -> Notification {
    let title = rendered
        .title
        .or_else(|| payload_text(payload, "title"))
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());
    let body = rendered.body.or_else(|| payload_text(payload, "message"));
    let data = rendered.data.unwrap_or_else(|| payload.clone());

    Notification {
        title,
        body,
        data,
        extra: strip_reserved(rendered.extra),
    }
}

fn payload_text(payload: &Value, field: &str) -> Option<String> {
    payload.get(field).cloned().and_then(text_field)
}

fn strip_reserved(mut extra: Map<String, Value>) -> Map<String, Value> {
    for key in ["title", "body", "data", "target"] {
        extra.remove(key);
    }
    extra
}
