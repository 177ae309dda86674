//! Template registry and renderers for notification content.

pub mod render;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RenderError;

pub use render::{compose, substitute};

pub const DEFAULT_TEMPLATE: &str = "default";

pub type RenderFn = dyn Fn(&Value) -> Result<Value, RenderError> + Send + Sync;

/// How to turn a payload into title/body text.
#[derive(Clone)]
pub enum Renderer {
    /// Called with the payload; an object result supplies `title`, `body`,
    /// `data` and any extra fields.
    Callable(Arc<RenderFn>),
    TemplateStrings(TemplateStrings),
    /// Body-only template; the title falls back to the payload.
    BodyTemplate(String),
}

impl Renderer {
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, RenderError> + Send + Sync + 'static,
    {
        Renderer::Callable(Arc::new(f))
    }

    pub fn strings(title: Option<&str>, body: Option<&str>) -> Self {
        Renderer::TemplateStrings(TemplateStrings {
            title: title.map(str::to_string),
            body: body.map(str::to_string),
            extra: Map::new(),
        })
    }

    pub fn body(template: impl Into<String>) -> Self {
        Renderer::BodyTemplate(template.into())
    }

    /// Build a renderer from its JSON form: a string is a body template, an
    /// object holds optional `title`/`body` templates plus pass-through fields.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Renderer::BodyTemplate(s.clone())),
            Value::Object(map) => {
                let mut extra = map.clone();
                let title = take_string(&mut extra, "title");
                let body = take_string(&mut extra, "body");
                Some(Renderer::TemplateStrings(TemplateStrings { title, body, extra }))
            }
            _ => None,
        }
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !map.get(key).is_some_and(Value::is_string) {
        return None;
    }
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Renderer::Callable(_) => f.write_str("Callable(..)"),
            Renderer::TemplateStrings(strings) => {
                f.debug_tuple("TemplateStrings").field(strings).finish()
            }
            Renderer::BodyTemplate(body) => f.debug_tuple("BodyTemplate").field(body).finish(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateStrings {
    pub title: Option<String>,
    pub body: Option<String>,
    /// Fields copied to the output as-is.
    pub extra: Map<String, Value>,
}

/// Output of a single renderer before payload fallbacks are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    pub title: Option<String>,
    pub body: Option<String>,
    pub data: Option<Value>,
    pub extra: Map<String, Value>,
}

/// Final content handed to delivery channels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: Option<String>,
    pub data: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_renderer() -> Renderer {
    Renderer::callable(|_| Ok(Value::Object(Map::new())))
}

/// Mapping from template key to renderer. A `default` entry always exists.
pub struct TemplateRegistry {
    renderers: RwLock<HashMap<String, Renderer>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        let mut renderers = HashMap::new();
        renderers.insert(DEFAULT_TEMPLATE.to_string(), default_renderer());
        Self {
            renderers: RwLock::new(renderers),
        }
    }

    /// Merge `templates` into the registry; later keys replace earlier ones.
    pub fn configure<I, K>(&self, templates: I)
    where
        I: IntoIterator<Item = (K, Renderer)>,
        K: Into<String>,
    {
        let mut renderers = self.renderers.write().unwrap_or_else(|e| e.into_inner());
        for (key, renderer) in templates {
            let key = key.into();
            tracing::debug!("Registered template '{key}'");
            renderers.insert(key, renderer);
        }
    }

    pub fn get(&self, key: &str) -> Option<Renderer> {
        self.renderers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .renderers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Pick a renderer: `payload.templateKey`, then a string `target`, then
    /// `default`.
    pub fn resolve(&self, target: &Value, payload: &Value) -> Renderer {
        let by_payload = payload.get("templateKey").and_then(Value::as_str);
        let by_target = target.as_str();

        by_payload
            .and_then(|key| self.get(key))
            .or_else(|| by_target.and_then(|key| self.get(key)))
            .or_else(|| self.get(DEFAULT_TEMPLATE))
            .unwrap_or_else(default_renderer)
    }

    /// Resolve, render and apply payload fallbacks.
    pub fn render(&self, target: &Value, payload: &Value) -> Notification {
        let renderer = self.resolve(target, payload);
        render::compose(render::render(&renderer, payload), payload)
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
