//! Action seams: what a shortcut can trigger and where bindings are declared.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

/// An executable action.
pub trait Action: Send + Sync {
    fn id(&self) -> &str;

    /// Run the action. Resolves to `true` when the action handled the key.
    fn execute(&self) -> BoxFuture<'static, bool>;
}

/// Source of actions and of the bindings they declare.
pub trait ActionRegistry: Send + Sync {
    fn has_action(&self, id: &str) -> bool;

    fn action(&self, id: &str) -> Option<Arc<dyn Action>>;

    /// The subset of `ids` that is enabled in the current context, in the
    /// order given.
    fn applicable_actions(&self, ids: &[String]) -> Vec<Arc<dyn Action>>;

    /// Every statically registered action with its declared bindings.
    fn action_extensions(&self) -> Vec<ActionExtension>;
}

/// One declared default binding of an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    /// Whitespace separated chord steps, e.g. `"Ctrl+K Ctrl+C"`.
    pub shortcut: String,
    /// Comma separated platform list, e.g. `"mac,linux"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keybind_sets: Option<Vec<String>>,
}

impl Binding {
    pub fn new(shortcut: impl Into<String>) -> Self {
        Self {
            shortcut: shortcut.into(),
            platform: None,
            keybind_sets: None,
        }
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn keybind_sets<I, S>(mut self, sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keybind_sets = Some(sets.into_iter().map(Into::into).collect());
        self
    }
}

/// A statically registered action and its declared bindings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionExtension {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

impl ActionExtension {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            bindings: Vec::new(),
        }
    }

    pub fn binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }
}

type Executor = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// Caller-supplied action override.
pub type Handler = Executor;

/// Per-listener handlers keyed by action id. A handler replaces the action's
/// own `execute()` for keys dispatched with this map.
#[derive(Clone, Default)]
pub struct Handlers {
    map: HashMap<String, Handler>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F, Fut>(mut self, action: impl Into<String>, handler: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.map
            .insert(action.into(), Arc::new(move || handler().boxed()));
        self
    }

    pub fn get(&self, action: &str) -> Option<&Handler> {
        self.map.get(action)
    }

    pub fn contains(&self, action: &str) -> bool {
        self.map.contains_key(action)
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}

/// An action held by [`StaticActionRegistry`].
pub struct StaticAction {
    id: String,
    enabled: AtomicBool,
    executor: Option<Executor>,
}

impl StaticAction {
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl Action for StaticAction {
    fn id(&self) -> &str {
        &self.id
    }

    fn execute(&self) -> BoxFuture<'static, bool> {
        match &self.executor {
            Some(executor) => executor(),
            None => futures::future::ready(false).boxed(),
        }
    }
}

/// In-memory action registry built from a list of action extensions.
///
/// Actions start enabled; an action without an executor reports "not
/// handled" when executed.
#[derive(Default)]
pub struct StaticActionRegistry {
    extensions: Vec<ActionExtension>,
    actions: HashMap<String, Arc<StaticAction>>,
}

impl StaticActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_extensions(extensions: impl IntoIterator<Item = ActionExtension>) -> Self {
        let mut registry = Self::new();
        for extension in extensions {
            registry.register(extension);
        }
        registry
    }

    /// Register an action. Re-registering an id replaces its bindings.
    pub fn register(&mut self, extension: ActionExtension) {
        let id = extension.id.clone();
        if let Some(existing) = self.extensions.iter_mut().find(|e| e.id == id) {
            *existing = extension;
        } else {
            self.extensions.push(extension);
        }
        self.actions.entry(id.clone()).or_insert_with(|| {
            Arc::new(StaticAction {
                id,
                enabled: AtomicBool::new(true),
                executor: None,
            })
        });
    }

    /// Attach an executor to a registered action.
    pub fn set_executor<F, Fut>(&mut self, id: &str, executor: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let enabled = self.actions.get(id).map_or(true, |a| a.is_enabled());
        self.actions.insert(
            id.to_string(),
            Arc::new(StaticAction {
                id: id.to_string(),
                enabled: AtomicBool::new(enabled),
                executor: Some(Arc::new(move || executor().boxed())),
            }),
        );
    }

    pub fn set_enabled(&self, id: &str, enabled: bool) {
        if let Some(action) = self.actions.get(id) {
            action.enabled.store(enabled, Ordering::Relaxed);
        }
    }
}

impl ActionRegistry for StaticActionRegistry {
    fn has_action(&self, id: &str) -> bool {
        self.actions.contains_key(id)
    }

    fn action(&self, id: &str) -> Option<Arc<dyn Action>> {
        self.actions
            .get(id)
            .map(|a| Arc::clone(a) as Arc<dyn Action>)
    }

    fn applicable_actions(&self, ids: &[String]) -> Vec<Arc<dyn Action>> {
        let mut applicable: Vec<Arc<dyn Action>> = Vec::new();
        for id in ids {
            let Some(action) = self.actions.get(id) else {
                continue;
            };
            if !action.is_enabled() || applicable.iter().any(|a| a.id() == id) {
                continue;
            }
            applicable.push(Arc::clone(action) as Arc<dyn Action>);
        }
        applicable
    }

    fn action_extensions(&self) -> Vec<ActionExtension> {
        self.extensions.clone()
    }
}
