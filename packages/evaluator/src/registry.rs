//! Component registry: tag name to renderable component
//!
//! The registry is append-only. Readers take a [`RegistrySnapshot`], an `Arc`
//! of the current map, so a compile never observes a registration that lands
//! halfway through it. Writers copy the map, insert, and swap the `Arc`.

use crate::builtins;
use crate::vdom::{Props, VNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error a component raises when it cannot render its props
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("<{component}> received an invalid `{prop}` prop: {message}")]
    InvalidProp {
        component: String,
        prop: String,
        message: String,
    },

    #[error("<{component}> failed to render: {message}")]
    Failed { component: String, message: String },
}

impl RenderError {
    pub fn invalid_prop(
        component: impl Into<String>,
        prop: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidProp {
            component: component.into(),
            prop: prop.into(),
            message: message.into(),
        }
    }
}

/// Something that turns props and already-rendered children into a node
pub trait RenderComponent: Send + Sync {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError>;
}

impl<F> RenderComponent for F
where
    F: Fn(&Props, Vec<VNode>) -> Result<VNode, RenderError> + Send + Sync,
{
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        self(props, children)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentOrigin {
    BuiltIn,
    Custom,
}

/// Registry entry
#[derive(Clone)]
pub struct ComponentDescriptor {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub origin: ComponentOrigin,
    pub renderer: Arc<dyn RenderComponent>,
}

impl ComponentDescriptor {
    pub fn new(
        name: impl Into<String>,
        renderer: impl RenderComponent + 'static,
    ) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            description: None,
            origin: ComponentOrigin::Custom,
            renderer: Arc::new(renderer),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn built_in(mut self) -> Self {
        self.origin = ComponentOrigin::BuiltIn;
        self
    }

    pub fn is_builtin(&self) -> bool {
        self.origin == ComponentOrigin::BuiltIn
    }

    pub fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        self.renderer.render(props, children)
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("description", &self.description)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// User-authored component definition from the authoring flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomComponentSpec {
    pub name: String,
    pub label: String,
    /// Source snippet inserted into the document when the component is used
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Component `{name}` is already registered")]
    DuplicateTag { name: String, builtin: bool },

    #[error("Invalid component name `{name}`: {reason}")]
    InvalidName { name: String, reason: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// What to do when a custom tag is registered twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Replace,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Added,
    Replaced,
    Ignored,
}

type Entries = HashMap<String, ComponentDescriptor>;

/// Shared, append-only component registry. Clones share the same entries.
#[derive(Clone)]
pub struct ComponentRegistry {
    entries: Arc<RwLock<Arc<Entries>>>,
    policy: DuplicatePolicy,
}

impl ComponentRegistry {
    /// Registry with no components at all
    pub fn empty() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Arc::new(HashMap::new()))),
            policy: DuplicatePolicy::default(),
        }
    }

    /// Registry holding the built-in component set
    pub fn with_builtins() -> Self {
        let mut entries = HashMap::new();
        for descriptor in builtins::descriptors() {
            entries.insert(descriptor.name.clone(), descriptor.built_in());
        }
        info!(count = entries.len(), "Registered built-in components");

        Self {
            entries: Arc::new(RwLock::new(Arc::new(entries))),
            policy: DuplicatePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    fn current(&self) -> Arc<Entries> {
        let guard = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Add a component under `descriptor.name`. Built-in tags can never be
    /// overwritten; custom tags follow the duplicate policy.
    pub fn register(&self, descriptor: ComponentDescriptor) -> RegistryResult<RegisterOutcome> {
        validate_name(&descriptor.name)?;

        let mut guard = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let outcome = match guard.get(&descriptor.name) {
            Some(existing) if existing.is_builtin() => {
                warn!(name = %descriptor.name, "Rejected attempt to override a built-in component");
                return Err(RegistryError::DuplicateTag {
                    name: descriptor.name,
                    builtin: true,
                });
            }
            Some(_) => match self.policy {
                DuplicatePolicy::Reject => {
                    return Err(RegistryError::DuplicateTag {
                        name: descriptor.name,
                        builtin: false,
                    })
                }
                DuplicatePolicy::Ignore => {
                    debug!(name = %descriptor.name, "Ignoring duplicate registration");
                    return Ok(RegisterOutcome::Ignored);
                }
                DuplicatePolicy::Replace => RegisterOutcome::Replaced,
            },
            None => RegisterOutcome::Added,
        };

        let mut next = Entries::clone(&guard);
        debug!(name = %descriptor.name, ?outcome, "Registered component");
        next.insert(descriptor.name.clone(), descriptor);
        *guard = Arc::new(next);

        Ok(outcome)
    }

    /// Register a user-authored component as a generic container
    pub fn register_custom(&self, spec: &CustomComponentSpec) -> RegistryResult<RegisterOutcome> {
        let mut descriptor = ComponentDescriptor::new(
            spec.name.clone(),
            builtins::CustomContainer::new(&spec.name),
        )
        .with_label(spec.label.clone());
        descriptor.description = spec.description.clone();
        self.register(descriptor)
    }

    pub fn lookup(&self, name: &str) -> Option<ComponentDescriptor> {
        self.current().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.current().contains_key(name)
    }

    /// Immutable view of the registry as it is right now
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            entries: self.current(),
        }
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        self.snapshot().names()
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Point-in-time view of a registry, cheap to clone and share across threads
#[derive(Clone, Debug)]
pub struct RegistrySnapshot {
    entries: Arc<Entries>,
}

impl RegistrySnapshot {
    pub fn get(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Descriptors sorted by name
    pub fn descriptors(&self) -> Vec<&ComponentDescriptor> {
        let mut all: Vec<&ComponentDescriptor> = self.entries.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_name(name: &str) -> RegistryResult<()> {
    let invalid = |reason: &str| {
        Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    let Some(first) = name.chars().next() else {
        return invalid("name is empty");
    };
    if !first.is_ascii_alphabetic() {
        return invalid("must start with a letter");
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
    {
        return invalid("only letters, digits, `_`, `.` and `-` are allowed");
    }
    Ok(())
}
