//! Attribute context: how optionality renders on one side of a transform.

use serde::{Deserialize, Serialize};

/// How optional fields are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPolicy {
    /// Every primitive field is a pointer, required or not.
    AllPointers,
    /// Optional fields without a materialized default are pointers; the rest are values.
    #[default]
    DefaultFallback,
}

/// Rendering policy for one side of a conversion.
///
/// The source and target of a transform each carry their own context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeContext {
    pub pointer_policy: PointerPolicy,
    /// Whether field defaults are filled in when the value is absent.
    pub materialize_defaults: bool,
    /// Package qualifier for named types, empty for the local package.
    pub namespace: String,
    /// The target slot is an interface and needs a concrete value built first.
    pub is_interface_site: bool,
}

/// Part of a context that changes generated helper bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextSignature {
    pointer_policy: PointerPolicy,
    materialize_defaults: bool,
    namespace: String,
}

impl AttributeContext {
    /// All fields are pointers and defaults are left to the reader.
    pub fn pointer() -> Self {
        Self {
            pointer_policy: PointerPolicy::AllPointers,
            ..Self::default()
        }
    }

    /// Fields with defaults are values and get their default when absent.
    pub fn use_default() -> Self {
        Self {
            pointer_policy: PointerPolicy::DefaultFallback,
            materialize_defaults: true,
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_interface_site(mut self, is_interface_site: bool) -> Self {
        self.is_interface_site = is_interface_site;
        self
    }

    pub fn signature(&self) -> ContextSignature {
        ContextSignature {
            pointer_policy: self.pointer_policy,
            materialize_defaults: self.materialize_defaults,
            namespace: self.namespace.clone(),
        }
    }

    /// Qualify a Go type name with this context's namespace.
    pub fn qualify(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.namespace, name)
        }
    }
}
