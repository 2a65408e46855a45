//! Identity attached to a resolved authentication.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered bag of named attribute values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, serde_json::Value>);

impl Attributes {
    /// An empty attribute set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds or replaces an attribute, returning the updated set.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Looks up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    /// Returns `true` if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The authenticated subject and its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAttributes {
    /// Subject identifier (user name).
    pub subject: String,
    /// Supplementary subject attributes.
    #[serde(default)]
    pub attributes: Attributes,
}

impl SubjectAttributes {
    /// Creates subject attributes.
    pub fn of(subject: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            subject: subject.into(),
            attributes,
        }
    }
}

/// Attributes describing the authentication event rather than the subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextAttributes(pub Attributes);

impl ContextAttributes {
    /// An empty context.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Full result of a successful authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationAttributes {
    /// Who was authenticated.
    pub subject: SubjectAttributes,
    /// How they were authenticated.
    #[serde(default)]
    pub context: ContextAttributes,
}

impl AuthenticationAttributes {
    /// Combines subject and context attributes.
    pub fn of(subject: SubjectAttributes, context: ContextAttributes) -> Self {
        Self { subject, context }
    }

    /// Identity for `subject` with empty attribute sets.
    pub fn for_subject(subject: impl Into<String>) -> Self {
        Self::of(
            SubjectAttributes::of(subject, Attributes::empty()),
            ContextAttributes::empty(),
        )
    }

    /// The authenticated subject identifier.
    pub fn subject(&self) -> &str {
        &self.subject.subject
    }
}
