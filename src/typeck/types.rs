use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// A type as seen by inference. Class types name an entry of the hierarchy;
/// `Bottom` and `Error` are synthetic and never registered as classes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuackType {
    /// No information yet. Subtype of everything.
    Bottom,
    /// A diagnosed violation. Permissive in subtype checks.
    Error,
    Class(String),
}

/// Identifier -> best known type.
pub type TypeTable = BTreeMap<String, QuackType>;

impl QuackType {
    pub fn class(name: impl Into<String>) -> Self {
        QuackType::Class(name.into())
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            QuackType::Class(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, QuackType::Bottom)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QuackType::Error)
    }

    /// True for a class type with the given name.
    pub fn is(&self, name: &str) -> bool {
        self.class_name() == Some(name)
    }
}

impl fmt::Display for QuackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuackType::Bottom => write!(f, "Bottom"),
            QuackType::Error => write!(f, "TypeError"),
            QuackType::Class(name) => write!(f, "{name}"),
        }
    }
}

impl Serialize for QuackType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
