use std::fmt::{Display, Formatter};
use std::sync::{Arc, Weak};

use crate::element::InputElement;

/// Cheap-to-clone field identifier. Every per-field map in the controller is
/// keyed by this.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldName(Arc<str>);

impl FieldName {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FieldName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RegisterOptions {
    pub required: bool,
    pub value_as_number: bool,
    pub value_as_date: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldStatus {
    Created,
    Registered,
}

pub(crate) enum Field {
    Created {
        name: FieldName,
    },
    Registered {
        name: FieldName,
        element: Weak<dyn InputElement>,
        options: RegisterOptions,
    },
}

impl Field {
    pub(crate) fn created(name: FieldName) -> Self {
        Self::Created { name }
    }

    pub(crate) fn name(&self) -> &FieldName {
        match self {
            Self::Created { name } | Self::Registered { name, .. } => name,
        }
    }

    pub(crate) fn status(&self) -> FieldStatus {
        match self {
            Self::Created { .. } => FieldStatus::Created,
            Self::Registered { .. } => FieldStatus::Registered,
        }
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.status() == FieldStatus::Registered
    }

    /// Upgrades the non-owning element reference. `None` once the UI has
    /// dropped the element.
    pub(crate) fn element(&self) -> Option<Arc<dyn InputElement>> {
        match self {
            Self::Created { .. } => None,
            Self::Registered { element, .. } => element.upgrade(),
        }
    }

    pub(crate) fn options(&self) -> Option<RegisterOptions> {
        match self {
            Self::Created { .. } => None,
            Self::Registered { options, .. } => Some(*options),
        }
    }
}
