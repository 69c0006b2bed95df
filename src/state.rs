use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::field::FieldName;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    pub kind: String,
    pub message: Option<String>,
}

impl FieldError {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: None,
        }
    }

    pub fn with_message(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: Some(message.into()),
        }
    }
}

/// Per-field validation errors, replaced wholesale on every validation pass.
pub type FieldErrors = IndexMap<FieldName, FieldError>;

/// Submission lifecycle. `is_submitting` and `is_submitted` both derive from
/// this, which keeps them mutually exclusive by construction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitStatus {
    Pending,
    Submitting,
    Submitted { successful: bool },
}

impl SubmitStatus {
    pub fn is_submitting(self) -> bool {
        self == Self::Submitting
    }

    pub fn is_submitted(self) -> bool {
        matches!(self, Self::Submitted { .. })
    }

    pub fn is_submit_successful(self) -> bool {
        matches!(self, Self::Submitted { successful: true })
    }
}

/// The snapshot published through the store after every transition.
#[derive(Clone, Debug, PartialEq)]
pub struct FormState {
    pub status: SubmitStatus,
    pub is_loading: bool,
    pub is_dirty: bool,
    pub submit_count: u32,
    pub touched_fields: BTreeSet<FieldName>,
    pub dirty_fields: BTreeSet<FieldName>,
    pub errors: FieldErrors,
}

impl FormState {
    pub(crate) fn initial() -> Self {
        Self {
            status: SubmitStatus::Pending,
            is_loading: true,
            is_dirty: false,
            submit_count: 0,
            touched_fields: BTreeSet::new(),
            dirty_fields: BTreeSet::new(),
            errors: FieldErrors::new(),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.status.is_submitting()
    }

    pub fn is_submitted(&self) -> bool {
        self.status.is_submitted()
    }

    pub fn is_submit_successful(&self) -> bool {
        self.status.is_submit_successful()
    }
}
