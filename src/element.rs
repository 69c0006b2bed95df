use std::sync::Arc;

/// The shape of an input element as far as value extraction is concerned.
/// Anything not covered here reads as a plain scalar input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputKind {
    Text,
    Checkbox,
    File,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileHandle {
    name: String,
    size: u64,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Minimal surface a rendering layer exposes for a bound input. The
/// controller holds only `Weak` references to implementations; the element
/// is owned by the UI's mount cycle.
pub trait InputElement: Send + Sync {
    fn name(&self) -> String;

    fn kind(&self) -> InputKind {
        InputKind::Text
    }

    fn value(&self) -> String;

    fn checked(&self) -> bool {
        false
    }

    fn files(&self) -> Vec<FileHandle> {
        Vec::new()
    }
}

/// A raw input event as delivered by the rendering layer. The target is the
/// element the event fired on; field resolution goes through its name.
pub struct InputEvent {
    target: Arc<dyn InputElement>,
}

impl InputEvent {
    pub fn new(target: Arc<dyn InputElement>) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Arc<dyn InputElement> {
        &self.target
    }

    pub fn target_name(&self) -> String {
        self.target.name()
    }
}

/// A submit event from the rendering layer. The controller calls
/// `prevent_default` before doing anything else.
pub trait SubmitEvent {
    fn prevent_default(&mut self);
}
