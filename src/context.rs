use std::sync::{Arc, RwLock};

use crate::controller::{FormController, FormError, FormResult, read_lock, write_lock};

/// Explicit provider scope for rendering-layer adapters. A context value is
/// created where the form is mounted and threaded to every consumer;
/// accessing one that was never provided is a usage error, not a fallback.
#[derive(Clone, Default)]
pub struct FormContext {
    current: Arc<RwLock<Option<FormController>>>,
}

impl FormContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provide(&self, controller: FormController) -> FormResult<()> {
        let mut current = write_lock(&self.current, "providing form context")?;
        current.replace(controller);
        Ok(())
    }

    pub fn clear(&self) -> FormResult<()> {
        let mut current = write_lock(&self.current, "clearing form context")?;
        current.take();
        Ok(())
    }

    pub fn is_provided(&self) -> FormResult<bool> {
        Ok(read_lock(&self.current, "checking form context")?.is_some())
    }

    pub fn controller(&self) -> FormResult<FormController> {
        read_lock(&self.current, "reading form context")?
            .clone()
            .ok_or(FormError::MissingProvider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::FormOptions;

    #[test]
    fn unprovided_context_errors_at_the_access_site() {
        let context = FormContext::new();
        assert_eq!(
            context.controller().err(),
            Some(FormError::MissingProvider)
        );
    }

    #[test]
    fn provided_controller_is_handed_back_until_cleared() {
        let context = FormContext::new();
        let controller = FormController::new(FormOptions::default());
        context.provide(controller).expect("provide");

        assert!(context.is_provided().expect("is provided"));
        assert!(context.controller().is_ok());

        context.clear().expect("clear");
        assert_eq!(
            context.controller().err(),
            Some(FormError::MissingProvider)
        );
    }
}
