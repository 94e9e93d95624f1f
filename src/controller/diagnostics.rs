//! Reporting of invalid prop values.
//!
//! Invalid input never fails a render. Each offending field becomes one
//! [`PropDiagnostic`] handed to the component's [`DiagnosticSink`].

use std::cell::RefCell;

use serde_json::Value;

use super::schema::ValidationDetail;

/// One invalid prop value passed to a template.
#[derive(Debug, Clone, PartialEq)]
pub struct PropDiagnostic {
    pub template: String,
    pub field: String,
    pub kind: String,
    pub message: String,
    pub value: Value,
}

impl PropDiagnostic {
    pub fn new(template: impl Into<String>, detail: &ValidationDetail) -> Self {
        Self {
            template: template.into(),
            field: detail.name.clone(),
            kind: detail.kind.clone(),
            message: detail.message.clone(),
            value: detail.value.clone(),
        }
    }
}

/// Receives prop diagnostics.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: &PropDiagnostic);
}

/// Logs each diagnostic as a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, d: &PropDiagnostic) {
        tracing::warn!(
            template = %d.template,
            field = %d.field,
            kind = %d.kind,
            value = %d.value,
            "invalid prop value: {}",
            d.message
        );
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: RefCell<Vec<PropDiagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics reported so far, oldest first.
    pub fn reports(&self) -> Vec<PropDiagnostic> {
        self.reports.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }

    /// Drain the recorded diagnostics.
    pub fn take(&self) -> Vec<PropDiagnostic> {
        std::mem::take(&mut *self.reports.borrow_mut())
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: &PropDiagnostic) {
        self.reports.borrow_mut().push(diagnostic.clone());
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for std::rc::Rc<S> {
    fn report(&self, diagnostic: &PropDiagnostic) {
        (**self).report(diagnostic);
    }
}
