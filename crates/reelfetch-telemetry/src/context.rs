//! Process-wide span guard.

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter an `app` span tagged with the service name and build SHA.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        let service = service.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", service = %service, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

