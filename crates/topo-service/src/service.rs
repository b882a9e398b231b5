//! Composition root for the topology service's HTTP surface.
//!
//! [`TopoService`] owns what the dispatcher shares across requests (the
//! locale factory and the business core's support facility) and turns a
//! list of actions into the final [`Router`].

use std::sync::Arc;

use axum::Router;
use topo_i18n::LocaleFactory;
use tower_http::trace::TraceLayer;

use crate::action::Action;
use crate::config::DispatchConfig;
use crate::dispatcher::Dispatcher;
use crate::registrar::{Registrar, RegistrationReport};

/// The topology service's HTTP surface.
pub struct TopoService<S> {
    dispatcher: Arc<Dispatcher<S>>,
    registrar: Registrar<S>,
}

impl<S: Send + Sync + 'static> TopoService<S> {
    /// Create a service with no actions yet.
    pub fn new(config: &DispatchConfig, locale: Arc<dyn LocaleFactory>, support: Arc<S>) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(locale, support, config.max_body_bytes)),
            registrar: Registrar::new(config.path_prefix.clone()),
        }
    }

    /// Add actions to expose.
    #[must_use]
    pub fn with_actions(mut self, actions: impl IntoIterator<Item = Action<S>>) -> Self {
        self.registrar = self.registrar.actions(actions);
        self
    }

    /// Bind all actions and return the router with request tracing.
    pub fn into_router(self) -> (Router, RegistrationReport) {
        let (router, report) = self.registrar.register(&self.dispatcher);
        (router.layer(TraceLayer::new_for_http()), report)
    }
}
