//! # Admission Handler and Chain
//!
//! A chain is an ordered list of handlers run once, front to back, over a
//! mutable request. The first handler to fail aborts the chain; nothing after it
//! runs. Handlers may write only to the request's scratch fields, except a
//! terminal execution handler placed last.

use super::errors::AdmissionResult;
use crate::logging::log_admission;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Stable identifier used to locate a handler inside a builder
pub type HandlerId = &'static str;

#[async_trait]
pub trait AdmissionHandler<R: Send>: Send + Sync {
    fn id(&self) -> HandlerId;

    fn description(&self) -> &'static str {
        ""
    }

    /// Check (or, for a terminal handler, act on) `request`. Returning an error
    /// stops the chain.
    async fn handle(&self, request: &mut R) -> AdmissionResult<()>;
}

/// Built, immutable admission chain
pub struct AdmissionChain<R: Send> {
    name: String,
    handlers: Vec<Arc<dyn AdmissionHandler<R>>>,
}

impl<R: Send> AdmissionChain<R> {
    pub(crate) fn new(name: String, handlers: Vec<Arc<dyn AdmissionHandler<R>>>) -> Self {
        Self { name, handlers }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run every handler in order, stopping at the first failure.
    pub async fn run(&self, request: &mut R) -> AdmissionResult<()> {
        for handler in &self.handlers {
            if let Err(err) = handler.handle(request).await {
                log_admission(&self.name, handler.id(), "rejected", Some(&err.to_string()));
                return Err(err);
            }
            log_admission(&self.name, handler.id(), "passed", None);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn handler_ids(&self) -> Vec<HandlerId> {
        self.handlers.iter().map(|handler| handler.id()).collect()
    }
}

impl<R: Send> Clone for AdmissionChain<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            handlers: self.handlers.clone(),
        }
    }
}

impl<R: Send> fmt::Debug for AdmissionChain<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionChain")
            .field("name", &self.name)
            .field("handlers", &self.handler_ids())
            .finish()
    }
}
