//! Ordered assembly of admission chains.
//!
//! Handlers are located by their stable [`HandlerId`]. Operations naming an id
//! that is not present leave the builder unchanged, except `insert_before` on
//! an empty builder, which appends.

use super::errors::{AdmissionError, AdmissionResult};
use super::handler::{AdmissionChain, AdmissionHandler, HandlerId};
use std::fmt;
use std::sync::Arc;

pub struct ChainBuilder<R: Send> {
    name: String,
    handlers: Vec<Arc<dyn AdmissionHandler<R>>>,
}

impl<R: Send> ChainBuilder<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Vec::new(),
        }
    }

    /// Append `handler` at the tail.
    pub fn add<H>(&mut self, handler: H) -> &mut Self
    where
        H: AdmissionHandler<R> + 'static,
    {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn insert_before<H>(&mut self, target: HandlerId, handler: H) -> &mut Self
    where
        H: AdmissionHandler<R> + 'static,
    {
        if self.handlers.is_empty() {
            self.handlers.push(Arc::new(handler));
        } else if let Some(index) = self.position(target) {
            self.handlers.insert(index, Arc::new(handler));
        }
        self
    }

    pub fn replace_handler<H>(&mut self, target: HandlerId, handler: H) -> &mut Self
    where
        H: AdmissionHandler<R> + 'static,
    {
        if let Some(index) = self.position(target) {
            self.handlers[index] = Arc::new(handler);
        }
        self
    }

    pub fn remove_handler(&mut self, target: HandlerId) -> &mut Self {
        if let Some(index) = self.position(target) {
            self.handlers.remove(index);
        }
        self
    }

    /// Drop every handler so the builder can be reused.
    pub fn reset(&mut self) -> &mut Self {
        self.handlers.clear();
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn contains(&self, target: HandlerId) -> bool {
        self.position(target).is_some()
    }

    pub fn handler_ids(&self) -> Vec<HandlerId> {
        self.handlers.iter().map(|handler| handler.id()).collect()
    }

    pub fn build(&self) -> AdmissionResult<AdmissionChain<R>> {
        if self.handlers.is_empty() {
            return Err(AdmissionError::EmptyChain);
        }
        Ok(AdmissionChain::new(self.name.clone(), self.handlers.clone()))
    }

    fn position(&self, target: HandlerId) -> Option<usize> {
        self.handlers
            .iter()
            .position(|handler| handler.id() == target)
    }
}

impl<R: Send> fmt::Debug for ChainBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainBuilder")
            .field("name", &self.name)
            .field("handlers", &self.handler_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Appends its id to the request so tests can observe execution order.
    struct Step(HandlerId);

    #[async_trait]
    impl AdmissionHandler<Vec<&'static str>> for Step {
        fn id(&self) -> HandlerId {
            self.0
        }

        async fn handle(&self, request: &mut Vec<&'static str>) -> AdmissionResult<()> {
            request.push(self.0);
            Ok(())
        }
    }

    struct Reject;

    #[async_trait]
    impl AdmissionHandler<Vec<&'static str>> for Reject {
        fn id(&self) -> HandlerId {
            "reject"
        }

        async fn handle(&self, _request: &mut Vec<&'static str>) -> AdmissionResult<()> {
            Err(AdmissionError::ParkingSpaceNotFound { space_id: 0 })
        }
    }

    fn abc() -> ChainBuilder<Vec<&'static str>> {
        let mut builder = ChainBuilder::new("test");
        builder.add(Step("a")).add(Step("b")).add(Step("c"));
        builder
    }

    #[test]
    fn test_empty_build_fails() {
        let builder: ChainBuilder<Vec<&'static str>> = ChainBuilder::new("test");
        assert!(matches!(builder.build(), Err(AdmissionError::EmptyChain)));
    }

    #[test]
    fn test_insert_replace_remove() {
        let mut builder = abc();
        builder.insert_before("b", Step("x"));
        assert_eq!(builder.handler_ids(), vec!["a", "x", "b", "c"]);

        builder.insert_before("a", Step("head"));
        assert_eq!(builder.handler_ids(), vec!["head", "a", "x", "b", "c"]);

        builder.replace_handler("x", Step("y"));
        assert_eq!(builder.handler_ids(), vec!["head", "a", "y", "b", "c"]);

        builder.remove_handler("head").remove_handler("y");
        assert_eq!(builder.handler_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_targets_are_noops() {
        let mut builder = abc();
        builder
            .insert_before("missing", Step("x"))
            .replace_handler("missing", Step("y"))
            .remove_handler("missing");
        assert_eq!(builder.handler_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_before_on_empty_appends() {
        let mut builder: ChainBuilder<Vec<&'static str>> = ChainBuilder::new("test");
        builder.insert_before("anything", Step("only"));
        assert_eq!(builder.handler_ids(), vec!["only"]);
    }

    #[test]
    fn test_reset_allows_reuse() {
        let mut builder = abc();
        builder.reset();
        assert!(builder.is_empty());
        assert!(builder.build().is_err());
        builder.add(Step("z"));
        assert_eq!(builder.build().unwrap().handler_ids(), vec!["z"]);
    }

    #[tokio::test]
    async fn test_chain_runs_in_order_and_stops_on_failure() {
        let chain = abc().build().unwrap();
        let mut seen = Vec::new();
        chain.run(&mut seen).await.unwrap();
        assert_eq!(seen, vec!["a", "b", "c"]);

        let mut builder = abc();
        builder.insert_before("b", Reject);
        let chain = builder.build().unwrap();
        let mut seen = Vec::new();
        let err = chain.run(&mut seen).await.unwrap_err();
        assert_eq!(err.code(), Some(1001));
        assert_eq!(seen, vec!["a"]);
    }
}
