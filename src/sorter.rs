use crate::config::Config;
use crate::error::ConfigError;
use crate::filter::ClassifierChain;
use crate::message::Message;
use crate::router::{RouteSink, RoutedEvent, Router};

/// Classify-then-route pipeline over one chain and one router.
pub struct MailSorter {
    chain: ClassifierChain,
    router: Router,
}

impl MailSorter {
    pub fn new(chain: ClassifierChain, router: Router) -> Self {
        Self { chain, router }
    }

    /// Assemble chain and router from a configuration, validating both.
    pub fn from_config(
        config: Config,
        sink: impl RouteSink + 'static,
    ) -> Result<Self, ConfigError> {
        let chain = ClassifierChain::new(config.rules)?;
        let router = Router::new(config.folders, sink)?;
        Ok(Self::new(chain, router))
    }

    pub fn chain(&self) -> &ClassifierChain {
        &self.chain
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn process(&self, message: &mut Message) -> RoutedEvent {
        let rule = self.chain.evaluate(message);
        if let Some(rule) = rule {
            message.classification = rule.outcome();
        }
        let (event, _) = self
            .router
            .route_with_rule(message, rule.map(|r| r.name.as_str()));
        event
    }

    pub fn process_batch(&self, messages: &mut [Message]) -> Vec<RoutedEvent> {
        messages
            .iter_mut()
            .map(|message| self.process(message))
            .collect()
    }
}
