use crate::error::ConfigError;
use crate::message::{Classification, Message};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One record per routed message, handed to a [`RouteSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedEvent {
    pub message_id: u64,
    pub sender: String,
    pub classification: Classification,
    pub destination: String,
    /// Name of the rule that decided the classification, if one matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

/// Receives one event per routed message.
pub trait RouteSink: Send + Sync {
    fn report(&self, event: &RoutedEvent);
}

impl<F> RouteSink for F
where
    F: Fn(&RoutedEvent) + Send + Sync,
{
    fn report(&self, event: &RoutedEvent) {
        self(event)
    }
}

/// Writes each routed message to the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl RouteSink for LogSink {
    fn report(&self, event: &RoutedEvent) {
        log::info!(
            "Message {} from '{}' classified {} -> {}",
            event.message_id,
            event.sender,
            event.classification,
            event.destination
        );
    }
}

/// Forwards every event to each inner sink in order.
#[derive(Default)]
pub struct Fanout {
    sinks: Vec<Box<dyn RouteSink>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl RouteSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl RouteSink for Fanout {
    fn report(&self, event: &RoutedEvent) {
        for sink in &self.sinks {
            sink.report(event);
        }
    }
}

/// Total mapping from classification to destination folder.
pub struct Router {
    folders: HashMap<Classification, String>,
    sink: Box<dyn RouteSink>,
}

impl Router {
    /// Build a router that reports through `sink`.
    ///
    /// Every classification must map to a non-empty folder name.
    pub fn new(
        folders: BTreeMap<Classification, String>,
        sink: impl RouteSink + 'static,
    ) -> Result<Self, ConfigError> {
        for classification in Classification::ALL {
            match folders.get(&classification) {
                None => return Err(ConfigError::MissingFolder(classification)),
                Some(name) if name.trim().is_empty() => {
                    return Err(ConfigError::EmptyFolderName(classification))
                }
                Some(_) => {}
            }
        }

        Ok(Router {
            folders: folders.into_iter().collect(),
            sink: Box::new(sink),
        })
    }

    /// Folder for `classification`.
    pub fn destination(&self, classification: Classification) -> &str {
        // Construction guarantees every classification is present.
        self.folders
            .get(&classification)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn route(&self, message: &Message) -> &str {
        self.route_with_rule(message, None).1
    }

    /// Route `message`, report it to the sink and return the event alongside the folder.
    pub fn route_with_rule(
        &self,
        message: &Message,
        rule: Option<&str>,
    ) -> (RoutedEvent, &str) {
        let destination = self.destination(message.classification);
        let event = RoutedEvent {
            message_id: message.id,
            sender: message.sender.clone(),
            classification: message.classification,
            destination: destination.to_string(),
            rule: rule.map(str::to_string),
        };
        self.sink.report(&event);
        (event, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_folders;
    use std::sync::{Arc, Mutex};

    fn collecting_router() -> (Router, Arc<Mutex<Vec<RoutedEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let router = Router::new(default_folders(), move |event: &RoutedEvent| {
            sink_seen.lock().unwrap().push(event.clone());
        })
        .unwrap();
        (router, seen)
    }

    #[test]
    fn test_route_spam_to_spam_folder() {
        let (router, seen) = collecting_router();
        let mut message = Message::new(9, "user@gmail.com", "sale");
        message.classification = Classification::Spam;

        assert_eq!(router.route(&message), "Spam");

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            RoutedEvent {
                message_id: 9,
                sender: "user@gmail.com".to_string(),
                classification: Classification::Spam,
                destination: "Spam".to_string(),
                rule: None,
            }
        );
    }

    #[test]
    fn test_every_classification_has_destination() {
        let router = Router::new(default_folders(), LogSink).unwrap();
        for classification in Classification::ALL {
            assert!(!router.destination(classification).is_empty());
        }
        assert_eq!(router.destination(Classification::Important), "Important");
        assert_eq!(router.destination(Classification::Coworker), "Coworkers");
        assert_eq!(router.destination(Classification::KeywordFlagged), "Keywords");
        assert_eq!(router.destination(Classification::Default), "Inbox");
    }

    #[test]
    fn test_incomplete_mapping_rejected() {
        let mut folders = default_folders();
        folders.remove(&Classification::Coworker);
        assert!(matches!(
            Router::new(folders, LogSink),
            Err(ConfigError::MissingFolder(Classification::Coworker))
        ));
    }

    #[test]
    fn test_blank_folder_rejected() {
        let mut folders = default_folders();
        folders.insert(Classification::Default, "  ".to_string());
        assert!(matches!(
            Router::new(folders, LogSink),
            Err(ConfigError::EmptyFolderName(Classification::Default))
        ));
    }

    #[test]
    fn test_route_with_rule_records_rule_name() {
        let (router, seen) = collecting_router();
        let mut message = Message::new(1, "boss", "hi");
        message.classification = Classification::Important;

        let (event, folder) = router.route_with_rule(&message, Some("Important senders"));
        assert_eq!(folder, "Important");
        assert_eq!(event.rule.as_deref(), Some("Important senders"));
        assert_eq!(seen.lock().unwrap()[0], event);
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let first = Arc::new(Mutex::new(0));
        let second = Arc::new(Mutex::new(0));
        let (a, b) = (first.clone(), second.clone());
        let fanout = Fanout::new()
            .with(move |_: &RoutedEvent| *a.lock().unwrap() += 1)
            .with(move |_: &RoutedEvent| *b.lock().unwrap() += 1);

        let router = Router::new(default_folders(), fanout).unwrap();
        router.route(&Message::new(1, "a", "b"));
        router.route(&Message::new(2, "c", "d"));

        assert_eq!(*first.lock().unwrap(), 2);
        assert_eq!(*second.lock().unwrap(), 2);
    }

    #[test]
    fn test_event_json_shape() {
        let event = RoutedEvent {
            message_id: 3,
            sender: "hr@corp.com".to_string(),
            classification: Classification::Coworker,
            destination: "Coworkers".to_string(),
            rule: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"message_id":3,"sender":"hr@corp.com","classification":"COWORKER","destination":"Coworkers"}"#
        );
    }
}
