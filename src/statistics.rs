use crate::message::Classification;
use crate::router::{RouteSink, RoutedEvent};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortStats {
    pub total_messages: u64,
    pub no_rule_matches: u64, // Messages no rule matched; they kept their prior classification
    pub by_classification: BTreeMap<Classification, u64>,
    pub by_folder: BTreeMap<String, u64>,
    pub by_rule: BTreeMap<String, u64>,
}

#[derive(Debug, Clone)]
pub enum StatEvent {
    RuleMatch {
        rule_name: String,
        classification: Classification,
        destination: String,
    },
    NoRuleMatch {
        classification: Classification,
        destination: String,
    },
}

impl From<&RoutedEvent> for StatEvent {
    fn from(event: &RoutedEvent) -> Self {
        match &event.rule {
            Some(rule_name) => StatEvent::RuleMatch {
                rule_name: rule_name.clone(),
                classification: event.classification,
                destination: event.destination.clone(),
            },
            None => StatEvent::NoRuleMatch {
                classification: event.classification,
                destination: event.destination.clone(),
            },
        }
    }
}

/// Aggregates routed events for one processing run.
///
/// Clones share the same counters, so one handle can sit inside a router while
/// another is kept for reading the totals.
#[derive(Debug, Clone, Default)]
pub struct StatisticsCollector {
    stats: Arc<Mutex<SortStats>>,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self, event: StatEvent) {
        let mut stats = match self.stats.lock() {
            Ok(stats) => stats,
            Err(poisoned) => {
                log::warn!("Statistics lock poisoned, continuing with recovered state");
                poisoned.into_inner()
            }
        };

        stats.total_messages += 1;
        let (classification, destination) = match event {
            StatEvent::RuleMatch {
                rule_name,
                classification,
                destination,
            } => {
                *stats.by_rule.entry(rule_name).or_insert(0) += 1;
                (classification, destination)
            }
            StatEvent::NoRuleMatch {
                classification,
                destination,
            } => {
                stats.no_rule_matches += 1;
                (classification, destination)
            }
        };
        *stats.by_classification.entry(classification).or_insert(0) += 1;
        *stats.by_folder.entry(destination).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> SortStats {
        match self.stats.lock() {
            Ok(stats) => stats.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn reset(&self) {
        let mut stats = match self.stats.lock() {
            Ok(stats) => stats,
            Err(poisoned) => {
                log::warn!("Statistics lock poisoned, resetting recovered state");
                poisoned.into_inner()
            }
        };
        *stats = SortStats::default();
    }
}

impl RouteSink for StatisticsCollector {
    fn report(&self, event: &RoutedEvent) {
        self.record_event(StatEvent::from(event));
    }
}
