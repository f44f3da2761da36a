use crate::config::{Criteria, Rule};
use crate::error::ConfigError;
use crate::message::{Classification, Message};

use regex::Regex;
use std::collections::HashMap;

/// Ordered, validated list of rules evaluated first-match-wins.
///
/// A chain is immutable once assembled, so one instance can be shared across
/// threads and reused for any number of messages.
#[derive(Debug, Clone)]
pub struct ClassifierChain {
    rules: Vec<Rule>,
    compiled_patterns: HashMap<String, Regex>,
}

impl ClassifierChain {
    /// Assemble a chain from rules in evaluation order.
    ///
    /// Fails when the list is empty, when a catch-all rule is followed by
    /// another rule, when a trigger rule has no (or an empty) trigger, or when
    /// a pattern does not compile. No partially built chain is ever returned.
    pub fn new(rules: Vec<Rule>) -> Result<Self, ConfigError> {
        if rules.is_empty() {
            return Err(ConfigError::EmptyChain);
        }

        let last = rules.len() - 1;
        let mut chain = ClassifierChain {
            rules: Vec::with_capacity(rules.len()),
            compiled_patterns: HashMap::new(),
        };

        for (index, rule) in rules.into_iter().enumerate() {
            if rule.criteria.is_catch_all() && index != last {
                return Err(ConfigError::CatchAllNotLast {
                    rule: rule.name,
                    index,
                });
            }
            chain.validate_rule(&rule)?;
            chain.rules.push(rule);
        }

        log::debug!("Assembled classifier chain with {} rules", chain.rules.len());
        Ok(chain)
    }

    fn validate_rule(&mut self, rule: &Rule) -> Result<(), ConfigError> {
        match &rule.criteria {
            Criteria::BodyContains { triggers } | Criteria::SenderContains { triggers } => {
                if triggers.is_empty() {
                    return Err(ConfigError::NoTriggers {
                        rule: rule.name.clone(),
                    });
                }
                if triggers.iter().any(|t| t.is_empty()) {
                    return Err(ConfigError::EmptyTrigger {
                        rule: rule.name.clone(),
                    });
                }
            }
            Criteria::BodyPattern { pattern } | Criteria::SenderPattern { pattern } => {
                if !self.compiled_patterns.contains_key(pattern) {
                    let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                        rule: rule.name.clone(),
                        pattern: pattern.clone(),
                        source: e,
                    })?;
                    self.compiled_patterns.insert(pattern.clone(), regex);
                }
            }
            Criteria::CatchAll => {}
        }
        Ok(())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True when the last rule always matches, so every message gets an outcome from a rule.
    pub fn is_total(&self) -> bool {
        self.rules
            .last()
            .is_some_and(|rule| rule.criteria.is_catch_all())
    }

    /// Does `rule` accept `message`? Pure; never touches the message.
    pub fn matches(&self, rule: &Rule, message: &Message) -> bool {
        match &rule.criteria {
            Criteria::BodyContains { triggers } => contains_any(&message.body, triggers),
            Criteria::SenderContains { triggers } => contains_any(&message.sender, triggers),
            Criteria::BodyPattern { pattern } => self
                .compiled_patterns
                .get(pattern)
                .is_some_and(|regex| regex.is_match(&message.body)),
            Criteria::SenderPattern { pattern } => self
                .compiled_patterns
                .get(pattern)
                .is_some_and(|regex| regex.is_match(&message.sender)),
            Criteria::CatchAll => true,
        }
    }

    /// First rule that matches `message`, if any.
    pub fn evaluate(&self, message: &Message) -> Option<&Rule> {
        for rule in &self.rules {
            let matched = self.matches(rule, message);
            log::debug!(
                "Rule '{}' evaluation result for message {}: {}",
                rule.name,
                message.id,
                matched
            );
            if matched {
                log::info!(
                    "Rule '{}' matched message {} from '{}', outcome {}",
                    rule.name,
                    message.id,
                    message.sender,
                    rule.outcome
                );
                return Some(rule);
            }
        }

        log::debug!(
            "No rules matched message {}, keeping {}",
            message.id,
            message.classification
        );
        None
    }

    /// Classify `message` in place and return the resulting classification.
    ///
    /// Without a match the message keeps whatever classification it already had.
    pub fn classify(&self, message: &mut Message) -> Classification {
        if let Some(rule) = self.evaluate(message) {
            message.classification = rule.outcome;
        }
        message.classification
    }
}

fn contains_any(haystack: &str, triggers: &[String]) -> bool {
    triggers.iter().any(|trigger| haystack.contains(trigger.as_str()))
}
