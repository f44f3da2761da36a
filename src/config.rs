use crate::message::Classification;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rules: Vec<Rule>,
    pub folders: BTreeMap<Classification, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub criteria: Criteria,
    pub outcome: Classification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Criteria {
    /// Body contains any of the triggers as a literal, case-sensitive substring
    BodyContains { triggers: Vec<String> },
    /// Sender contains any of the triggers as a literal, case-sensitive substring
    SenderContains { triggers: Vec<String> },
    BodyPattern { pattern: String },
    SenderPattern { pattern: String },
    /// Always matches; only valid as the last rule of a chain
    CatchAll,
}

impl Criteria {
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Criteria::CatchAll)
    }
}

impl Rule {
    pub fn new(name: impl Into<String>, criteria: Criteria, outcome: Classification) -> Self {
        Self {
            name: name.into(),
            criteria,
            outcome,
        }
    }

    pub fn body_contains(name: &str, triggers: &[&str], outcome: Classification) -> Self {
        Self::new(
            name,
            Criteria::BodyContains {
                triggers: triggers.iter().map(|t| t.to_string()).collect(),
            },
            outcome,
        )
    }

    pub fn sender_contains(name: &str, triggers: &[&str], outcome: Classification) -> Self {
        Self::new(
            name,
            Criteria::SenderContains {
                triggers: triggers.iter().map(|t| t.to_string()).collect(),
            },
            outcome,
        )
    }

    pub fn catch_all(name: &str, outcome: Classification) -> Self {
        Self::new(name, Criteria::CatchAll, outcome)
    }

    pub fn outcome(&self) -> Classification {
        self.outcome
    }
}

pub fn default_folders() -> BTreeMap<Classification, String> {
    BTreeMap::from([
        (Classification::Spam, "Spam".to_string()),
        (Classification::Important, "Important".to_string()),
        (Classification::Coworker, "Coworkers".to_string()),
        (Classification::KeywordFlagged, "Keywords".to_string()),
        (Classification::Default, "Inbox".to_string()),
    ])
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rules: vec![
                Rule::body_contains("Spam keywords", &["sale", "free"], Classification::Spam),
                Rule::sender_contains(
                    "Important senders",
                    &["director", "boss"],
                    Classification::Important,
                ),
                Rule::sender_contains("Coworkers", &["@corp.com"], Classification::Coworker),
                Rule::body_contains(
                    "Sensitive keywords",
                    &["money", "password", "secret"],
                    Classification::KeywordFlagged,
                ),
                Rule::catch_all("Everything else", Classification::Default),
            ],
            folders: default_folders(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {path}"))?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {path}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
rules:
  - name: "Spam keywords"
    criteria:
      type: "BodyContains"
      triggers: ["sale", "free"]
    outcome: SPAM
  - name: "Boss"
    criteria:
      type: "SenderPattern"
      pattern: "(?i)^boss@"
    outcome: IMPORTANT
  - name: "Everything else"
    criteria:
      type: "CatchAll"
    outcome: DEFAULT
folders:
  SPAM: Junk
  IMPORTANT: Priority
  COWORKER: Team
  KEYWORD_FLAGGED: Review
  DEFAULT: Inbox
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.rules.len(), 3);
        assert_eq!(
            config.rules[0].criteria,
            Criteria::BodyContains {
                triggers: vec!["sale".to_string(), "free".to_string()]
            }
        );
        assert_eq!(config.rules[1].outcome(), Classification::Important);
        assert!(config.rules[2].criteria.is_catch_all());
        assert_eq!(config.folders[&Classification::Spam], "Junk");
    }

    #[test]
    fn test_unknown_criteria_type_rejected() {
        let yaml = r#"
rules:
  - name: "bad"
    criteria:
      type: "SubjectContains"
      triggers: ["x"]
    outcome: SPAM
folders: {}
"#;
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_default_config_ends_with_catch_all() {
        let config = Config::default();
        assert_eq!(config.rules.len(), 5);
        assert!(config.rules.last().unwrap().criteria.is_catch_all());
        for classification in Classification::ALL {
            assert!(config.folders.contains_key(&classification));
        }
    }

    #[test]
    fn test_config_file_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "mail-sorter-config-{}.yaml",
            std::process::id()
        ));
        let path = path.to_str().unwrap().to_string();

        let config = Config::default();
        config.to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.rules, config.rules);
        assert_eq!(loaded.folders, config.folders);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = Config::from_file("/nonexistent/mail-sorter.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
