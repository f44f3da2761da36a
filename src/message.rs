use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Outcome assigned to a message by the classifier chain.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Spam,
    Important,
    Coworker,
    KeywordFlagged,
    #[default]
    Default,
}

impl Classification {
    pub const ALL: [Classification; 5] = [
        Classification::Spam,
        Classification::Important,
        Classification::Coworker,
        Classification::KeywordFlagged,
        Classification::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Spam => "SPAM",
            Classification::Important => "IMPORTANT",
            Classification::Coworker => "COWORKER",
            Classification::KeywordFlagged => "KEYWORD_FLAGGED",
            Classification::Default => "DEFAULT",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub sender: String,
    pub body: String,
    // Unclassified messages carry DEFAULT until a chain pass overwrites it.
    #[serde(default)]
    pub classification: Classification,
}

impl Message {
    pub fn new(id: u64, sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            sender: sender.into(),
            body: body.into(),
            classification: Classification::Default,
        }
    }

    /// Build a message from RFC 822 style text: headers, a blank line, then the body.
    ///
    /// The sender comes from `Return-Path`, falling back to the address inside
    /// `From`. Missing headers leave the sender empty.
    pub fn from_raw(id: u64, raw: &str) -> Self {
        let mut headers: HashMap<String, String> = HashMap::new();
        let mut body = String::new();
        let mut in_headers = true;
        let mut last_header_key: Option<String> = None;

        for line in raw.lines() {
            if in_headers {
                if line.trim().is_empty() {
                    in_headers = false;
                    continue;
                }

                if line.starts_with(' ') || line.starts_with('\t') {
                    // Folded header line
                    if let Some(ref key) = last_header_key {
                        if let Some(existing) = headers.get_mut(key) {
                            existing.push(' ');
                            existing.push_str(line.trim());
                        }
                    }
                    continue;
                }

                if let Some((key, value)) = line.split_once(':') {
                    let key = key.trim().to_lowercase();
                    let value = value.trim().to_string();
                    // Only the first copy of a header is kept, along with its folded lines
                    if headers.contains_key(&key) {
                        last_header_key = None;
                    } else {
                        last_header_key = Some(key.clone());
                        headers.insert(key, value);
                    }
                }
            } else {
                body.push_str(line);
                body.push('\n');
            }
        }

        let sender = headers
            .get("return-path")
            .map(|path| path.trim_matches(['<', '>']).to_string())
            .filter(|path| !path.is_empty())
            .or_else(|| headers.get("from").map(|from| extract_address(from)))
            .unwrap_or_default();

        Message::new(id, sender, body)
    }
}

/// Id one past the largest in `messages`, or 0 for an empty batch.
///
/// Returns `None` when the largest id is already `u64::MAX`.
pub fn next_message_id(messages: &[Message]) -> Option<u64> {
    match messages.iter().map(|m| m.id).max() {
        Some(max) => max.checked_add(1),
        None => Some(0),
    }
}

/// Ids that appear more than once in `messages`, in ascending order.
pub fn duplicate_ids(messages: &[Message]) -> Vec<u64> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<u64> = messages
        .iter()
        .filter(|m| !seen.insert(m.id))
        .map(|m| m.id)
        .collect();
    duplicates.sort_unstable();
    duplicates.dedup();
    duplicates
}

/// Pull `user@domain` out of `Name <user@domain>`, or return the value unchanged.
fn extract_address(value: &str) -> String {
    if let (Some(start), Some(end)) = (value.rfind('<'), value.rfind('>')) {
        if start < end {
            return value[start + 1..end].to_string();
        }
    }
    value.trim().to_string()
}
