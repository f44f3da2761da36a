use crate::message::Classification;

/// Problems detected while assembling a classifier chain or a router.
///
/// These only ever surface at setup time. Classifying and routing a message
/// has no failure path.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("classifier chain has no rules")]
    EmptyChain,

    #[error("catch-all rule '{rule}' at position {index} must be the last rule in the chain")]
    CatchAllNotLast { rule: String, index: usize },

    #[error("rule '{rule}' has no triggers")]
    NoTriggers { rule: String },

    #[error("rule '{rule}' contains an empty trigger, which would match every message")]
    EmptyTrigger { rule: String },

    #[error("rule '{rule}' has invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("no destination folder configured for {0}")]
    MissingFolder(Classification),

    #[error("destination folder for {0} is empty")]
    EmptyFolderName(Classification),
}
