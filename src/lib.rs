pub mod config;
pub mod error;
pub mod filter;
pub mod message;
pub mod router;
pub mod sorter;
pub mod statistics;

pub use config::{Config, Criteria, Rule};
pub use error::ConfigError;
pub use filter::ClassifierChain;
pub use message::{Classification, Message};
pub use router::{Fanout, LogSink, RouteSink, RoutedEvent, Router};
pub use sorter::MailSorter;
pub use statistics::{SortStats, StatEvent, StatisticsCollector};
