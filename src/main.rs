use anyhow::Context;
use clap::{Arg, Command};
use log::LevelFilter;
use mail_sorter::message::{duplicate_ids, next_message_id};
use mail_sorter::{
    ClassifierChain, Config, Fanout, LogSink, MailSorter, Message, RoutedEvent, Router,
    StatisticsCollector,
};
use std::process;

const DEFAULT_CONFIG_PATH: &str = "mail-sorter.yaml";

fn main() {
    let matches = Command::new("mail-sorter")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rule-based email classifier that sorts messages into folders")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Assemble the rule chain and folder mapping, then report validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("messages")
                .long("messages")
                .value_name("FILE")
                .help("Classify and route a YAML or JSON list of messages")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-email")
                .long("test-email")
                .value_name("FILE")
                .help("Classify and route a single raw email file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print each routed message as a JSON line")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Print statistics for the run as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging with per-rule evaluation")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        test_config(config);
        return;
    }

    let stats = StatisticsCollector::new();
    let sink = Fanout::new().with(LogSink).with(stats.clone());
    let sorter = match MailSorter::from_config(config, sink) {
        Ok(sorter) => sorter,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            process::exit(1);
        }
    };

    let mut messages = Vec::new();
    if let Some(path) = matches.get_one::<String>("messages") {
        match load_messages(path) {
            Ok(batch) => messages.extend(batch),
            Err(e) => {
                eprintln!("Error loading messages: {e:#}");
                process::exit(1);
            }
        }
    }
    if let Some(path) = matches.get_one::<String>("test-email") {
        match std::fs::read_to_string(path) {
            Ok(raw) => match next_message_id(&messages) {
                Some(id) => messages.push(Message::from_raw(id, &raw)),
                None => {
                    log::error!("No free message id left for {path}; skipping it");
                }
            },
            Err(e) => {
                eprintln!("Error reading email file {path}: {e}");
                process::exit(1);
            }
        }
    }

    let duplicates = duplicate_ids(&messages);
    if !duplicates.is_empty() {
        log::warn!("Message ids are not unique within this run: {duplicates:?}");
    }

    if messages.is_empty() {
        log::warn!("No messages to sort; pass --messages or --test-email");
        return;
    }

    let events = sorter.process_batch(&mut messages);
    let as_json = matches.get_flag("json");
    for event in &events {
        print_event(event, as_json);
    }

    if matches.get_flag("stats") {
        match serde_json::to_string_pretty(&stats.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to serialize statistics: {e}"),
        }
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the rules and folders to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}

fn test_config(config: Config) {
    println!("Testing configuration...");
    println!("Number of rules: {}", config.rules.len());
    for (i, rule) in config.rules.iter().enumerate() {
        println!("  Rule {}: {} -> {}", i + 1, rule.name, rule.outcome());
    }

    let chain = match ClassifierChain::new(config.rules) {
        Ok(chain) => chain,
        Err(e) => {
            println!("Configuration validation failed: {e}");
            process::exit(1);
        }
    };
    if let Err(e) = Router::new(config.folders, LogSink) {
        println!("Configuration validation failed: {e}");
        process::exit(1);
    }

    if !chain.is_total() {
        println!("Note: no catch-all rule; unmatched messages keep their current classification");
    }
    println!("Configuration is valid.");
}

fn load_messages(path: &str) -> anyhow::Result<Vec<Message>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read messages file: {path}"))?;
    // JSON is a subset of YAML, so one parser covers both formats
    let messages: Vec<Message> = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse messages file: {path}"))?;
    Ok(messages)
}

fn print_event(event: &RoutedEvent, as_json: bool) {
    if as_json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => log::error!(
                "Failed to serialize event for message {}: {e}",
                event.message_id
            ),
        }
    } else {
        println!(
            "message {} from '{}' marked [{}] -> {}",
            event.message_id, event.sender, event.classification, event.destination
        );
    }
}
