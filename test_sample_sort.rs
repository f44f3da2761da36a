use mail_sorter::{Config, LogSink, MailSorter, Message};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Sorting the five sample messages with the default chain...");

    let sorter = MailSorter::from_config(Config::default(), LogSink)?;

    let mut messages = vec![
        Message::new(1, "user@gmail.com", "special sale today"),
        Message::new(2, "director@corp.com", "execute the order"),
        Message::new(3, "coworker@corp.com", "sending you the memo"),
        Message::new(4, "user4", "hello"),
        Message::new(5, "user", "password: 123"),
    ];

    for event in sorter.process_batch(&mut messages) {
        println!(
            "message {} ({}) marked [{}] -> {} via {}",
            event.message_id,
            event.sender,
            event.classification,
            event.destination,
            event.rule.as_deref().unwrap_or("no rule")
        );
    }

    Ok(())
}
