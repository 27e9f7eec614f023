//! mailtools - Command-line entry point for the email tools

use anyhow::Context;
use mailtools::tools::DEFAULT_READ_LIMIT;
use mailtools::{MailTools, Settings};

const USAGE: &str = "usage:
  mailtools send <to> <subject> <body> [cc]
  mailtools read [limit] [unread]
  mailtools test
  mailtools notify <recipient> <message>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so replies on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let settings = Settings::load().context("failed to load settings")?;
    tracing::debug!(?settings, "settings loaded");
    let tools = MailTools::new(settings);

    let reply = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["send", to, subject, body] => tools.send_email(to, subject, body, None).await,
        ["send", to, subject, body, cc] => tools.send_email(to, subject, body, Some(*cc)).await,
        ["read"] => tools.read_recent_emails(DEFAULT_READ_LIMIT, "false").await,
        ["read", limit] => tools.read_recent_emails(parse_limit(limit)?, "false").await,
        ["read", limit, unread] => tools.read_recent_emails(parse_limit(limit)?, unread).await,
        ["test"] => tools.test_email_connection().await,
        ["notify", recipient, message] => tools.send_quick_notification(recipient, message).await,
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    println!("{}", reply);
    Ok(())
}

fn parse_limit(value: &str) -> anyhow::Result<i64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("limit must be an integer, got {:?}", value))
}
