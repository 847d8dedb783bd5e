// Демонстрация: вход, контакт, сообщение и рассылка по первым чатам
//
// TG_API_ID=... TG_API_HASH=... TG_PHONE_NUMBER=+55... \
//     cargo run --features tdjson --bin connect-telegram -- +55<contact>

use anyhow::{Context, Result};
use connect_core::protocol::messages::Message;
use connect_core::utils::logging::init_logging;
use connect_core::{Config, JsonConnector, Session};
use futures::StreamExt;
use tracing::{info, Level};

const GREETING: &str = "Hello World!";
const CHANNEL_LIMIT: usize = 5;

fn log_message(message: &Message) {
    info!(
        target: "connect_telegram",
        chat_id = message.chat_id,
        sent_at = ?message.sent_at(),
        text = message.text().unwrap_or("<non-text>"),
        "New message"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(Level::INFO);

    let config = Config::from_env().context("Failed to load configuration")?;
    let contact_phone = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TG_CONTACT_PHONE").ok())
        .context("Pass the contact phone number as the first argument or TG_CONTACT_PHONE")?;

    let mut session = Session::new(config, JsonConnector::tdjson()).with_message_listener(log_message);
    session.connect().await.context("Failed to connect")?;

    let contact = session
        .create_contact(&contact_phone)
        .await
        .context("Failed to create contact")?;
    session.send_message(contact.id, GREETING).await?;
    info!(target: "connect_telegram", chat_id = contact.id, "Greeting sent to contact");

    println!("Press Enter to message the first {} chats...", CHANNEL_LIMIT);
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| ())
    })
    .await??;

    let mut channels = session.get_channels(CHANNEL_LIMIT);
    while let Some(channel) = channels.next().await {
        let channel = channel.context("Failed to enumerate chats")?;
        session.send_message(channel.id, GREETING).await?;
        info!(target: "connect_telegram", chat_id = channel.id, title = %channel.title, "Greeting sent");
    }

    session.close().await?;
    Ok(())
}
