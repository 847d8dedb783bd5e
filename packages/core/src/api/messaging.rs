// API для отправки сообщений

use crate::api::{with_timeout, TdClient};
use crate::protocol::messages::{InputMessageContent, Message};
use crate::utils::error::Result;
use std::time::Duration;
use tracing::debug;

/// Отправить текст в чат как есть: без разметки, очереди и повторов.
/// Возвращается, когда внешний клиент подтвердил отправку
pub async fn send_text<C: TdClient + ?Sized>(
    client: &C,
    chat_id: i64,
    text: &str,
    timeout: Option<Duration>,
) -> Result<Message> {
    debug!(target: "session::messaging", chat_id, len = text.len(), "Sending text message");

    with_timeout(
        "sendMessage",
        timeout,
        client.send_message(chat_id, InputMessageContent::plain_text(text)),
    )
    .await
}
