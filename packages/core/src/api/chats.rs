//! Перечисление чатов
//!
//! Ленивый однопроходный поток: `getChats` уходит только при первом опросе,
//! затем на каждый идентификатор последовательно уходит `getChat`.
//! Потребитель должен ожидать O(limit) сетевых запросов, а не один пакетный.

use crate::api::{with_timeout, TdClient};
use crate::protocol::messages::Chat;
use crate::utils::error::Result;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

/// Что делать, если запрос одного чата упал
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelErrorPolicy {
    /// Отдать ошибку и закончить поток
    #[default]
    Abort,
    /// Пропустить чат и продолжить. Ошибка `getChats` всё равно заканчивает поток
    Skip,
}

enum Cursor {
    Start,
    Ids(std::vec::IntoIter<i64>),
    Done,
}

/// Не более `limit` чатов типа private / basic group / supergroup
pub fn channels<C: TdClient>(
    client: Arc<C>,
    limit: usize,
    policy: ChannelErrorPolicy,
    timeout: Option<Duration>,
) -> BoxStream<'static, Result<Chat>> {
    stream::unfold(Cursor::Start, move |cursor| {
        let client = Arc::clone(&client);
        async move {
            let mut ids = match cursor {
                Cursor::Done => return None,
                Cursor::Start if limit == 0 => return None,
                Cursor::Start => {
                    let requested = i32::try_from(limit).unwrap_or(i32::MAX);
                    match with_timeout("getChats", timeout, client.get_chats(requested)).await {
                        Ok(chats) => {
                            let mut chat_ids = chats.chat_ids;
                            chat_ids.truncate(limit);
                            chat_ids.into_iter()
                        }
                        Err(e) => return Some((Err(e), Cursor::Done)),
                    }
                }
                Cursor::Ids(ids) => ids,
            };

            loop {
                let Some(chat_id) = ids.next() else {
                    return None;
                };

                match with_timeout("getChat", timeout, client.get_chat(chat_id)).await {
                    Ok(chat) if chat.chat_type.is_channel_like() => {
                        return Some((Ok(chat), Cursor::Ids(ids)));
                    }
                    Ok(chat) => {
                        trace!(target: "session::chats", chat_id, chat_type = ?chat.chat_type, "Skipping chat");
                    }
                    Err(e) => match policy {
                        ChannelErrorPolicy::Abort => return Some((Err(e), Cursor::Done)),
                        ChannelErrorPolicy::Skip => {
                            warn!(target: "session::chats", chat_id, error = %e, "Skipping chat after failed request");
                        }
                    },
                }
            }
        }
    })
    .boxed()
}
