// Хук для входящих сообщений (updateNewMessage)

use crate::protocol::messages::Message;

/// Получает каждое новое сообщение из потока событий.
///
/// Вызывается в задаче диспетчера, поэтому не должен блокировать надолго.
/// По умолчанию используется `NoopListener`.
pub trait MessageListener: Send + Sync {
    fn on_new_message(&self, message: &Message);
}

/// Ничего не делает
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl MessageListener for NoopListener {
    fn on_new_message(&self, _message: &Message) {}
}

impl<F> MessageListener for F
where
    F: Fn(&Message) + Send + Sync,
{
    fn on_new_message(&self, message: &Message) {
        self(message)
    }
}
