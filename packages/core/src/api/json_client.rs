//! JSON Client - `TdClient` поверх JSON-интерфейса TDLib
//!
//! ## Архитектура
//!
//! ```text
//! JsonClient
//!   ├── execute()       - "@extra" + запись в pending, отправка через транспорт
//!   └── receive thread  - transport.receive() в цикле
//!         ├── ответ (есть "@extra")  → oneshot ожидающему запросу
//!         └── событие (нет "@extra") → UpdateReceiver
//! ```
//!
//! Ошибка транспорта завершает поток приёма: все ожидающие запросы получают
//! `SessionError::Transport`, поток событий закрывается.

use crate::api::{Connector, TdClient, UpdateReceiver};
use crate::protocol::messages::{
    Chat, Chats, Contact, Function, ImportedContacts, InputMessageContent, Message, TdlibParameters, Update, User,
};
use crate::protocol::transport::JsonTransport;
use crate::protocol::wire::{self, Incoming};
use crate::utils::error::{Result, SessionError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, trace, warn};

/// Сколько поток приёма ждёт в одном вызове `receive`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

type PendingMap = HashMap<u64, oneshot::Sender<Result<Value>>>;

struct Inner<T> {
    transport: T,
    pending: Mutex<PendingMap>,
    next_extra: AtomicU64,
    running: AtomicBool,
}

impl<T: JsonTransport> Inner<T> {
    fn pending(&self) -> MutexGuard<'_, PendingMap> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn receive_loop(&self, updates: mpsc::UnboundedSender<Update>, poll_interval: Duration) {
        debug!(target: "session::json_client", "Receive loop started");

        while self.running.load(Ordering::Acquire) {
            match self.transport.receive(poll_interval) {
                Ok(Some(data)) => self.route(&data, &updates),
                Ok(None) => continue,
                Err(e) => {
                    error!(target: "session::json_client", error = %e, "Transport receive failed");
                    self.running.store(false, Ordering::Release);
                    self.fail_pending(&e.to_string());
                    return;
                }
            }
        }

        self.fail_pending("client closed");
        debug!(target: "session::json_client", "Receive loop stopped");
    }

    fn route(&self, data: &str, updates: &mpsc::UnboundedSender<Update>) {
        match wire::unpack_incoming(data) {
            Ok(Incoming::Response { extra, body }) => match self.pending().remove(&extra) {
                Some(waiter) => {
                    // Ожидающий мог уже отвалиться по таймауту
                    let _ = waiter.send(Ok(body));
                }
                None => trace!(target: "session::json_client", extra, "Response without waiter"),
            },
            Ok(Incoming::Update(update)) => {
                if updates.send(update).is_err() {
                    trace!(target: "session::json_client", "Update receiver dropped");
                }
            }
            Err(e) => warn!(target: "session::json_client", error = %e, "Failed to unpack incoming object"),
        }
    }

    fn fail_pending(&self, reason: &str) {
        for (_, waiter) in self.pending().drain() {
            let _ = waiter.send(Err(SessionError::Transport(reason.to_string())));
        }
    }
}

/// Убирает запись из pending, если запрос отменили до ответа
struct PendingGuard<'a, T: JsonTransport> {
    inner: &'a Inner<T>,
    extra: u64,
}

impl<T: JsonTransport> Drop for PendingGuard<'_, T> {
    fn drop(&mut self) {
        self.inner.pending().remove(&self.extra);
    }
}

/// Клиент JSON-интерфейса с собственным потоком приёма
pub struct JsonClient<T: JsonTransport> {
    inner: Arc<Inner<T>>,
}

impl<T: JsonTransport> JsonClient<T> {
    /// Запустить поток приёма и вернуть клиента вместе с его потоком событий
    pub fn start(transport: T) -> Result<(Self, UpdateReceiver)> {
        Self::start_with_poll_interval(transport, DEFAULT_POLL_INTERVAL)
    }

    pub fn start_with_poll_interval(transport: T, poll_interval: Duration) -> Result<(Self, UpdateReceiver)> {
        let inner = Arc::new(Inner {
            transport,
            pending: Mutex::new(HashMap::new()),
            next_extra: AtomicU64::new(1),
            running: AtomicBool::new(true),
        });
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let worker = Arc::clone(&inner);
        std::thread::Builder::new()
            .name("td-receive".to_string())
            .spawn(move || worker.receive_loop(updates_tx, poll_interval))
            .map_err(|e| SessionError::Transport(format!("Failed to spawn receive thread: {}", e)))?;

        Ok((Self { inner }, updates_rx))
    }

    /// Отправить запрос и дождаться ответа с тем же "@extra"
    pub async fn execute(&self, function: &Function) -> Result<Value> {
        let extra = self.inner.next_extra.fetch_add(1, Ordering::Relaxed);
        let packed = wire::pack_request(function, extra)?;

        let (tx, rx) = oneshot::channel();
        {
            // Поток приёма сбрасывает running до fail_pending, а fail_pending берёт этот же lock
            let mut pending = self.inner.pending();
            if !self.inner.running.load(Ordering::Acquire) {
                return Err(SessionError::Transport("client is closed".to_string()));
            }
            pending.insert(extra, tx);
        }
        let _guard = PendingGuard {
            inner: &self.inner,
            extra,
        };

        trace!(target: "session::json_client", method = function.method_name(), extra, "Sending request");
        self.inner.transport.send(&packed)?;

        rx.await
            .map_err(|_| SessionError::Transport("response channel closed".to_string()))?
    }

    async fn call<R: DeserializeOwned>(&self, function: Function) -> Result<R> {
        let body = self.execute(&function).await?;
        wire::decode_response(function.method_name(), body)
    }

    async fn call_ok(&self, function: Function) -> Result<()> {
        let body = self.execute(&function).await?;
        wire::decode_ok(function.method_name(), body)
    }
}

impl<T: JsonTransport> Drop for JsonClient<T> {
    fn drop(&mut self) {
        self.inner.running.store(false, Ordering::Release);
    }
}

#[async_trait]
impl<T: JsonTransport> TdClient for JsonClient<T> {
    async fn set_log_verbosity_level(&self, level: i32) -> Result<()> {
        self.call_ok(Function::SetLogVerbosityLevel {
            new_verbosity_level: level,
        })
        .await
    }

    async fn set_tdlib_parameters(&self, parameters: TdlibParameters) -> Result<()> {
        self.call_ok(Function::SetTdlibParameters { parameters }).await
    }

    async fn check_database_encryption_key(&self, encryption_key: String) -> Result<()> {
        self.call_ok(Function::CheckDatabaseEncryptionKey { encryption_key }).await
    }

    async fn set_authentication_phone_number(&self, phone_number: String) -> Result<()> {
        self.call_ok(Function::SetAuthenticationPhoneNumber { phone_number }).await
    }

    async fn check_authentication_code(&self, code: String) -> Result<()> {
        self.call_ok(Function::CheckAuthenticationCode { code }).await
    }

    async fn check_authentication_password(&self, password: String) -> Result<()> {
        self.call_ok(Function::CheckAuthenticationPassword { password }).await
    }

    async fn send_message(&self, chat_id: i64, content: InputMessageContent) -> Result<Message> {
        self.call(Function::SendMessage {
            chat_id,
            input_message_content: content,
        })
        .await
    }

    async fn import_contacts(&self, contacts: Vec<Contact>) -> Result<ImportedContacts> {
        self.call(Function::ImportContacts { contacts }).await
    }

    async fn create_private_chat(&self, user_id: i64, force: bool) -> Result<Chat> {
        self.call(Function::CreatePrivateChat { user_id, force }).await
    }

    async fn get_chats(&self, limit: i32) -> Result<Chats> {
        self.call(Function::GetChats { limit }).await
    }

    async fn get_chat(&self, chat_id: i64) -> Result<Chat> {
        self.call(Function::GetChat { chat_id }).await
    }

    async fn get_me(&self) -> Result<User> {
        self.call(Function::GetMe).await
    }

    async fn close(&self) -> Result<()> {
        self.call_ok(Function::Close).await
    }
}

/// `Connector`, создающий новый транспорт на каждое подключение
pub struct JsonConnector<F> {
    make_transport: F,
    poll_interval: Duration,
}

impl<F> JsonConnector<F> {
    pub fn new(make_transport: F) -> Self {
        Self {
            make_transport,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[cfg(feature = "tdjson")]
impl JsonConnector<fn() -> Result<crate::protocol::transport::TdJsonTransport>> {
    /// Подключение через нативную libtdjson
    pub fn tdjson() -> Self {
        use crate::protocol::transport::TdJsonTransport;
        Self::new(TdJsonTransport::new as fn() -> Result<TdJsonTransport>)
    }
}

impl<F, T> Connector for JsonConnector<F>
where
    F: Fn() -> Result<T> + Send + Sync,
    T: JsonTransport,
{
    type Client = JsonClient<T>;

    fn connect(&self) -> Result<(Self::Client, UpdateReceiver)> {
        let transport = (self.make_transport)()?;
        JsonClient::start_with_poll_interval(transport, self.poll_interval)
    }
}
