//! Контракт внешнего клиента
//!
//! Сессия зависит только от этого контракта: запрос/ответ на каждое действие
//! (`TdClient`) плюс поток событий, который клиент присылает сам (`UpdateReceiver`).
//! Любая библиотека с той же формой подходит на место TDLib.
//!
//! ## Не отвечает за
//!
//! - Протокол, шифрование и локальную базу (это делает внешний клиент)
//! - Повторные попытки и rate limiting транспорта

pub mod chats;
pub mod contacts;
pub mod json_client;
pub mod messaging;

use crate::protocol::messages::{
    Chat, Chats, Contact, ImportedContacts, InputMessageContent, Message, TdlibParameters, Update, User,
};
use crate::utils::error::{Result, SessionError};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

pub use json_client::{JsonClient, JsonConnector};

/// Поток событий от внешнего клиента
pub type UpdateReceiver = mpsc::UnboundedReceiver<Update>;

/// Запросы к внешнему клиенту. Каждый метод: один запрос и один ответ
#[async_trait]
pub trait TdClient: Send + Sync + 'static {
    async fn set_log_verbosity_level(&self, level: i32) -> Result<()>;

    async fn set_tdlib_parameters(&self, parameters: TdlibParameters) -> Result<()>;

    async fn check_database_encryption_key(&self, encryption_key: String) -> Result<()>;

    async fn set_authentication_phone_number(&self, phone_number: String) -> Result<()>;

    async fn check_authentication_code(&self, code: String) -> Result<()>;

    async fn check_authentication_password(&self, password: String) -> Result<()>;

    async fn send_message(&self, chat_id: i64, content: InputMessageContent) -> Result<Message>;

    async fn import_contacts(&self, contacts: Vec<Contact>) -> Result<ImportedContacts>;

    async fn create_private_chat(&self, user_id: i64, force: bool) -> Result<Chat>;

    async fn get_chats(&self, limit: i32) -> Result<Chats>;

    async fn get_chat(&self, chat_id: i64) -> Result<Chat>;

    async fn get_me(&self) -> Result<User>;

    async fn close(&self) -> Result<()>;
}

/// Создаёт новый экземпляр внешнего клиента вместе с его потоком событий.
/// Вызывается один раз на каждую попытку подключения
pub trait Connector: Send + Sync {
    type Client: TdClient;

    fn connect(&self) -> Result<(Self::Client, UpdateReceiver)>;
}

/// Ограничить один запрос по времени. `None` = ждать сколько потребуется
pub(crate) async fn with_timeout<T, F>(operation: &'static str, timeout: Option<Duration>, request: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(after) => tokio::time::timeout(after, request)
            .await
            .map_err(|_| SessionError::Timeout { operation, after })?,
        None => request.await,
    }
}
