// API для контактов

use crate::api::{with_timeout, TdClient};
use crate::protocol::messages::{Chat, Contact};
use crate::utils::error::{Result, SessionError};
use crate::utils::validation::normalize_phone_number;
use std::time::Duration;
use tracing::debug;

/// Импортировать контакт по номеру и открыть с ним приватный чат.
///
/// # Ошибки
///
/// - `InvalidInput` - номер пустой после удаления форматирования
/// - `NoMatchingUser` - импорт не нашёл ни одного зарегистрированного пользователя
pub async fn create_contact<C: TdClient + ?Sized>(
    client: &C,
    phone_number: &str,
    timeout: Option<Duration>,
) -> Result<Chat> {
    let normalized = normalize_phone_number(phone_number)?;

    let imported = with_timeout(
        "importContacts",
        timeout,
        client.import_contacts(vec![Contact::from_phone(normalized)]),
    )
    .await?;

    let user_id = imported
        .first_user_id()
        .ok_or_else(|| SessionError::NoMatchingUser(phone_number.to_string()))?;

    debug!(target: "session::contacts", user_id, "Contact imported, opening private chat");

    with_timeout("createPrivateChat", timeout, client.create_private_chat(user_id, false)).await
}
