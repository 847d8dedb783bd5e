// Типы объектов внешнего клиента
// Соответствуют JSON-интерфейсу TDLib: полиморфные объекты различаются полем "@type"

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Objects
// ============================================================================

/// Параметры, которые клиент ждёт в состоянии authorizationStateWaitTdlibParameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TdlibParameters {
    pub use_test_dc: bool,
    pub database_directory: String,
    pub files_directory: String,
    pub use_file_database: bool,
    pub use_chat_info_database: bool,
    pub use_message_database: bool,
    pub use_secret_chats: bool,
    pub api_id: i32,
    pub api_hash: String,
    pub system_language_code: String,
    pub device_model: String,
    pub system_version: String,
    pub application_version: String,
    pub enable_storage_optimizer: bool,
    pub ignore_file_names: bool,
}

/// Фаза авторизации внешнего клиента
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum AuthorizationState {
    #[serde(rename = "authorizationStateWaitTdlibParameters")]
    WaitTdlibParameters,
    #[serde(rename = "authorizationStateWaitEncryptionKey")]
    WaitEncryptionKey {
        #[serde(default)]
        is_encrypted: bool,
    },
    #[serde(rename = "authorizationStateWaitPhoneNumber")]
    WaitPhoneNumber,
    #[serde(rename = "authorizationStateWaitCode")]
    WaitCode,
    #[serde(rename = "authorizationStateWaitPassword")]
    WaitPassword {
        #[serde(default)]
        password_hint: String,
    },
    #[serde(rename = "authorizationStateReady")]
    Ready,
    #[serde(rename = "authorizationStateLoggingOut")]
    LoggingOut,
    #[serde(rename = "authorizationStateClosing")]
    Closing,
    #[serde(rename = "authorizationStateClosed")]
    Closed,
    #[serde(other)]
    Other,
}

/// Состояние сетевого соединения внешнего клиента
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum ConnectionState {
    #[serde(rename = "connectionStateWaitingForNetwork")]
    WaitingForNetwork,
    #[serde(rename = "connectionStateConnectingToProxy")]
    ConnectingToProxy,
    #[serde(rename = "connectionStateConnecting")]
    Connecting,
    #[serde(rename = "connectionStateUpdating")]
    Updating,
    #[serde(rename = "connectionStateReady")]
    Ready,
    #[serde(other)]
    Other,
}

/// Пользователь
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
}

/// Тип чата. Остальные поля чата мы не интерпретируем
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum ChatType {
    #[serde(rename = "chatTypePrivate")]
    Private { user_id: i64 },
    #[serde(rename = "chatTypeBasicGroup")]
    BasicGroup { basic_group_id: i64 },
    #[serde(rename = "chatTypeSupergroup")]
    Supergroup {
        supergroup_id: i64,
        #[serde(default)]
        is_channel: bool,
    },
    #[serde(rename = "chatTypeSecret")]
    Secret { secret_chat_id: i32, user_id: i64 },
    #[serde(other)]
    Other,
}

impl ChatType {
    /// Приватный чат, обычная группа или супергруппа (включая broadcast-каналы)
    pub fn is_channel_like(&self) -> bool {
        matches!(
            self,
            ChatType::Private { .. } | ChatType::BasicGroup { .. } | ChatType::Supergroup { .. }
        )
    }
}

/// Чат
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    #[serde(default)]
    pub title: String,
}

/// Список идентификаторов чатов (ответ на getChats)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chats {
    #[serde(default)]
    pub total_count: i32,
    #[serde(default)]
    pub chat_ids: Vec<i64>,
}

/// Контакт для importContacts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub phone_number: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub vcard: String,
    #[serde(default)]
    pub user_id: i64,
}

impl Contact {
    pub fn from_phone(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            ..Self::default()
        }
    }
}

/// Результат importContacts.
/// `user_ids` идут в порядке запроса; 0, если номер не зарегистрирован
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedContacts {
    #[serde(default)]
    pub user_ids: Vec<i64>,
    #[serde(default)]
    pub importer_count: Vec<i32>,
}

impl ImportedContacts {
    /// Первый найденный пользователь, если он есть
    pub fn first_user_id(&self) -> Option<i64> {
        self.user_ids.first().copied().filter(|id| *id != 0)
    }
}

/// Текст с разметкой
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedText {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<serde_json::Value>,
}

/// Содержимое исходящего сообщения
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum InputMessageContent {
    #[serde(rename = "inputMessageText")]
    Text { text: FormattedText },
}

impl InputMessageContent {
    /// Простой текст без разметки
    pub fn plain_text(text: impl Into<String>) -> Self {
        InputMessageContent::Text {
            text: FormattedText {
                text: text.into(),
                entities: Vec::new(),
            },
        }
    }
}

/// Содержимое полученного сообщения
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum MessageContent {
    #[serde(rename = "messageText")]
    Text { text: FormattedText },
    #[serde(other)]
    Other,
}

/// Сообщение
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    /// Unix timestamp в секундах
    #[serde(default)]
    pub date: i64,
    pub content: MessageContent,
}

impl Message {
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text { text } => Some(&text.text),
            MessageContent::Other => None,
        }
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.date, 0)
    }
}

/// Ошибка, которой внешний клиент отвечает на запрос
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdError {
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// Updates (клиент -> нас)
// ============================================================================

/// События, которые внешний клиент присылает сам
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum Update {
    #[serde(rename = "updateAuthorizationState")]
    AuthorizationState {
        authorization_state: AuthorizationState,
    },
    #[serde(rename = "updateUser")]
    User { user: User },
    #[serde(rename = "updateConnectionState")]
    ConnectionState { state: ConnectionState },
    #[serde(rename = "updateNewMessage")]
    NewMessage { message: Message },
    #[serde(other)]
    Other,
}

impl Update {
    pub fn authorization(state: AuthorizationState) -> Self {
        Update::AuthorizationState {
            authorization_state: state,
        }
    }
}

// ============================================================================
// Functions (мы -> клиент)
// ============================================================================

/// Запросы к внешнему клиенту
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub enum Function {
    SetLogVerbosityLevel {
        new_verbosity_level: i32,
    },
    SetTdlibParameters {
        parameters: TdlibParameters,
    },
    CheckDatabaseEncryptionKey {
        encryption_key: String,
    },
    SetAuthenticationPhoneNumber {
        phone_number: String,
    },
    CheckAuthenticationCode {
        code: String,
    },
    CheckAuthenticationPassword {
        password: String,
    },
    SendMessage {
        chat_id: i64,
        input_message_content: InputMessageContent,
    },
    ImportContacts {
        contacts: Vec<Contact>,
    },
    CreatePrivateChat {
        user_id: i64,
        force: bool,
    },
    GetChats {
        limit: i32,
    },
    GetChat {
        chat_id: i64,
    },
    GetMe,
    Close,
}

impl Function {
    /// Имя метода в том виде, в каком оно уходит в "@type"
    pub fn method_name(&self) -> &'static str {
        match self {
            Function::SetLogVerbosityLevel { .. } => "setLogVerbosityLevel",
            Function::SetTdlibParameters { .. } => "setTdlibParameters",
            Function::CheckDatabaseEncryptionKey { .. } => "checkDatabaseEncryptionKey",
            Function::SetAuthenticationPhoneNumber { .. } => "setAuthenticationPhoneNumber",
            Function::CheckAuthenticationCode { .. } => "checkAuthenticationCode",
            Function::CheckAuthenticationPassword { .. } => "checkAuthenticationPassword",
            Function::SendMessage { .. } => "sendMessage",
            Function::ImportContacts { .. } => "importContacts",
            Function::CreatePrivateChat { .. } => "createPrivateChat",
            Function::GetChats { .. } => "getChats",
            Function::GetChat { .. } => "getChat",
            Function::GetMe => "getMe",
            Function::Close => "close",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_type_filter() {
        assert!(ChatType::Private { user_id: 1 }.is_channel_like());
        assert!(ChatType::BasicGroup { basic_group_id: 2 }.is_channel_like());
        assert!(ChatType::Supergroup {
            supergroup_id: 3,
            is_channel: true
        }
        .is_channel_like());
        assert!(!ChatType::Secret {
            secret_chat_id: 4,
            user_id: 1
        }
        .is_channel_like());
        assert!(!ChatType::Other.is_channel_like());
    }

    #[test]
    fn test_decode_chat_ignores_unknown_fields() {
        let chat: Chat = serde_json::from_value(json!({
            "@type": "chat",
            "id": -100123,
            "type": { "@type": "chatTypeSupergroup", "supergroup_id": 123, "is_channel": false },
            "title": "Rustaceans",
            "unread_count": 7
        }))
        .unwrap();

        assert_eq!(chat.id, -100123);
        assert_eq!(chat.title, "Rustaceans");
        assert_eq!(
            chat.chat_type,
            ChatType::Supergroup {
                supergroup_id: 123,
                is_channel: false
            }
        );
    }

    #[test]
    fn test_unknown_tags_decode_to_other() {
        let update: Update = serde_json::from_value(json!({
            "@type": "updateOption",
            "name": "version",
            "value": { "@type": "optionValueString", "value": "1.8.0" }
        }))
        .unwrap();
        assert_eq!(update, Update::Other);

        let state: AuthorizationState = serde_json::from_value(json!({
            "@type": "authorizationStateWaitEmailAddress",
            "allow_apple_id": false
        }))
        .unwrap();
        assert_eq!(state, AuthorizationState::Other);

        let chat_type: ChatType = serde_json::from_value(json!({ "@type": "chatTypeFuture" })).unwrap();
        assert_eq!(chat_type, ChatType::Other);
    }

    #[test]
    fn test_decode_wait_code_with_extra_fields() {
        let update: Update = serde_json::from_value(json!({
            "@type": "updateAuthorizationState",
            "authorization_state": {
                "@type": "authorizationStateWaitCode",
                "code_info": { "@type": "authenticationCodeInfo", "phone_number": "+5511" }
            }
        }))
        .unwrap();
        assert_eq!(update, Update::authorization(AuthorizationState::WaitCode));
    }

    #[test]
    fn test_encode_send_message() {
        let function = Function::SendMessage {
            chat_id: 42,
            input_message_content: InputMessageContent::plain_text("Hello World!"),
        };

        let value = serde_json::to_value(&function).unwrap();
        assert_eq!(value["@type"], "sendMessage");
        assert_eq!(value["chat_id"], 42);
        assert_eq!(value["input_message_content"]["@type"], "inputMessageText");
        assert_eq!(value["input_message_content"]["text"]["text"], "Hello World!");
        assert_eq!(function.method_name(), "sendMessage");
    }

    #[test]
    fn test_encode_unit_function() {
        let value = serde_json::to_value(Function::GetMe).unwrap();
        assert_eq!(value, json!({ "@type": "getMe" }));
    }

    #[test]
    fn test_imported_contacts_first_user() {
        let found = ImportedContacts {
            user_ids: vec![777],
            importer_count: vec![0],
        };
        assert_eq!(found.first_user_id(), Some(777));

        let unregistered = ImportedContacts {
            user_ids: vec![0],
            importer_count: vec![3],
        };
        assert_eq!(unregistered.first_user_id(), None);
        assert_eq!(ImportedContacts::default().first_user_id(), None);
    }

    #[test]
    fn test_message_helpers() {
        let message: Message = serde_json::from_value(json!({
            "@type": "message",
            "id": 1,
            "chat_id": 2,
            "date": 1_700_000_000,
            "content": { "@type": "messageText", "text": { "@type": "formattedText", "text": "hi", "entities": [] } }
        }))
        .unwrap();

        assert_eq!(message.text(), Some("hi"));
        assert_eq!(message.sent_at().map(|t| t.timestamp()), Some(1_700_000_000));
    }
}
