//! Fake external client for session tests
//!
//! Records every request and pushes scripted updates in reaction to them,
//! the way the real client reports authorization progress.

#![allow(dead_code)]

use async_trait::async_trait;
use connect_core::protocol::messages::{
    AuthorizationState, Chat, ChatType, Chats, Contact, FormattedText, ImportedContacts, InputMessageContent,
    Message, MessageContent, TdlibParameters, Update, User,
};
use connect_core::{AuthPrompt, Config, Connector, Result, SessionError, TdClient, UpdateReceiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const PHONE: &str = "+5511999990000";
pub const CODE: &str = "12345";
pub const PASSWORD: &str = "hunter2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetLogVerbosity(i32),
    SetParameters { api_id: i32 },
    CheckEncryptionKey(String),
    SetPhone(String),
    CheckCode(String),
    CheckPassword(String),
    SendMessage { chat_id: i64, text: String },
    ImportContacts(Vec<String>),
    CreatePrivateChat(i64),
    GetChats(i32),
    GetChat(i64),
    GetMe,
    Close,
}

impl Call {
    pub fn is_authentication(&self) -> bool {
        matches!(self, Call::SetPhone(_) | Call::CheckCode(_) | Call::CheckPassword(_))
    }
}

/// Updates pushed after each successful request
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub on_connect: Vec<Update>,
    pub after_parameters: Vec<Update>,
    pub after_encryption_key: Vec<Update>,
    pub after_phone: Vec<Update>,
    pub after_code: Vec<Update>,
    pub after_password: Vec<Update>,
    pub reject_parameters: bool,
    pub imported_user_ids: Vec<i64>,
    pub chats: Vec<Chat>,
    pub failing_chats: Vec<i64>,
}

impl Script {
    /// Parameters and database key are accepted, then `after_key` is pushed
    pub fn startup(after_key: Vec<Update>) -> Self {
        Self {
            on_connect: vec![auth(AuthorizationState::WaitTdlibParameters)],
            after_parameters: vec![auth(AuthorizationState::WaitEncryptionKey { is_encrypted: false })],
            after_encryption_key: after_key,
            ..Self::default()
        }
    }
}

pub fn auth(state: AuthorizationState) -> Update {
    Update::authorization(state)
}

pub fn wait_password() -> Update {
    auth(AuthorizationState::WaitPassword {
        password_hint: "pet name".to_string(),
    })
}

pub fn user_update() -> Update {
    Update::User { user: me() }
}

pub fn me() -> User {
    User {
        id: 1,
        first_name: "Ana".to_string(),
        last_name: String::new(),
        phone_number: PHONE.trim_start_matches('+').to_string(),
    }
}

pub fn chat(id: i64, chat_type: ChatType) -> Chat {
    Chat {
        id,
        chat_type,
        title: format!("chat {}", id),
    }
}

pub fn text_message(chat_id: i64, text: &str) -> Message {
    Message {
        id: 100,
        chat_id,
        date: 1_700_000_000,
        content: MessageContent::Text {
            text: FormattedText {
                text: text.to_string(),
                entities: Vec::new(),
            },
        },
    }
}

fn rejected(method: &'static str, message: &str) -> SessionError {
    SessionError::Request {
        method,
        code: 400,
        message: message.to_string(),
    }
}

pub struct FakeClient {
    script: Arc<Script>,
    calls: Arc<Mutex<Vec<Call>>>,
    updates: mpsc::UnboundedSender<Update>,
}

impl FakeClient {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn push(&self, updates: &[Update]) {
        for update in updates {
            let _ = self.updates.send(update.clone());
        }
    }
}

#[async_trait]
impl TdClient for FakeClient {
    async fn set_log_verbosity_level(&self, level: i32) -> Result<()> {
        self.record(Call::SetLogVerbosity(level));
        Ok(())
    }

    async fn set_tdlib_parameters(&self, parameters: TdlibParameters) -> Result<()> {
        self.record(Call::SetParameters {
            api_id: parameters.api_id,
        });
        if self.script.reject_parameters {
            return Err(rejected("setTdlibParameters", "API_ID_INVALID"));
        }
        self.push(&self.script.after_parameters);
        Ok(())
    }

    async fn check_database_encryption_key(&self, encryption_key: String) -> Result<()> {
        self.record(Call::CheckEncryptionKey(encryption_key));
        self.push(&self.script.after_encryption_key);
        Ok(())
    }

    async fn set_authentication_phone_number(&self, phone_number: String) -> Result<()> {
        self.record(Call::SetPhone(phone_number));
        self.push(&self.script.after_phone);
        Ok(())
    }

    async fn check_authentication_code(&self, code: String) -> Result<()> {
        self.record(Call::CheckCode(code.clone()));
        if code != CODE {
            return Err(rejected("checkAuthenticationCode", "PHONE_CODE_INVALID"));
        }
        self.push(&self.script.after_code);
        Ok(())
    }

    async fn check_authentication_password(&self, password: String) -> Result<()> {
        self.record(Call::CheckPassword(password.clone()));
        if password != PASSWORD {
            return Err(rejected("checkAuthenticationPassword", "PASSWORD_HASH_INVALID"));
        }
        self.push(&self.script.after_password);
        Ok(())
    }

    async fn send_message(&self, chat_id: i64, content: InputMessageContent) -> Result<Message> {
        let InputMessageContent::Text { text } = content;
        self.record(Call::SendMessage {
            chat_id,
            text: text.text.clone(),
        });
        Ok(text_message(chat_id, &text.text))
    }

    async fn import_contacts(&self, contacts: Vec<Contact>) -> Result<ImportedContacts> {
        self.record(Call::ImportContacts(
            contacts.into_iter().map(|c| c.phone_number).collect(),
        ));
        Ok(ImportedContacts {
            user_ids: self.script.imported_user_ids.clone(),
            importer_count: vec![0; self.script.imported_user_ids.len()],
        })
    }

    async fn create_private_chat(&self, user_id: i64, _force: bool) -> Result<Chat> {
        self.record(Call::CreatePrivateChat(user_id));
        Ok(chat(user_id, ChatType::Private { user_id }))
    }

    async fn get_chats(&self, limit: i32) -> Result<Chats> {
        self.record(Call::GetChats(limit));
        let chat_ids: Vec<i64> = self
            .script
            .chats
            .iter()
            .map(|c| c.id)
            .take(limit as usize)
            .collect();
        Ok(Chats {
            total_count: chat_ids.len() as i32,
            chat_ids,
        })
    }

    async fn get_chat(&self, chat_id: i64) -> Result<Chat> {
        self.record(Call::GetChat(chat_id));
        if self.script.failing_chats.contains(&chat_id) {
            return Err(SessionError::Transport("connection reset".to_string()));
        }
        self.script
            .chats
            .iter()
            .find(|c| c.id == chat_id)
            .cloned()
            .ok_or_else(|| rejected("getChat", "Chat not found"))
    }

    async fn get_me(&self) -> Result<User> {
        self.record(Call::GetMe);
        Ok(me())
    }

    async fn close(&self) -> Result<()> {
        self.record(Call::Close);
        self.push(&[auth(AuthorizationState::Closed)]);
        Ok(())
    }
}

#[derive(Clone)]
pub struct FakeConnector {
    script: Arc<Script>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeConnector {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn authentication_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_authentication).collect()
    }
}

impl Connector for FakeConnector {
    type Client = FakeClient;

    fn connect(&self) -> Result<(FakeClient, UpdateReceiver)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = FakeClient {
            script: Arc::clone(&self.script),
            calls: Arc::clone(&self.calls),
            updates: tx,
        };
        client.push(&self.script.on_connect);
        Ok((client, rx))
    }
}

/// Answers prompts with fixed values and remembers what was asked
#[derive(Clone)]
pub struct ScriptedPrompt {
    code: String,
    password: String,
    asked: Arc<Mutex<Vec<&'static str>>>,
}

impl ScriptedPrompt {
    pub fn new(code: &str, password: &str) -> Self {
        Self {
            code: code.to_string(),
            password: password.to_string(),
            asked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn asked(&self) -> Vec<&'static str> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthPrompt for ScriptedPrompt {
    async fn code(&self) -> Result<String> {
        self.asked.lock().unwrap().push("code");
        Ok(self.code.clone())
    }

    async fn password(&self) -> Result<String> {
        self.asked.lock().unwrap().push("password");
        Ok(self.password.clone())
    }
}

pub fn test_config() -> Config {
    Config::new(12345, "0123456789abcdef", PHONE)
        .with_data_dir(std::env::temp_dir())
        .with_auth_timeout(Some(Duration::from_secs(2)))
        .with_request_timeout(Some(Duration::from_secs(2)))
}
