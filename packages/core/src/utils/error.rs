// Типы ошибок

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Внешний клиент недоступен или соединение разорвано (можно повторить)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Внешний клиент ответил объектом `error`
    #[error("Request {method} failed ({code}): {message}")]
    Request {
        method: &'static str,
        code: i32,
        message: String,
    },

    /// Неверный код или пароль. Повторных попыток не делаем
    #[error("Authentication rejected: {0}")]
    AuthenticationRejected(String),

    #[error("No matching user for phone number {0}")]
    NoMatchingUser(String),

    #[error("Timed out after {after:?} waiting for {operation}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Клиент перешёл в состояние входа, которое сессия не умеет проходить
    /// (регистрация, e-mail и т.п.)
    #[error("Unsupported authorization state after {0}")]
    UnsupportedAuthorizationState(&'static str),

    #[error("Session is not connected")]
    NotConnected,

    /// Диспетчер не смог отправить параметры клиенту до открытия gate
    #[error("Readiness gate failed: {0}")]
    GateFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Prompt error: {0}")]
    PromptError(String),
}

impl SessionError {
    /// Ошибки, после которых вызывающий код может повторить операцию
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Transport(_) | SessionError::Timeout { .. })
    }

    /// Переводит отказ внешнего клиента в ошибку аутентификации.
    /// Транспортные ошибки и таймауты остаются как есть.
    pub(crate) fn into_auth_rejection(self) -> Self {
        match self {
            SessionError::Request { message, .. } => SessionError::AuthenticationRejected(message),
            other => other,
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(error: serde_json::Error) -> Self {
        SessionError::SerializationError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
