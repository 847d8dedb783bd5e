// Фаза авторизации внешнего клиента, как её видит сессия

use crate::protocol::messages::AuthorizationState;
use crate::utils::error::{Result, SessionError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Наблюдаемая фаза. Меняется только событиями от внешнего клиента
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationPhase {
    Uninitialized,
    WaitParameters,
    WaitEncryptionKey,
    WaitPhoneOrCode,
    WaitPassword,
    /// Состояние, которое сессия не проходит сама (регистрация, e-mail и т.п.)
    Unsupported,
    Authenticated,
}

impl AuthorizationPhase {
    /// Фаза для состояния клиента; `None` для состояний, которые фазу не меняют
    pub fn from_state(state: &AuthorizationState) -> Option<Self> {
        match state {
            AuthorizationState::WaitTdlibParameters => Some(Self::WaitParameters),
            AuthorizationState::WaitEncryptionKey { .. } => Some(Self::WaitEncryptionKey),
            AuthorizationState::WaitPhoneNumber | AuthorizationState::WaitCode => Some(Self::WaitPhoneOrCode),
            AuthorizationState::WaitPassword { .. } => Some(Self::WaitPassword),
            AuthorizationState::Ready => Some(Self::Authenticated),
            AuthorizationState::Other => Some(Self::Unsupported),
            AuthorizationState::LoggingOut | AuthorizationState::Closing | AuthorizationState::Closed => None,
        }
    }

    /// После отправки кода: пароль, завершённый вход или тупик
    pub fn is_past_code(self) -> bool {
        matches!(self, Self::WaitPassword | Self::Unsupported | Self::Authenticated)
    }
}

/// Последняя наблюдаемая фаза. Один писатель (диспетчер), один читатель (аутентификация)
#[derive(Debug, Clone)]
pub struct AuthTracker {
    tx: Arc<watch::Sender<AuthorizationPhase>>,
}

impl AuthTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthorizationPhase::Uninitialized);
        Self { tx: Arc::new(tx) }
    }

    pub fn phase(&self) -> AuthorizationPhase {
        *self.tx.borrow()
    }

    /// Зафиксировать фазу. Из `Authenticated` назад не откатываемся
    pub fn set(&self, phase: AuthorizationPhase) {
        self.tx.send_if_modified(|current| {
            if *current == phase || *current == AuthorizationPhase::Authenticated {
                return false;
            }
            *current = phase;
            true
        });
    }

    /// Дождаться фазы после проверки кода (пароль или вход завершён)
    pub async fn wait_past_code(&self, timeout: Option<Duration>) -> Result<AuthorizationPhase> {
        let mut rx = self.tx.subscribe();
        let reached = async move {
            let phase = rx
                .wait_for(|phase| phase.is_past_code())
                .await
                .map_err(|_| SessionError::GateFailed("authorization tracker dropped".to_string()))?;
            Ok::<AuthorizationPhase, SessionError>(*phase)
        };

        match timeout {
            Some(after) => tokio::time::timeout(after, reached)
                .await
                .map_err(|_| SessionError::Timeout {
                    operation: "authorization after code",
                    after,
                })?,
            None => reached.await,
        }
    }
}

impl Default for AuthTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_from_state() {
        assert_eq!(
            AuthorizationPhase::from_state(&AuthorizationState::WaitCode),
            Some(AuthorizationPhase::WaitPhoneOrCode)
        );
        assert_eq!(
            AuthorizationPhase::from_state(&AuthorizationState::WaitPassword {
                password_hint: String::new()
            }),
            Some(AuthorizationPhase::WaitPassword)
        );
        assert_eq!(
            AuthorizationPhase::from_state(&AuthorizationState::Ready),
            Some(AuthorizationPhase::Authenticated)
        );
        assert_eq!(
            AuthorizationPhase::from_state(&AuthorizationState::Other),
            Some(AuthorizationPhase::Unsupported)
        );
        assert_eq!(AuthorizationPhase::from_state(&AuthorizationState::Closed), None);
    }

    #[test]
    fn test_authenticated_is_terminal() {
        let tracker = AuthTracker::new();
        assert_eq!(tracker.phase(), AuthorizationPhase::Uninitialized);

        tracker.set(AuthorizationPhase::WaitPhoneOrCode);
        tracker.set(AuthorizationPhase::Authenticated);
        tracker.set(AuthorizationPhase::WaitParameters);
        assert_eq!(tracker.phase(), AuthorizationPhase::Authenticated);
    }

    #[tokio::test]
    async fn test_wait_past_code() {
        let tracker = AuthTracker::new();
        tracker.set(AuthorizationPhase::WaitPhoneOrCode);

        let writer = tracker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.set(AuthorizationPhase::WaitPassword);
        });

        let phase = tracker.wait_past_code(Some(Duration::from_secs(5))).await.unwrap();
        assert_eq!(phase, AuthorizationPhase::WaitPassword);
    }

    #[tokio::test]
    async fn test_unsupported_state_ends_wait_past_code() {
        let tracker = AuthTracker::new();
        tracker.set(AuthorizationPhase::WaitPhoneOrCode);
        tracker.set(AuthorizationPhase::Unsupported);

        let phase = tracker.wait_past_code(None).await.unwrap();
        assert_eq!(phase, AuthorizationPhase::Unsupported);
    }

    #[tokio::test]
    async fn test_wait_past_code_times_out() {
        let tracker = AuthTracker::new();
        tracker.set(AuthorizationPhase::WaitPhoneOrCode);

        let result = tracker.wait_past_code(Some(Duration::from_millis(20))).await;
        assert!(matches!(result, Err(SessionError::Timeout { .. })));
    }
}
