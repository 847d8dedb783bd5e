// Readiness gate
// Одноразовый сигнал между потоком событий внешнего клиента и последовательным кодом connect()

use crate::utils::error::{Result, SessionError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Что нужно сделать для входа. Заменяет пару флагов "auth needed" / "password needed"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequirement {
    /// Клиент уже авторизован
    NoAuthNeeded,
    /// Нужен телефон и одноразовый код
    CodeOnlyRequired,
    /// Нужен телефон, код и пароль второго фактора
    PasswordRequired,
}

impl AuthRequirement {
    pub fn needs_authentication(self) -> bool {
        !matches!(self, AuthRequirement::NoAuthNeeded)
    }
}

/// Состояние gate. Из `Unset` выходит ровно один раз
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Unset,
    Open(AuthRequirement),
    Failed(String),
}

/// Одноразовый потокобезопасный сигнал готовности.
///
/// Первый `open`/`fail` фиксирует значение, все последующие вызовы ничего не меняют
/// и возвращают `false`. `wait` после открытия возвращается сразу, сколько бы раз
/// его ни вызывали. Запись через `watch` видна ожидающему без дополнительных блокировок.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    tx: Arc<watch::Sender<GateState>>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(GateState::Unset);
        Self { tx: Arc::new(tx) }
    }

    /// Открыть gate. `true`, если именно этот вызов его открыл
    pub fn open(&self, requirement: AuthRequirement) -> bool {
        self.settle(GateState::Open(requirement))
    }

    /// Закрыть gate с ошибкой, чтобы ожидающий не висел до таймаута
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.settle(GateState::Failed(reason.into()))
    }

    fn settle(&self, next: GateState) -> bool {
        self.tx.send_if_modified(|state| {
            if *state != GateState::Unset {
                return false;
            }
            *state = next;
            true
        })
    }

    pub fn state(&self) -> GateState {
        self.tx.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        matches!(*self.tx.borrow(), GateState::Open(_))
    }

    /// Дождаться открытия gate.
    ///
    /// # Errors
    ///
    /// - `Timeout`, если gate не открылся за `timeout`
    /// - `GateFailed`, если диспетчер закрыл его с ошибкой
    pub async fn wait(&self, timeout: Option<Duration>) -> Result<AuthRequirement> {
        let mut rx = self.tx.subscribe();
        let settled = async move {
            let state = rx
                .wait_for(|state| *state != GateState::Unset)
                .await
                .map_err(|_| SessionError::GateFailed("gate dropped".to_string()))?;
            Ok::<GateState, SessionError>(state.clone())
        };

        let state = match timeout {
            Some(after) => tokio::time::timeout(after, settled)
                .await
                .map_err(|_| SessionError::Timeout {
                    operation: "authorization state",
                    after,
                })??,
            None => settled.await?,
        };

        match state {
            GateState::Open(requirement) => Ok(requirement),
            GateState::Failed(reason) => Err(SessionError::GateFailed(reason)),
            GateState::Unset => Err(SessionError::GateFailed("gate is unset".to_string())),
        }
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
