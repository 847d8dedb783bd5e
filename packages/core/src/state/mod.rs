// Разделяемое состояние сессии
// Пишет только диспетчер событий, читает только connect()/аутентификация

pub mod auth;
pub mod gate;

pub use auth::{AuthTracker, AuthorizationPhase};
pub use gate::{AuthRequirement, GateState, ReadinessGate};

/// Состояние одной попытки подключения. Новое на каждый connect()
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub gate: ReadinessGate,
    pub auth: AuthTracker,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}
