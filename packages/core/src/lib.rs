// Connect Core
// Координатор сессии Telegram поверх внешнего клиента (TDLib)

#![warn(clippy::all)]

// Модули
pub mod api;
pub mod config;
pub mod prompt;
pub mod protocol;
pub mod session;
pub mod state;
pub mod utils;

// Re-exports для удобства
pub use api::chats::ChannelErrorPolicy;
pub use api::{Connector, JsonClient, JsonConnector, TdClient, UpdateReceiver};
pub use config::Config;
pub use prompt::{AuthPrompt, StdinPrompt};
pub use session::listener::{MessageListener, NoopListener};
pub use session::Session;
pub use state::{AuthRequirement, AuthorizationPhase, ReadinessGate};
pub use utils::error::{Result, SessionError};
