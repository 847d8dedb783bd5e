// Диспетчер событий внешнего клиента
// Чистое отображение тега события в действие; незнакомые события игнорируются

use crate::api::{with_timeout, TdClient, UpdateReceiver};
use crate::config::Config;
use crate::protocol::messages::{AuthorizationState, ConnectionState, Update};
use crate::session::listener::MessageListener;
use crate::state::{AuthRequirement, AuthorizationPhase, SessionState};
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

pub(crate) struct Dispatcher<C: TdClient> {
    pub(crate) client: Arc<C>,
    pub(crate) config: Arc<Config>,
    pub(crate) state: SessionState,
    pub(crate) listener: Arc<dyn MessageListener>,
}

impl<C: TdClient> Dispatcher<C> {
    /// Обрабатывать события в отдельной задаче, пока клиент не закроет поток
    pub(crate) fn spawn(self, mut updates: UpdateReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                self.dispatch(update).await;
            }
            debug!(target: "session::dispatch", "Update stream ended");
        })
    }

    pub(crate) async fn dispatch(&self, update: Update) {
        match update {
            Update::AuthorizationState { authorization_state } => {
                self.on_authorization_state(authorization_state).await;
            }
            Update::User { user } => {
                // Пользователь пришёл - входить не нужно
                debug!(target: "session::dispatch", user_id = user.id, "User info received");
                self.state.auth.set(AuthorizationPhase::Authenticated);
                self.state.gate.open(AuthRequirement::NoAuthNeeded);
            }
            Update::ConnectionState { state } => {
                if state == ConnectionState::Ready {
                    debug!(target: "session::dispatch", "Connection ready");
                } else {
                    trace!(target: "session::dispatch", ?state, "Connection state changed");
                }
            }
            Update::NewMessage { message } => {
                trace!(target: "session::dispatch", chat_id = message.chat_id, message_id = message.id, "New message");
                self.listener.on_new_message(&message);
            }
            Update::Other => {}
        }
    }

    async fn on_authorization_state(&self, state: AuthorizationState) {
        if let Some(phase) = AuthorizationPhase::from_state(&state) {
            self.state.auth.set(phase);
        }

        match state {
            AuthorizationState::WaitTdlibParameters => {
                let result = self.submit_parameters().await;
                self.fail_gate_on_error("setTdlibParameters", result);
            }
            AuthorizationState::WaitEncryptionKey { .. } => {
                let result = with_timeout(
                    "checkDatabaseEncryptionKey",
                    self.config.request_timeout,
                    self.client.check_database_encryption_key(String::new()),
                )
                .await;
                self.fail_gate_on_error("checkDatabaseEncryptionKey", result);
            }
            AuthorizationState::WaitPhoneNumber | AuthorizationState::WaitCode => {
                self.state.gate.open(AuthRequirement::CodeOnlyRequired);
            }
            AuthorizationState::WaitPassword { .. } => {
                self.state.gate.open(AuthRequirement::PasswordRequired);
            }
            AuthorizationState::Ready => {
                info!(target: "session::dispatch", "Authorization complete");
                self.state.gate.open(AuthRequirement::NoAuthNeeded);
            }
            AuthorizationState::Other => {
                warn!(target: "session::dispatch", "Unsupported authorization state");
                self.state.gate.fail("unsupported authorization state");
            }
            other => {
                debug!(target: "session::dispatch", state = ?other, "Ignoring authorization state");
            }
        }
    }

    async fn submit_parameters(&self) -> Result<()> {
        with_timeout(
            "setTdlibParameters",
            self.config.request_timeout,
            self.client.set_tdlib_parameters(self.config.tdlib_parameters()),
        )
        .await
    }

    fn fail_gate_on_error(&self, method: &'static str, result: Result<()>) {
        if let Err(e) = result {
            error!(target: "session::dispatch", method, error = %e, "Failed to answer authorization state");
            self.state.gate.fail(format!("{}: {}", method, e));
        }
    }
}
