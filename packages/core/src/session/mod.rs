//! Session - координатор между внешним клиентом и последовательным кодом
//!
//! Владеет одним экземпляром внешнего клиента, диспетчером событий и
//! состоянием попытки подключения.
//!
//! ## Архитектура
//!
//! ```text
//! Session
//!   ├── Connector         - создаёт клиента и поток событий
//!   ├── Dispatcher (task) - событие → действие, открывает ReadinessGate
//!   ├── SessionState      - ReadinessGate + AuthTracker
//!   └── AuthPrompt        - код и пароль
//! ```
//!
//! ## Типичный сценарий использования
//!
//! ```text
//! 1. session = Session::new(config, connector)
//! 2. session.connect()              - ждёт gate, при необходимости входит
//! 3. session.create_contact("+55…")
//! 4. session.send_message(chat_id, "Hello World!")
//! 5. session.get_channels(5)        - ленивый поток чатов
//! ```
//!
//! ## Не отвечает за
//!
//! - Протокол, шифрование, базу (это делает внешний клиент)
//! - Повторы и backoff: ошибки отдаются вызывающему как есть

pub mod dispatch;
pub mod listener;

use crate::api::chats::{self, ChannelErrorPolicy};
use crate::api::{contacts, messaging, with_timeout, Connector, TdClient};
use crate::config::Config;
use crate::prompt::{AuthPrompt, StdinPrompt};
use crate::protocol::messages::{Chat, Message, User};
use crate::state::{AuthRequirement, AuthorizationPhase, SessionState};
use crate::utils::error::{Result, SessionError};
use dispatch::Dispatcher;
use futures::stream::{self, BoxStream, StreamExt};
use listener::{MessageListener, NoopListener};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Одно подключение: клиент, его диспетчер и состояние
struct Connection<C> {
    client: Arc<C>,
    state: SessionState,
    dispatcher: JoinHandle<()>,
}

impl<C> Drop for Connection<C> {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

/// Координатор сессии
pub struct Session<K: Connector> {
    config: Arc<Config>,
    connector: K,
    prompt: Arc<dyn AuthPrompt>,
    listener: Arc<dyn MessageListener>,
    connection: Option<Connection<K::Client>>,
}

impl<K: Connector> Session<K> {
    /// Создать сессию. Подключение не выполняется до `connect()`
    pub fn new(config: Config, connector: K) -> Self {
        Self {
            config: Arc::new(config),
            connector,
            prompt: Arc::new(StdinPrompt),
            listener: Arc::new(NoopListener),
            connection: None,
        }
    }

    /// Источник кода и пароля (по умолчанию stdin)
    pub fn with_prompt(mut self, prompt: impl AuthPrompt + 'static) -> Self {
        self.prompt = Arc::new(prompt);
        self
    }

    /// Обработчик новых сообщений (по умолчанию ничего не делает)
    pub fn with_message_listener(mut self, listener: impl MessageListener + 'static) -> Self {
        self.listener = Arc::new(listener);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Последняя фаза авторизации, которую прислал клиент
    pub fn authorization_phase(&self) -> Option<AuthorizationPhase> {
        self.connection.as_ref().map(|c| c.state.auth.phase())
    }

    /// Создать клиента, дождаться его состояния авторизации и при необходимости войти.
    ///
    /// Возвращается, когда вход не нужен или завершён.
    ///
    /// # Ошибки
    ///
    /// - `Timeout` - клиент не сообщил состояние за `config.auth_timeout`
    /// - `GateFailed` - клиент отверг параметры или ключ базы
    /// - `AuthenticationRejected` - неверный телефон, код или пароль
    ///
    /// При ошибке подключение сбрасывается.
    pub async fn connect(&mut self) -> Result<()> {
        self.connection = None;

        let (client, updates) = self.connector.connect()?;
        let client = Arc::new(client);
        let state = SessionState::new();

        let dispatcher = Dispatcher {
            client: Arc::clone(&client),
            config: Arc::clone(&self.config),
            state: state.clone(),
            listener: Arc::clone(&self.listener),
        }
        .spawn(updates);

        self.connection = Some(Connection {
            client: Arc::clone(&client),
            state: state.clone(),
            dispatcher,
        });

        info!(target: "session", api_id = self.config.api_id, "Connecting");

        if let Err(e) = self.establish(client.as_ref(), &state).await {
            warn!(target: "session", error = %e, "Connect failed");
            self.connection = None;
            return Err(e);
        }

        info!(target: "session", "Connected");
        Ok(())
    }

    async fn establish(&self, client: &K::Client, state: &SessionState) -> Result<()> {
        if let Err(e) = self
            .request("setLogVerbosityLevel", client.set_log_verbosity_level(self.config.log_verbosity))
            .await
        {
            // Не критично: клиент просто будет шумнее
            warn!(target: "session", error = %e, "Failed to set client log verbosity");
        }

        let requirement = state.gate.wait(self.config.auth_timeout).await?;
        debug!(target: "session", ?requirement, "Readiness gate opened");

        if requirement.needs_authentication() {
            self.authenticate(client, state, requirement).await?;
        }

        Ok(())
    }

    /// Телефон → код → (пароль). Каждая отправка - один запрос без повторов
    async fn authenticate(
        &self,
        client: &K::Client,
        state: &SessionState,
        requirement: AuthRequirement,
    ) -> Result<()> {
        info!(target: "session::auth", ?requirement, "Authentication required");

        self.request(
            "setAuthenticationPhoneNumber",
            client.set_authentication_phone_number(self.config.phone_number.clone()),
        )
        .await
        .map_err(SessionError::into_auth_rejection)?;

        let code = self.prompt.code().await?;
        self.request("checkAuthenticationCode", client.check_authentication_code(code))
            .await
            .map_err(SessionError::into_auth_rejection)?;

        let password_needed = match requirement {
            AuthRequirement::PasswordRequired => true,
            // Клиент сообщит о втором факторе только после проверки кода
            _ => match state.auth.wait_past_code(self.config.auth_timeout).await? {
                AuthorizationPhase::WaitPassword => true,
                AuthorizationPhase::Unsupported => {
                    return Err(SessionError::UnsupportedAuthorizationState("checkAuthenticationCode"));
                }
                _ => false,
            },
        };

        if !password_needed {
            info!(target: "session::auth", "Authenticated with code");
            return Ok(());
        }

        let password = self.prompt.password().await?;
        self.request("checkAuthenticationPassword", client.check_authentication_password(password))
            .await
            .map_err(SessionError::into_auth_rejection)?;

        info!(target: "session::auth", "Authenticated with password");
        Ok(())
    }

    fn client(&self) -> Result<&Arc<K::Client>> {
        self.connection
            .as_ref()
            .map(|c| &c.client)
            .ok_or(SessionError::NotConnected)
    }

    async fn request<T>(
        &self,
        operation: &'static str,
        request: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        with_timeout(operation, self.config.request_timeout, request).await
    }

    /// Отправить текст в чат без изменений
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message> {
        let client = self.client()?;
        messaging::send_text(client.as_ref(), chat_id, text, self.config.request_timeout).await
    }

    /// Импортировать контакт и вернуть приватный чат с ним
    pub async fn create_contact(&self, phone_number: &str) -> Result<Chat> {
        let client = self.client()?;
        contacts::create_contact(client.as_ref(), phone_number, self.config.request_timeout).await
    }

    /// Текущий пользователь
    pub async fn get_current_user(&self) -> Result<User> {
        let client = self.client()?;
        self.request("getMe", client.get_me()).await
    }

    /// Ленивый поток из не более чем `limit` приватных чатов, групп и супергрупп.
    /// Первая ошибка заканчивает поток
    pub fn get_channels(&self, limit: usize) -> BoxStream<'static, Result<Chat>> {
        self.get_channels_with(limit, ChannelErrorPolicy::Abort)
    }

    pub fn get_channels_with(&self, limit: usize, policy: ChannelErrorPolicy) -> BoxStream<'static, Result<Chat>> {
        match self.client() {
            Ok(client) => chats::channels(Arc::clone(client), limit, policy, self.config.request_timeout),
            Err(e) => stream::once(async move { Err::<Chat, SessionError>(e) }).boxed(),
        }
    }

    /// Остановить диспетчер и закрыть внешний клиент
    pub async fn close(&mut self) -> Result<()> {
        let connection = self.connection.take().ok_or(SessionError::NotConnected)?;
        connection.dispatcher.abort();

        info!(target: "session", "Closing");
        self.request("close", connection.client.close()).await
    }
}
