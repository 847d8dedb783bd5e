//! Конфигурация сессии
//!
//! Задаётся один раз при создании `Session` и дальше не меняется.
//! Всё, что уходит во внешний клиент (`TdlibParameters`), собирается здесь,
//! чтобы не хардкодить значения по проекту.

use crate::protocol::messages::TdlibParameters;
use crate::utils::error::{Result, SessionError};
use crate::utils::validation::normalize_phone_number;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APPLICATION_VERSION: &str = "1.0.0";
pub const DEVICE_MODEL: &str = "PC";
pub const SYSTEM_LANGUAGE_CODE: &str = "en";

/// Подкаталог, в котором внешний клиент держит базу и файлы
const DATA_SUBDIR: &str = "db";

const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 60;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Основная структура конфигурации
#[derive(Debug, Clone)]
pub struct Config {
    // ============================================
    // УЧЁТНЫЕ ДАННЫЕ
    // ============================================

    /// Идентификатор приложения (api_id)
    pub api_id: i32,

    /// Секрет приложения (api_hash)
    pub api_hash: String,

    /// Телефон, под которым выполняется вход
    pub phone_number: String,

    // ============================================
    // ПАРАМЕТРЫ ВНЕШНЕГО КЛИЕНТА
    // ============================================

    pub application_version: String,
    pub device_model: String,
    pub system_language_code: String,

    /// Каталог базы данных внешнего клиента (содержимое не интерпретируем)
    pub database_directory: PathBuf,

    /// Каталог файлов внешнего клиента
    pub files_directory: PathBuf,

    /// Использовать тестовые дата-центры
    pub use_test_dc: bool,

    /// Уровень логов самого внешнего клиента (0 = только fatal)
    pub log_verbosity: i32,

    // ============================================
    // ТАЙМАУТЫ
    // ============================================

    /// Сколько ждать открытия readiness gate (None = бесконечно)
    pub auth_timeout: Option<Duration>,

    /// Таймаут одного запроса к внешнему клиенту (None = бесконечно)
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Создать конфигурацию с дефолтными значениями
    pub fn new(api_id: i32, api_hash: impl Into<String>, phone_number: impl Into<String>) -> Self {
        let data_dir = default_base_dir().join(DATA_SUBDIR);

        Self {
            api_id,
            api_hash: api_hash.into(),
            phone_number: phone_number.into(),

            application_version: APPLICATION_VERSION.to_string(),
            device_model: DEVICE_MODEL.to_string(),
            system_language_code: SYSTEM_LANGUAGE_CODE.to_string(),
            database_directory: data_dir.clone(),
            files_directory: data_dir,
            use_test_dc: false,
            log_verbosity: 0,

            auth_timeout: Some(Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECS)),
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        }
    }

    /// Создать конфигурацию из переменных окружения
    ///
    /// # Errors
    ///
    /// `ConfigError`, если не заданы `TG_API_ID`, `TG_API_HASH`, `TG_PHONE_NUMBER`
    /// или они не проходят валидацию. Необязательные значения, которые не парсятся,
    /// молча игнорируются.
    pub fn from_env() -> Result<Self> {
        let api_id = required_env("TG_API_ID")?
            .parse::<i32>()
            .map_err(|e| SessionError::ConfigError(format!("TG_API_ID: {}", e)))?;
        let api_hash = required_env("TG_API_HASH")?;
        let phone_number = required_env("TG_PHONE_NUMBER")?;

        let mut config = Self::new(api_id, api_hash, phone_number);

        // Переопределяем значения из env, если они заданы
        if let Ok(val) = std::env::var("TG_DATA_DIR") {
            config = config.with_data_dir(val);
        }

        if let Ok(val) = std::env::var("TG_AUTH_TIMEOUT_SECS") {
            if let Ok(parsed) = val.parse() {
                config.auth_timeout = timeout_from_secs(parsed);
            }
        }

        if let Ok(val) = std::env::var("TG_REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = val.parse() {
                config.request_timeout = timeout_from_secs(parsed);
            }
        }

        if let Ok(val) = std::env::var("TG_USE_TEST_DC") {
            if let Ok(parsed) = val.parse() {
                config = config.with_test_dc(parsed);
            }
        }

        if let Ok(val) = std::env::var("TG_LOG_VERBOSITY") {
            if let Ok(parsed) = val.parse() {
                config.log_verbosity = parsed;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Положить базу и файлы в `<dir>/db`
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let data_dir = dir.as_ref().join(DATA_SUBDIR);
        self.database_directory = data_dir.clone();
        self.files_directory = data_dir;
        self
    }

    pub fn with_auth_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.auth_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_test_dc(mut self, use_test_dc: bool) -> Self {
        self.use_test_dc = use_test_dc;
        self
    }

    /// Проверить учётные данные
    pub fn validate(&self) -> Result<()> {
        if self.api_id <= 0 {
            return Err(SessionError::ConfigError("api_id must be positive".to_string()));
        }

        if self.api_hash.trim().is_empty() {
            return Err(SessionError::ConfigError("api_hash must not be empty".to_string()));
        }

        normalize_phone_number(&self.phone_number)
            .map(|_| ())
            .map_err(|e| SessionError::ConfigError(e.to_string()))
    }

    /// Параметры, которые отправляются в ответ на authorizationStateWaitTdlibParameters
    pub fn tdlib_parameters(&self) -> TdlibParameters {
        TdlibParameters {
            use_test_dc: self.use_test_dc,
            database_directory: self.database_directory.to_string_lossy().into_owned(),
            files_directory: self.files_directory.to_string_lossy().into_owned(),
            use_file_database: true,
            use_chat_info_database: true,
            use_message_database: true,
            use_secret_chats: false,
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            system_language_code: self.system_language_code.clone(),
            device_model: self.device_model.clone(),
            system_version: String::new(),
            application_version: self.application_version.clone(),
            enable_storage_optimizer: true,
            ignore_file_names: false,
        }
    }
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| SessionError::ConfigError(format!("{} is not set", name)))
}

/// 0 секунд = таймаут отключён
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Каталог рядом с исполняемым файлом, как у исходной программы
fn default_base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
