// Логирование

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Установить глобальный fmt-подписчик.
///
/// Фильтр читается из `RUST_LOG`; если переменная не задана, используется `default_level`.
/// Повторный вызов ничего не делает.
pub fn init_logging(default_level: Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
