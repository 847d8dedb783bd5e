// Источник одноразового кода и пароля при входе
// Консоль по умолчанию; можно подменить на диалог UI или pipe

use crate::utils::error::{Result, SessionError};
use async_trait::async_trait;
use std::io::{BufRead, Write};

#[async_trait]
pub trait AuthPrompt: Send + Sync {
    /// Код, который сервер прислал на телефон
    async fn code(&self) -> Result<String>;

    /// Облачный пароль (второй фактор)
    async fn password(&self) -> Result<String>;
}

/// Чтение из stdin с приглашением в stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

impl StdinPrompt {
    async fn read_line(label: &'static str) -> Result<String> {
        tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout();
            write!(stdout, "{}", label).and_then(|_| stdout.flush())?;

            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            Ok::<String, std::io::Error>(line)
        })
        .await
        .map_err(|e| SessionError::PromptError(e.to_string()))?
        .map_err(|e| SessionError::PromptError(e.to_string()))
    }
}

#[async_trait]
impl AuthPrompt for StdinPrompt {
    async fn code(&self) -> Result<String> {
        let line = Self::read_line("Insert the login code: ").await?;
        Ok(line.trim().to_string())
    }

    async fn password(&self) -> Result<String> {
        let line = Self::read_line("Insert the password: ").await?;
        Ok(strip_line_ending(&line).to_string())
    }
}

/// Убрать только перевод строки: пробелы по краям могут быть частью пароля
fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_ending_keeps_spaces() {
        assert_eq!(strip_line_ending(" secret \n"), " secret ");
        assert_eq!(strip_line_ending(" secret \r\n"), " secret ");
        assert_eq!(strip_line_ending("secret"), "secret");
        assert_eq!(strip_line_ending("\n"), "");
    }
}
