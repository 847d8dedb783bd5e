use crate::utils::error::{Result, SessionError};

/// Символы форматирования, которые люди вставляют в номер
const PHONE_SEPARATORS: [char; 6] = [' ', '-', '(', ')', '.', '\t'];

/// Убрать форматирование из номера телефона.
///
/// Остальное (длина, код страны, допустимые символы) проверяет внешний клиент.
pub fn normalize_phone_number(phone: &str) -> Result<String> {
    let normalized: String = phone.chars().filter(|c| !PHONE_SEPARATORS.contains(c)).collect();

    if normalized.is_empty() || normalized == "+" {
        return Err(SessionError::InvalidInput(format!(
            "Phone number is empty: {:?}",
            phone
        )));
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers_unchanged() {
        assert_eq!(normalize_phone_number("+5511999990000").unwrap(), "+5511999990000");
        assert_eq!(normalize_phone_number("15551234567").unwrap(), "15551234567");
    }

    #[test]
    fn test_formatting_stripped() {
        assert_eq!(normalize_phone_number("+1 (555) 123-4567").unwrap(), "+15551234567");
        assert_eq!(normalize_phone_number("+55 11 99999-0000").unwrap(), "+5511999990000");
        assert_eq!(normalize_phone_number("555.123.4567").unwrap(), "5551234567");
    }

    #[test]
    fn test_empty_numbers_rejected() {
        assert!(normalize_phone_number("").is_err());
        assert!(normalize_phone_number("   ").is_err());
        assert!(normalize_phone_number("+").is_err());
        assert!(normalize_phone_number("( - )").is_err());
    }
}
