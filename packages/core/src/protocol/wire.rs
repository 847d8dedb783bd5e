// Wire format (JSON-интерфейс TDLib)
// Каждый запрос несёт числовой "@extra"; ответ приходит с тем же "@extra",
// события ("update*") приходят без него

use crate::protocol::messages::{Function, TdError, Update};
use crate::utils::error::{Result, SessionError};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const TYPE_FIELD: &str = "@type";
pub const EXTRA_FIELD: &str = "@extra";

/// Входящий объект от внешнего клиента
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// Ответ на запрос с данным "@extra"
    Response { extra: u64, body: Value },
    /// Событие, которое клиент прислал сам
    Update(Update),
}

/// Упаковать запрос в JSON с идентификатором для корреляции ответа
pub fn pack_request(function: &Function, extra: u64) -> Result<String> {
    let mut value = serde_json::to_value(function)?;
    let object = value.as_object_mut().ok_or_else(|| {
        SessionError::SerializationError(format!(
            "{} did not serialize to a JSON object",
            function.method_name()
        ))
    })?;
    object.insert(EXTRA_FIELD.to_string(), Value::from(extra));

    Ok(value.to_string())
}

/// Распаковать строку, полученную от внешнего клиента
pub fn unpack_incoming(data: &str) -> Result<Incoming> {
    let mut value: Value = serde_json::from_str(data)?;

    let extra = value
        .as_object_mut()
        .ok_or_else(|| SessionError::SerializationError("Incoming data is not a JSON object".to_string()))?
        .remove(EXTRA_FIELD);

    match extra {
        Some(extra) => {
            let extra = extra.as_u64().ok_or_else(|| {
                SessionError::SerializationError(format!("Unexpected {} value: {}", EXTRA_FIELD, extra))
            })?;
            Ok(Incoming::Response { extra, body: value })
        }
        None => Ok(Incoming::Update(serde_json::from_value(value)?)),
    }
}

/// Превратить объект "error" в `SessionError::Request`
pub fn check_error(method: &'static str, body: &Value) -> Result<()> {
    if body.get(TYPE_FIELD).and_then(Value::as_str) != Some("error") {
        return Ok(());
    }

    let error: TdError = serde_json::from_value(body.clone())?;
    Err(SessionError::Request {
        method,
        code: error.code,
        message: error.message,
    })
}

/// Декодировать ответ в ожидаемый тип
pub fn decode_response<T: DeserializeOwned>(method: &'static str, body: Value) -> Result<T> {
    check_error(method, &body)?;
    serde_json::from_value(body).map_err(|e| {
        SessionError::SerializationError(format!("Unexpected response to {}: {}", method, e))
    })
}

/// Ответ, в котором нас интересует только отсутствие ошибки ("ok")
pub fn decode_ok(method: &'static str, body: Value) -> Result<()> {
    check_error(method, &body)
}
