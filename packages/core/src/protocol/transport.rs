// Транспорт JSON-интерфейса
// Абстракция над td_json_client: отправка строки и блокирующее получение с таймаутом

use crate::utils::error::Result;
use std::time::Duration;

/// Транспорт, через который `JsonClient` общается с внешним клиентом.
///
/// `send` может вызываться из любого потока; `receive` вызывается только
/// из потока приёма одного клиента.
pub trait JsonTransport: Send + Sync + 'static {
    /// Отправить JSON-запрос
    fn send(&self, request: &str) -> Result<()>;

    /// Дождаться следующего объекта не дольше `timeout`.
    /// `Ok(None)` означает, что за это время ничего не пришло.
    fn receive(&self, timeout: Duration) -> Result<Option<String>>;
}

#[cfg(feature = "tdjson")]
pub use tdjson::TdJsonTransport;

/// Транспорт поверх нативной libtdjson
#[cfg(feature = "tdjson")]
mod tdjson {
    use super::JsonTransport;
    use crate::utils::error::{Result, SessionError};
    use std::ffi::{c_char, c_double, c_void, CStr, CString};
    use std::ptr::NonNull;
    use std::time::Duration;

    #[link(name = "tdjson")]
    extern "C" {
        fn td_json_client_create() -> *mut c_void;
        fn td_json_client_send(client: *mut c_void, request: *const c_char);
        fn td_json_client_receive(client: *mut c_void, timeout: c_double) -> *const c_char;
        fn td_json_client_destroy(client: *mut c_void);
    }

    /// Владеет одним экземпляром td_json_client
    pub struct TdJsonTransport {
        handle: NonNull<c_void>,
    }

    // td_json_client_send потокобезопасен; receive вызывается только из потока приёма
    unsafe impl Send for TdJsonTransport {}
    unsafe impl Sync for TdJsonTransport {}

    impl TdJsonTransport {
        pub fn new() -> Result<Self> {
            let raw = unsafe { td_json_client_create() };
            let handle = NonNull::new(raw)
                .ok_or_else(|| SessionError::Transport("td_json_client_create returned null".to_string()))?;
            Ok(Self { handle })
        }
    }

    impl JsonTransport for TdJsonTransport {
        fn send(&self, request: &str) -> Result<()> {
            let request = CString::new(request)
                .map_err(|e| SessionError::SerializationError(format!("Request contains NUL: {}", e)))?;
            unsafe { td_json_client_send(self.handle.as_ptr(), request.as_ptr()) };
            Ok(())
        }

        fn receive(&self, timeout: Duration) -> Result<Option<String>> {
            let raw = unsafe { td_json_client_receive(self.handle.as_ptr(), timeout.as_secs_f64()) };
            if raw.is_null() {
                return Ok(None);
            }

            // Буфер принадлежит libtdjson и живёт до следующего receive
            let data = unsafe { CStr::from_ptr(raw) }
                .to_str()
                .map_err(|e| SessionError::SerializationError(format!("Invalid UTF-8 from tdjson: {}", e)))?
                .to_owned();
            Ok(Some(data))
        }
    }

    impl Drop for TdJsonTransport {
        fn drop(&mut self) {
            unsafe { td_json_client_destroy(self.handle.as_ptr()) };
        }
    }
}
