// Протокол внешнего клиента: типы, JSON wire format и транспорт

pub mod messages;
pub mod transport;
pub mod wire;
