//! External delivery channels for compliance notifications.

pub mod email;
