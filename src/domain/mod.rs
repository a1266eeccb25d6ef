pub mod encoding;
pub mod models;
pub mod motor;
pub mod notify;
pub mod protocol;
pub mod settings;
