#![doc = "The `taskguard` library crate."]
#![doc = ""]
#![doc = "A multi-user task API: accounts with bcrypt-hashed passwords, JWT bearer"]
#![doc = "tokens tied to server-side issuance records, and tasks that are only ever"]
#![doc = "visible to the account that created them. The binary (`main.rs`) wires"]
#![doc = "configuration, storage and the HTTP server around this library."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod tasks;
pub mod validation;

pub use crate::error::AppError;
pub use crate::state::AppState;
