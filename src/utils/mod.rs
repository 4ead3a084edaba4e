//! Helper utilities, functions, and macros.

#[macro_use]
mod print;

#[macro_use]
mod config;

mod error;
mod safetcp;

pub use error::ReplikvError;
pub use print::logger_init;
pub(crate) use safetcp::{recv_msg, send_msg, tcp_bind_with_retry};
