mod command;
mod events;
mod service;
mod types;

pub use crate::command::*;
pub use crate::events::*;
pub use crate::service::*;
pub use crate::types::*;
