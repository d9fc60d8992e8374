mod commands;
mod config;
mod entity;
mod error;
mod richtext;
mod session;
mod store;
mod transformers;
mod widths;

pub use crate::commands::*;
pub use crate::config::*;
pub use crate::entity::*;
pub use crate::error::*;
pub use crate::richtext::*;
pub use crate::session::*;
pub use crate::store::*;
pub use crate::transformers::*;
pub use crate::widths::*;
