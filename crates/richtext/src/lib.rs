//! A document model with positions, transactions and an extension
//! system, plus the text extensions email blocks are edited with.

mod content;
mod core;
mod editor;
mod error;
mod events;
pub mod extensions;
pub mod helpers;
mod ops;
mod plugin;
pub mod rules;
mod schema;
mod serializer;
pub mod transforms;
mod traverse;

pub use crate::content::*;
pub use crate::core::*;
pub use crate::editor::*;
pub use crate::error::*;
pub use crate::events::*;
pub use crate::ops::*;
pub use crate::plugin::*;
pub use crate::schema::*;
pub use crate::serializer::*;
pub use crate::traverse::*;
