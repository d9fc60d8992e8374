//! Structural edits shared by commands, keymaps and input rules.

pub mod blocks;
pub mod lists;
pub mod marks;
pub mod table_widths;
pub mod tables;
