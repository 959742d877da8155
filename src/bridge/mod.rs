//! Adapters between the declarative shell and imperative, externally owned
//! pieces: the menu bar widget and the legacy host's global slots.

pub mod document;
pub mod menu;
pub mod shell;
pub mod widget;
pub mod window;
