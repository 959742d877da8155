pub mod colors;
pub mod fonts;
pub mod frame;
pub mod selection;
pub mod status;
pub mod tool_options;
pub mod tool_settings;
pub mod tools;
