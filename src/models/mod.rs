// Module exports for models
// Plain data the layout engine consumes and emits

pub mod group;
pub mod item;
pub mod message;
pub mod settings;
pub mod time_frame;
pub mod ui;
