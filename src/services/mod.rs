// Service module exports
// Layout engine, interaction state and render scheduling

pub mod geometry;
pub mod placement;
pub mod render_scheduler;
pub mod selection;
pub mod time_slots;
pub mod time_table;
