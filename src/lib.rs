// Time table layout engine
// Exports all modules for hosts, tests and benches

pub mod models;
pub mod services;
pub mod utils;
