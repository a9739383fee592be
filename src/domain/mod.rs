pub mod drag_drop;
pub mod models;
pub mod placement;
pub mod resolver;
pub mod schedule;
pub mod slot_grid;
