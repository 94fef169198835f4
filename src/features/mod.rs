// Feature modules (event-driven behavior)
pub mod announcer;
pub mod auto_translate;
