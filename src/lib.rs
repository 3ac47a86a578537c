pub mod config;
pub mod error;
pub mod loader;
pub mod map_draw;
pub mod metric;
pub mod plot_values;
pub mod reconcile;
pub mod state;
pub mod ui;
