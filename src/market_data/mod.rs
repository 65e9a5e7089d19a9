pub mod bar;
pub mod feed;

// Re-export the bar types for convenient access (e.g. `use crate::market_data::Bar`).
pub use bar::{Bar, BarSeries, RawBar};
pub use feed::parse_bar_rows;
