pub mod cache;
pub mod chart;
pub mod period;
pub mod record;
pub mod series;
pub mod settings;
pub mod sync;
pub mod window;
