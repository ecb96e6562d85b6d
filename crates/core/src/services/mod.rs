pub mod aggregation_service;
pub mod gesture_service;
pub mod record_service;
pub mod sync_service;
pub mod title_service;
pub mod window_service;
