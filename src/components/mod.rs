pub mod error_notice;
pub mod result_card;
pub mod sidebar;
pub mod status_badge;
pub mod upload_zone;
