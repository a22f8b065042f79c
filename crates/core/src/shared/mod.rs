pub mod constants;
pub mod media_info;
