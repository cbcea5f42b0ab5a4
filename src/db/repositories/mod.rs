pub mod api_user;
pub mod flight;
pub mod meta;
pub mod user;
