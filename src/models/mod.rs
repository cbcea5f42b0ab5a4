pub mod flight;
pub mod meta;
pub mod user;
