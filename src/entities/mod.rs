pub mod prelude;

pub mod api_users;
pub mod flights;
pub mod flights_data;
pub mod flights_meta;
pub mod users;
pub mod users_meta;
