pub use super::api_users::Entity as ApiUsers;
pub use super::flights::Entity as Flights;
pub use super::flights_data::Entity as FlightsData;
pub use super::flights_meta::Entity as FlightsMeta;
pub use super::users::Entity as Users;
pub use super::users_meta::Entity as UsersMeta;
