pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{ApiPrincipal, AuthError, AuthService, LoginResult, Principal};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod flight_service;
pub mod flight_service_impl;
pub use flight_service::{FlightError, FlightService};
pub use flight_service_impl::SeaOrmFlightService;
