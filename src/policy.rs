//! Role-based authorization decisions.

use thiserror::Error;

use crate::services::auth_service::Principal;

/// Something a principal wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadUser,
    /// Update, delete or write meta of the user with this id.
    ModifyUser(i32),
    ReadFlight,
    /// Create or delete flights.
    ManageFlights,
    RecordFlightData,
    ModifyFlightMeta,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Not authorized.")]
pub struct Denied;

/// Decide whether `principal` may perform `action`.
pub fn authorize(principal: &Principal, action: Action) -> Result<(), Denied> {
    let allowed = match (principal, action) {
        (Principal::User(_), Action::ReadUser | Action::ReadFlight) => true,
        (Principal::User(user), Action::ModifyUser(id)) => user.id == id || user.is_admin(),
        (
            Principal::User(user),
            Action::ManageFlights | Action::RecordFlightData | Action::ModifyFlightMeta,
        ) => user.is_admin(),
        (Principal::Service(_), Action::RecordFlightData) => true,
        (Principal::Service(_), _) => false,
    };

    if allowed { Ok(()) } else { Err(Denied) }
}
