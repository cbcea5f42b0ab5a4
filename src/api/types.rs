use serde::Serialize;
use std::collections::BTreeMap;

use crate::entities::users::Role;
use crate::models::flight::{DataPage, DataPoint, Flight};
use crate::models::user::User;

// ============================================================================
// Generic responses
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub success: String,
    pub response_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_token: Option<String>,
}

impl CreatedResponse {
    pub fn new(message: impl Into<String>, id: i32) -> Self {
        Self {
            success: message.into(),
            response_id: id,
            jwt_token: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: String) -> Self {
        self.jwt_token = Some(token);
        self
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub created: String,
    pub modified: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            created: user.created,
            modified: user.modified,
        }
    }
}

/// Login payload: user fields with `date_*` timestamps plus the token.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub date_created: String,
    pub date_modified: String,
    pub jwt_token: String,
}

impl LoginResponse {
    #[must_use]
    pub fn new(user: User, jwt_token: String) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            date_created: user.created,
            date_modified: user.modified,
            jwt_token,
        }
    }
}

// ============================================================================
// Flights
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FlightDto {
    pub id: i32,
    pub created: String,
}

impl From<Flight> for FlightDto {
    fn from(flight: Flight) -> Self {
        Self {
            id: flight.id,
            created: flight.created,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DataPageDto {
    pub pages: u64,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    /// Keyed by data point id
    pub data: BTreeMap<i32, DataPoint>,
}

impl From<DataPage> for DataPageDto {
    fn from(page: DataPage) -> Self {
        Self {
            pages: page.pages,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            data: page.items.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

// ============================================================================
// Meta
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MetaKeysResponse {
    pub keys: Vec<String>,
}
