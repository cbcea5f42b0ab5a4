mod api_user;
mod init;
mod user;

pub use api_user::{cmd_api_user_add, cmd_api_user_remove};
pub use init::cmd_init;
pub use user::cmd_set_role;
