pub mod auth_service;
pub mod config_service;
pub mod resource_service;
pub mod traits;
pub mod types;

pub use auth_service::{AuthService, LoginInput};
pub use config_service::ConfigService;
pub use resource_service::{FileAttachment, Payload, ResourceService, ResourceTable};
pub use types::AuthStatus;
