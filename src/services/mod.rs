pub mod auth;
pub use auth::AuthService;
pub mod convenio_service;
pub use convenio_service::ConvenioService;
pub mod mailer;
pub use mailer::Mailer;
pub mod storage;
pub use storage::AttachmentStorage;
pub mod user_service;
pub use user_service::UserService;
