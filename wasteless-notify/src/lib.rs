pub mod email;
pub mod service;

pub use email::EmailDelivery;
pub use service::NotificationService;
