pub mod device_auth;
pub mod logging;

pub use device_auth::DeviceAuth;
pub use logging::RequestLog;
