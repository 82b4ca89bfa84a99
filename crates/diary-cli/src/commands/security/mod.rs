pub mod biometric;
pub mod lock;
pub mod mode;
pub mod password;
pub mod status;
pub mod unlock;

pub use biometric::{handle_biometric_disable, handle_biometric_enable, handle_biometric_status};
pub use lock::handle_lock;
pub use mode::handle_mode;
pub use password::{handle_password_change, handle_password_set};
pub use status::handle_status;
pub use unlock::handle_unlock;
