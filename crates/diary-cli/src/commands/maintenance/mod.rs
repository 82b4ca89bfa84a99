pub mod doctor;
pub mod volatile_daemon;

pub use doctor::handle_doctor;
pub use volatile_daemon::handle_internal_volatile_daemon;
