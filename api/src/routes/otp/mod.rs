pub mod send;
pub mod verify;

pub use send::send_otp;
pub use verify::verify_otp;
