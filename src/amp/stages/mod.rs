pub mod biquad;
pub mod common;
pub mod preamp;
pub mod smoother;
pub mod tonestack;
