pub mod debounce;
pub mod throttle;

pub use debounce::Debounced;
pub use throttle::Throttle;
