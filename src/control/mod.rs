//! Control-side decision logic: when the sensor looks condensed, and
//! whether another heater pulse is allowed.

pub mod rate_limit;
pub mod wet_stuck;

pub use rate_limit::PulseLimiter;
pub use wet_stuck::WetStuckDetector;
