//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements          | Connects to          |
//! |-----------------|---------------------|----------------------|
//! | `log_sink`      | EventSink           | `log` facade         |
//! | `sensors::sht3x`| HumiditySensorPort  | `embedded-hal` I2C   |
//!
//! The SHT3x driver lives under [`crate::sensors`] next to the reading
//! types it produces.

pub mod log_sink;
