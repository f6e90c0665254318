//! Terralid heater controller library.
//!
//! Keeps an SHT3x humidity sensor trustworthy inside a condensing
//! enclosure: detects a wet, stuck sensing element, fires short on-chip
//! heater pulses under a rate limit, logs each pulse's effect, and
//! latches a fault when pulsing stops helping.  Pure logic behind port
//! traits; the host supplies time, the bus, and a logger.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod fsm;
pub mod safety;
pub mod sensors;
pub mod time;

pub use app::service::HeaterController;
pub use config::HeaterConfig;
