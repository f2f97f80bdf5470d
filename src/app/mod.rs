//! Application core.
//!
//! The business rules of the alert controller: per-cycle orchestration
//! ([`service`]), startup sequencing and the loop ([`runtime`]), and the
//! events it reports.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod runtime;
pub mod service;
