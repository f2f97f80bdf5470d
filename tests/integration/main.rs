//! Host integration tests.
//!
//! `controller_tests` and `startup_tests` drive the service and the boot
//! sequence through the recording mocks in `mock_hw`; `hardware_tests`
//! runs the real adapters over simulated GPIO and a scratch directory.

mod hardware_tests;
mod mock_hw;
mod startup_tests;
