//! Control algorithms that run inside a controller state.

pub mod alert_audio;
