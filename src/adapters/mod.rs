//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements            | Connects to                  |
//! |------------|-----------------------|------------------------------|
//! | `audio`    | AudioPort             | I2S amplifier / null sink    |
//! | `delay`    | DelayNs               | FreeRTOS / host sleep        |
//! | `hardware` | InputPort, RelayPort  | ESP32 GPIO                   |
//! | `log_sink` | EventSink             | Serial log output            |
//! | `storage`  | StoragePort           | SPIFFS volume / directory    |
//! |            | ConfigPort            | `config.json`                |
//! | `time`     | ClockPort             | ESP32 system timer           |

pub mod audio;
pub mod delay;
pub mod hardware;
pub mod log_sink;
pub mod storage;
pub mod time;
