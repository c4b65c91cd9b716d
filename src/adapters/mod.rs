//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                 |
//! |------------|--------------------|-----------------------------|
//! | `hardware` | ClockSource        | system clock adapter        |
//! |            | BellPort           | GPIO bell bank              |
//! |            | RelayPort          | GPIO heating relay          |
//! | `log_sink` | EventSink          | Serial log output           |
//! | `store`    | DocumentStore      | SPIFFS files / in-memory    |
//! |            | ConfigPort         | `config.json`               |
//! | `time`     | ClockSource        | ESP32 system timer + SNTP   |

pub mod hardware;
pub mod log_sink;
pub mod store;
pub mod time;
