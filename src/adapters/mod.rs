//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                   |
//! |----------------|--------------------|-------------------------------|
//! | `hardware`     | SensorPort         | HC-SR04, FC-22 ADC            |
//! |                | ActuatorPort       | L298N PWM/GPIO, steering servo|
//! | `time`         | ClockPort, DelayNs | ESP32 system timer            |
//! | `log_sink`     | EventSink          | Serial log output             |
//! | `memory_store` | RemoteStore        | In-memory JSON tree           |
//! | `firebase`     | RemoteStore        | Firebase RTDB REST API        |
//! | `wifi`         | ConnectivityPort   | ESP-IDF WiFi STA              |

pub mod firebase;
pub mod hardware;
pub mod log_sink;
pub mod memory_store;
pub mod time;
pub mod wifi;
