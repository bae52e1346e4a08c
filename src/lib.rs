//! # Traffic Light
//!
//! A traffic light that toggles between red and green on a randomized timer,
//! and a blocking queue that carries each phase change to observers waiting
//! on other threads.
//!
//! ```no_run
//! use traffic_light::TrafficLight;
//!
//! let light = TrafficLight::new()?;
//! light.simulate()?;
//! light.wait_for_green()?;
//! light.stop();
//! # Ok::<(), traffic_light::TrafficLightError>(())
//! ```

pub mod config;
pub mod error;
pub mod message_queue;
pub mod phase;
pub mod traffic_light;

pub use config::CycleConfig;
pub use error::{ConfigError, QueueClosed, TrafficLightError};
pub use message_queue::{DrainOrder, MessageQueue, QueueStats};
pub use phase::Phase;
pub use traffic_light::TrafficLight;
