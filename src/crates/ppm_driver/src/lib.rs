//! Scripted plugin for the PpM object server.
//!
//! The server spawns the plugin with its stdio piped, writes the `PpM` marker,
//! and then exchanges one JSON object per line: the plugin sends actions
//! (`Server.CreateObject`, `Server.DeleteObject`, `Server.QueryObject`) and
//! reads back `{"id": .., "result": ..}` replies.
//!
//! Typical usage:
//! ```no_run
//! use std::io;
//! use std::time::Duration;
//! use ppm_driver::{Driver, DriverConfig};
//!
//! let config = DriverConfig::new().with_cooldown(Duration::from_millis(500));
//! let mut driver = Driver::new(io::stdin().lock(), io::stdout().lock(), config)
//!     .expect("driver should start");
//! let reason = driver.run().expect("server should speak the protocol");
//! eprintln!("stopped: {reason:?}");
//! ```

pub mod codec;
mod config;
mod driver;
mod error;
mod handshake;
pub mod model;
mod scenario;
mod signal;

pub use codec::{Response, ResponseBody};
pub use config::DriverConfig;
pub use driver::{Driver, DriverState, StopReason};
pub use error::{CodecError, DriverError, DriverResult};
pub use handshake::{wait_for_header, HANDSHAKE};
pub use model::{Action, ManagedObject, ObjectId, PhysicsOptions, RequestId, Vector2, Volume};
pub use scenario::ObjectRandomizer;
pub use signal::StopSignal;
