//! A crate to serve CT-API card terminal calls through a K2 REST backend.
//!
//! ## Usage
//! ```rust,no_run
//! use k2_ctapi::wire::DataRequest;
//! use k2_ctapi::{Dispatcher, Settings, Status};
//!
//! let dispatcher = Dispatcher::from_settings(&Settings::load().unwrap()).unwrap();
//!
//! assert_eq!(dispatcher.init(1, 1), Status::Ok);
//!
//! // SELECT FILE
//! let command = [0x00, 0xA4, 0x04, 0x00, 0x00];
//! let response = dispatcher.data(1, DataRequest::new(1, 2, &command, 256));
//!
//! dispatcher.close(1);
//! ```

#[cfg(feature = "tracing")]
#[macro_use]
extern crate tracing;

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($t: tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn {
    ($($t: tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! error {
    ($($t: tt)*) => {};
}

pub mod bridge;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod registry;
pub mod settings;
pub mod status;
pub mod wire;

pub use bridge::Bridge;
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use settings::Settings;
pub use status::Status;
