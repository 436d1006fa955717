// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! # molforce's Logging Framework
//!
//! This crate initializes logging for molforce and the programs that drive it.  Every crate logs
//! through the [`log`] facade; on desktop platforms [`env_logger`] writes the records to the
//! terminal and reads its configuration from the environment.  Create a [`Logging`] value naming
//! the crates to capture and call [`Logging::init`] once at startup.
//!
//! By default, the logging level is set to [`Info`](log::Level::Info) for debug builds, and
//! [`Warn`](log::Level::Warn) for release builds. This can be overridden by setting the `RUST_LOG`
//! environment variable, like so:
//!
//! ```sh
//! $> RUST_LOG=molforce=debug,molforce_device=trace cargo test
//! ```

mod platform;
mod platform_impl;
pub use platform::{filter_string, Logging};

/// A module which is typically glob imported.
pub mod prelude {
    pub use super::Logging;
}

// End of File
