// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

/// Initializes the logging framework to capture logs from the crates specified with a minimum
/// [`log::Level`] of [`Info`](log::Level::Info) on debug builds and [`Warn`](log::Level::Warn) on
/// release builds.  On desktop platforms, these defaults can be overridden by setting the
/// `RUST_LOG` environment variable.
pub struct Logging {
    crates: Vec<&'static str>,
    level: log::LevelFilter,
}

impl Logging {
    /// Creates a new [`Logging`] instance with the specified list of crates to capture logs from.
    pub fn new(crates: Vec<&'static str>) -> Self {
        Self {
            crates,
            level: if cfg!(debug_assertions) {
                log::LevelFilter::Info
            } else {
                log::LevelFilter::Warn
            },
        }
    }

    /// Overrides the build-profile default level.  `RUST_LOG` still takes precedence.
    pub fn with_level(mut self, level: log::LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Installs the logger.  Only the first call in a process has any effect, so test harnesses
    /// may call this from every test.
    pub fn init(&self) {
        crate::platform_impl::init_with_level(&self.crates, self.level);
    }
}

/// Builds the filter string that would have been set in `RUST_LOG`, e.g. `molforce=info`.
pub fn filter_string(crates: &[&str], level: log::LevelFilter) -> String {
    let level_str = level.as_str().to_ascii_lowercase();
    crates
        .iter()
        .map(|pkg_name| format!("{}={}", pkg_name, level_str))
        .collect::<Vec<_>>()
        .join(",")
}


// End of File
