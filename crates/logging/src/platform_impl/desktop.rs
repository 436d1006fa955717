// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

pub(crate) fn init_with_level(crates: &[&'static str], log_level: log::LevelFilter) {
    let filter_string = crate::filter_string(crates, log_level);

    // Use env_logger's builder API to avoid unsafe set_var call
    let env = env_logger::Env::default().default_filter_or(filter_string);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

// End of File
