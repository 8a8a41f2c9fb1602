//! `log` backend for the browser console.

use log::LevelFilter;
use std::str::FromStr;

/// Parse a configured level name; unknown names fall back to `Info`.
pub fn level_filter(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or(LevelFilter::Info)
}

#[cfg(target_arch = "wasm32")]
mod console {
    use log::{Level, Log, Metadata, Record};
    use wasm_bindgen::JsValue;
    use web_sys::console;

    pub struct ConsoleLogger;

    pub static LOGGER: ConsoleLogger = ConsoleLogger;

    impl Log for ConsoleLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record) {
            if !self.enabled(record.metadata()) {
                return;
            }
            let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
            match record.level() {
                Level::Error => console::error_1(&line),
                Level::Warn => console::warn_1(&line),
                Level::Info => console::info_1(&line),
                Level::Debug | Level::Trace => console::debug_1(&line),
            }
        }

        fn flush(&self) {}
    }
}

/// Route `log` records to the console. Only the first call installs the
/// logger; later calls just adjust the level.
#[cfg(target_arch = "wasm32")]
pub fn init(level: &str) {
    let _ = log::set_logger(&console::LOGGER);
    log::set_max_level(level_filter(level));
}
