//! `log` facade backend for the browser console

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Forwards `log` records to `console.error/warn/info/debug`
pub struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Install the console logger. Later calls only adjust the level.
pub fn init(level: LevelFilter) {
    // set_logger fails if a logger is already installed; keep that one
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

/// `[inkcore] message`, with the module path appended at debug/trace level
pub fn format_record(level: Level, target: &str, message: &str) -> String {
    match level {
        Level::Debug | Level::Trace => format!("[inkcore] {} ({})", message, target),
        _ => format!("[inkcore] {}", message),
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record.level(), record.target(), &record.args().to_string());
        emit(record.level(), &line);
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "wasm32")]
fn emit(level: Level, line: &str) {
    let value = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::Error => web_sys::console::error_1(&value),
        Level::Warn => web_sys::console::warn_1(&value),
        Level::Info => web_sys::console::info_1(&value),
        Level::Debug | Level::Trace => web_sys::console::debug_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(_level: Level, line: &str) {
    eprintln!("{}", line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_record() {
        assert_eq!(
            format_record(Level::Info, "inkcore::annotate::engine", "[Engine] ready"),
            "[inkcore] [Engine] ready"
        );
        assert_eq!(
            format_record(Level::Debug, "inkcore::annotate::gateway", "[Gateway] skip"),
            "[inkcore] [Gateway] skip (inkcore::annotate::gateway)"
        );
    }
}
