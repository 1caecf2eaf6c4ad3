//! Logger setup.
//!
//! Everything in the crate logs through the `log` facade; the binary installs a `fern`
//! dispatcher that writes timestamped lines to stderr and, optionally, to a file.

use std::str::FromStr;

use log::LevelFilter;

use crate::settings::LogSettings;

/// A parsed filter: a default level plus per-module overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilter {
    pub default: LevelFilter,
    pub modules: Vec<(String, LevelFilter)>,
}

impl FromStr for LogFilter {
    type Err = String;

    /// Parses `level` or comma separated `module=level` directives, e.g. `warn,lumen3d=debug`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filter = LogFilter {
            default: LevelFilter::Info,
            modules: Vec::new(),
        };
        for directive in s.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.split_once('=') {
                Some((module, level)) => {
                    let level = level
                        .trim()
                        .parse()
                        .map_err(|_| format!("invalid log level '{}' for '{}'", level, module))?;
                    filter.modules.push((module.trim().to_string(), level));
                }
                None => {
                    filter.default = directive
                        .parse()
                        .map_err(|_| format!("invalid log level '{}'", directive))?;
                }
            }
        }
        Ok(filter)
    }
}

/// Installs the global logger. Fails if a logger is already installed or the log file cannot be
/// opened.
pub fn init(settings: &LogSettings) -> Result<(), String> {
    let filter: LogFilter = settings.level.parse()?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {:<5} {}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(filter.default);
    for (module, level) in filter.modules {
        dispatch = dispatch.level_for(module, level);
    }
    dispatch = dispatch.chain(std::io::stderr());

    if let Some(path) = &settings.file {
        let file = fern::log_file(path)
            .map_err(|e| format!("failed to open log file '{}': {}", path.display(), e))?;
        dispatch = dispatch.chain(file);
    }

    dispatch.apply().map_err(|e| e.to_string())?;
    log::debug!("logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_level() {
        let filter: LogFilter = "debug".parse().unwrap();
        assert_eq!(filter.default, LevelFilter::Debug);
        assert!(filter.modules.is_empty());
    }

    #[test]
    fn module_overrides() {
        let filter: LogFilter = "warn, lumen3d::model=trace ,gltf=off".parse().unwrap();
        assert_eq!(filter.default, LevelFilter::Warn);
        assert_eq!(
            filter.modules,
            vec![
                ("lumen3d::model".to_string(), LevelFilter::Trace),
                ("gltf".to_string(), LevelFilter::Off),
            ]
        );
    }

    #[test]
    fn empty_means_info() {
        assert_eq!("".parse::<LogFilter>().unwrap().default, LevelFilter::Info);
    }

    #[test]
    fn bad_level_is_reported() {
        assert!("loud".parse::<LogFilter>().is_err());
        assert!("lumen3d=loud".parse::<LogFilter>().unwrap_err().contains("lumen3d"));
    }
}
