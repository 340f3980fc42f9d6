use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "restore.toml";
pub const TICKS_PER_BAR: u32 = 100;
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RestorationSettings {
    /// Time budget for the `Loading` bar while the display name is looked up.
    pub recovery_timeout_ms: u64,
    pub finishing_duration_ms: u64,
    /// Pause in `Finished` before deciding between `Complete` and manual entry.
    pub finished_delay_ms: u64,
    /// Jump to `Finishing` as soon as the lookup returns a name instead of
    /// letting the `Loading` bar fill.
    pub advance_on_lookup: bool,
}

impl Default for RestorationSettings {
    fn default() -> Self {
        Self {
            recovery_timeout_ms: 15_000,
            finishing_duration_ms: 300,
            finished_delay_ms: 200,
            advance_on_lookup: false,
        }
    }
}

impl RestorationSettings {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_millis(self.recovery_timeout_ms)
    }

    pub fn finishing_duration(&self) -> Duration {
        Duration::from_millis(self.finishing_duration_ms)
    }

    pub fn finished_delay(&self) -> Duration {
        Duration::from_millis(self.finished_delay_ms)
    }
}

/// Interval between ticks so that a full bar takes `total`.
pub fn tick_period(total: Duration) -> Duration {
    (total / TICKS_PER_BAR).max(MIN_TICK_PERIOD)
}

/// Loads settings from `path`, or from `restore.toml` in the working directory
/// when present, then applies `APP__*` environment overrides.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<RestorationSettings> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None if Path::new(DEFAULT_SETTINGS_FILE).exists() => {
            read_settings_file(Path::new(DEFAULT_SETTINGS_FILE))?
        }
        None => RestorationSettings::default(),
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<RestorationSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))
}

fn apply_env_overrides(
    settings: &mut RestorationSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let millis = |key: &str, target: &mut u64| {
        if let Some(v) = lookup(key) {
            match v.trim().parse::<u64>() {
                Ok(parsed) => *target = parsed,
                Err(_) => warn!(key, value = %v, "ignoring non-numeric settings override"),
            }
        }
    };

    millis("APP__RECOVERY_TIMEOUT_MS", &mut settings.recovery_timeout_ms);
    millis("APP__FINISHING_DURATION_MS", &mut settings.finishing_duration_ms);
    millis("APP__FINISHED_DELAY_MS", &mut settings.finished_delay_ms);

    if let Some(v) = lookup("APP__ADVANCE_ON_LOOKUP") {
        match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => settings.advance_on_lookup = true,
            "0" | "false" | "no" => settings.advance_on_lookup = false,
            _ => warn!(value = %v, "ignoring invalid APP__ADVANCE_ON_LOOKUP"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    #[test]
    fn tick_period_splits_budget_into_hundred_ticks() {
        assert_eq!(
            tick_period(Duration::from_secs(15)),
            Duration::from_millis(150)
        );
        assert_eq!(tick_period(Duration::ZERO), MIN_TICK_PERIOD);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("restore_settings_test_{suffix}.toml"));
        fs::write(&path, "recovery_timeout_ms = 2000\nadvance_on_lookup = true\n")
            .expect("write settings");

        let settings = read_settings_file(&path).expect("parse settings");
        assert_eq!(settings.recovery_timeout_ms, 2000);
        assert!(settings.advance_on_lookup);
        assert_eq!(settings.finishing_duration_ms, 300);

        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_settings(Some(Path::new("/nonexistent/restore.toml")))
            .expect_err("missing file");
        assert!(err.to_string().contains("failed to read settings file"));
    }

    #[test]
    fn env_overrides_skip_garbage_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("APP__FINISHING_DURATION_MS", "900"),
            ("APP__FINISHED_DELAY_MS", "soon"),
            ("APP__ADVANCE_ON_LOOKUP", "TRUE"),
        ]);
        let mut settings = RestorationSettings::default();
        apply_env_overrides(&mut settings, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.finishing_duration_ms, 900);
        assert_eq!(settings.finished_delay_ms, 200);
        assert!(settings.advance_on_lookup);
    }
}
