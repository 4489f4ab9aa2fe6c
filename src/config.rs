use std::{fs, path::Path};

use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "transport.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_host: String,
    pub port: u16,
    pub taxi_capacity: u32,
    pub special_locations: Vec<String>,
    pub priority_column: String,
    pub priority_marker: String,
    pub output_file: String,
    pub notification_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".into(),
            port: 8080,
            taxi_capacity: 18,
            special_locations: vec![
                "Total Garage Braamfontein".into(),
                "15 Yale Road".into(),
            ],
            priority_column: "If you're doing the membership process, are you coming to the class at 8:30 AM this Sunday?".into(),
            priority_marker: "Yes".into(),
            output_file: "Transport_Allocations.xlsx".into(),
            notification_ms: 3000,
        }
    }
}

impl Settings {
    pub fn is_special_location(&self, location: &str) -> bool {
        self.special_locations.iter().any(|l| l == location)
    }
}

pub fn load_settings() -> Settings {
    let mut settings = load_settings_file(Path::new(SETTINGS_FILE));
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn load_settings_file(path: &Path) -> Settings {
    let Ok(raw) = fs::read_to_string(path) else {
        return Settings::default();
    };

    match toml::from_str::<Settings>(&raw) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
            Settings::default()
        }
    }
}

fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("TRANSPORT__BIND_HOST") {
        settings.bind_host = v;
    }
    if let Some(v) = lookup("TRANSPORT__PORT") {
        if let Ok(parsed) = v.parse::<u16>() {
            settings.port = parsed;
        }
    }
    if let Some(v) = lookup("TRANSPORT__TAXI_CAPACITY") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.taxi_capacity = parsed;
        }
    }
    if let Some(v) = lookup("TRANSPORT__SPECIAL_LOCATIONS") {
        settings.special_locations = v
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(v) = lookup("TRANSPORT__PRIORITY_COLUMN") {
        settings.priority_column = v;
    }
    if let Some(v) = lookup("TRANSPORT__PRIORITY_MARKER") {
        settings.priority_marker = v;
    }
    if let Some(v) = lookup("TRANSPORT__OUTPUT_FILE") {
        settings.output_file = v;
    }
    if let Some(v) = lookup("TRANSPORT__NOTIFICATION_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.notification_ms = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_the_form_and_fleet() {
        let settings = Settings::default();
        assert_eq!(settings.taxi_capacity, 18);
        assert_eq!(settings.output_file, "Transport_Allocations.xlsx");
        assert!(settings.is_special_location("15 Yale Road"));
        assert!(!settings.is_special_location("15 yale road"));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TRANSPORT__PORT", "9090"),
            ("TRANSPORT__TAXI_CAPACITY", "not-a-number"),
            ("TRANSPORT__SPECIAL_LOCATIONS", "Park Station; Rosebank Mall ;"),
        ]);
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.port, 9090);
        assert_eq!(settings.taxi_capacity, 18);
        assert_eq!(settings.special_locations, vec!["Park Station", "Rosebank Mall"]);
    }

    #[test]
    fn partial_settings_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "port = 3000\noutput_file = \"Sunday.xlsx\"\n").expect("write");

        let settings = load_settings_file(&path);
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.output_file, "Sunday.xlsx");
        assert_eq!(settings.taxi_capacity, 18);
    }

    #[test]
    fn missing_settings_file_yields_defaults() {
        let settings = load_settings_file(Path::new("does-not-exist.toml"));
        assert_eq!(settings.port, 8080);
    }
}
