extern crate anyhow;
extern crate chrono_tz;
extern crate serde;
extern crate serde_json;

use anyhow::Context;

use crate::result;
use crate::structs::StationQuery;

/// x positions of the four columns of every slot, in pixels.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Columns {
    pub time: i64,
    pub icon: i64,
    pub line: i64,
    pub dest: i64,
}

impl Default for Columns {
    fn default() -> Columns {
        return Columns{time: 5, icon: 75, line: 115, dest: 170};
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Colors {
    pub normal: String,
    pub urgent: String,
    pub delay: String,
}

impl Default for Colors {
    fn default() -> Colors {
        return Colors{
            normal: "#FFFFFF".to_string(),
            urgent: "#FFA500".to_string(),
            delay: "#FF0000".to_string(),
        };
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GlobalSettings {
    pub mqtt_topic_prefix: String,
    pub mqtt_delay_sec: f64,
    pub update_interval_sec: u64,
    pub page_pause_sec: f64,
    pub columns_x: Columns,
    pub dest_width: i64,
    pub colors: Colors,
    // openHASP label modes ("crop", "dot", "loop", ...)
    pub default_type: String,
    pub scroll_type: String,
    pub max_chars_before_scroll: usize,
    pub timezone: String,
    pub weather_refresh_sec: u64,
    pub today_icon_object: Option<u32>,
}

impl Default for GlobalSettings {
    fn default() -> GlobalSettings {
        return GlobalSettings{
            mqtt_topic_prefix: "hasp/plate".to_string(),
            mqtt_delay_sec: 0.1,
            update_interval_sec: 30,
            page_pause_sec: 1.0,
            columns_x: Columns::default(),
            dest_width: 210,
            colors: Colors::default(),
            default_type: "crop".to_string(),
            scroll_type: "loop".to_string(),
            max_chars_before_scroll: 15,
            timezone: "Europe/Berlin".to_string(),
            weather_refresh_sec: 600,
            today_icon_object: None,
        };
    }
}

impl GlobalSettings {
    pub fn publish_delay(&self) -> std::time::Duration {
        return std::time::Duration::from_secs_f64(self.mqtt_delay_sec);
    }

    pub fn page_pause(&self) -> std::time::Duration {
        return std::time::Duration::from_secs_f64(self.page_pause_sec);
    }

    pub fn update_interval(&self) -> std::time::Duration {
        return std::time::Duration::from_secs(self.update_interval_sec);
    }

    pub fn weather_refresh(&self) -> std::time::Duration {
        return std::time::Duration::from_secs(self.weather_refresh_sec);
    }

    /// Zone used for the "last updated" clock. Validated on load.
    pub fn tz(&self) -> chrono_tz::Tz {
        return self.timezone.parse().unwrap_or(chrono_tz::Europe::Berlin);
    }
}

const MAX_DELAY_SEC: f64 = 60.0;
const MAX_INTERVAL_SEC: u64 = 24 * 60 * 60;

fn default_line_count() -> usize {
    return 5;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PageConfig {
    pub id: u32,
    pub vvo_id_or_name: String,
    #[serde(default, deserialize_with = "platform_from_json")]
    pub platform: Option<String>,
    #[serde(default)]
    pub mot_filter: Vec<String>,
    #[serde(default = "default_line_count")]
    pub line_count: usize,
}

impl PageConfig {
    pub fn query(&self) -> StationQuery {
        return StationQuery{
            station: self.vvo_id_or_name.clone(),
            platform: self.platform.clone(),
            categories: self.mot_filter.clone(),
        };
    }
}

// Platforms show up as "2", 2, "" or null in hand-written configs.
fn platform_from_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where D: serde::Deserializer<'de> {
    use serde::Deserialize;

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let platform = match value {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => {
            return Err(serde::de::Error::custom(format!("invalid platform: {}", other)));
        }
    };
    return Ok(if platform.is_empty() { None } else { Some(platform) });
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub global_settings: GlobalSettings,
    pub pages: Vec<PageConfig>,
}

impl Config {
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> result::DashResult<Config> {
        let debug_path = path.as_ref().display().to_string();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Opening config '{}'", debug_path))?;
        return Config::parse(&contents)
            .map_err(|e| result::make_error(&format!("Config '{}': {}", debug_path, e)));
    }

    pub fn parse(contents: &str) -> result::DashResult<Config> {
        let config: Config = serde_json::from_str(contents)?;
        config.validate()?;
        return Ok(config);
    }

    /// A single page built from command line flags, with default settings.
    pub fn single_page(page: PageConfig) -> Config {
        return Config{
            global_settings: GlobalSettings::default(),
            pages: vec![page],
        };
    }

    pub fn validate(&self) -> result::DashResult<()> {
        let settings = &self.global_settings;

        if self.pages.is_empty() {
            return Err(result::make_error("no pages configured"));
        }
        for page in &self.pages {
            if page.line_count == 0 {
                return Err(result::make_error(&format!("page {} has no lines", page.id)));
            }
            if page.vvo_id_or_name.trim().is_empty() {
                return Err(result::make_error(&format!("page {} has no station", page.id)));
            }
        }
        for (name, secs) in &[("mqtt_delay_sec", settings.mqtt_delay_sec),
                              ("page_pause_sec", settings.page_pause_sec)] {
            if !secs.is_finite() || *secs < 0.0 || *secs > MAX_DELAY_SEC {
                return Err(result::make_error(&format!(
                    "{} must be between 0 and {} seconds", name, MAX_DELAY_SEC)));
            }
        }
        for (name, secs) in &[("update_interval_sec", settings.update_interval_sec),
                              ("weather_refresh_sec", settings.weather_refresh_sec)] {
            if *secs > MAX_INTERVAL_SEC {
                return Err(result::make_error(&format!(
                    "{} must be at most {} seconds", name, MAX_INTERVAL_SEC)));
            }
        }
        if settings.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(result::make_error(&format!("unknown timezone '{}'", settings.timezone)));
        }
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    const EXAMPLE: &str = r##"{
        "global_settings": {
            "mqtt_topic_prefix": "hasp/plate_willi_1",
            "mqtt_delay_sec": 0.05,
            "update_interval_sec": 45,
            "columns_x": {"time": 0, "icon": 80, "line": 120, "dest": 180},
            "colors": {"normal": "#FFFFFF", "urgent": "#FFFF00", "delay": "#FF0000"},
            "default_type": "dot",
            "scroll_type": "loop",
            "max_chars_before_scroll": 12
        },
        "pages": [
            {"id": 2, "vvo_id_or_name": "Plauen oberer Bahnhof", "platform": "", "mot_filter": ["zug"], "line_count": 5},
            {"id": 3, "vvo_id_or_name": "Jocketa", "platform": 2, "mot_filter": [], "line_count": 3},
            {"id": 4, "vvo_id_or_name": "Postplatz"}
        ]
    }"##;

    #[test]
    fn parse_example() {
        let config = Config::parse(EXAMPLE).expect("parse config");

        let settings = &config.global_settings;
        assert_eq!("hasp/plate_willi_1", settings.mqtt_topic_prefix);
        assert_eq!(std::time::Duration::from_millis(50), settings.publish_delay());
        assert_eq!(std::time::Duration::from_secs(45), settings.update_interval());
        assert_eq!(180, settings.columns_x.dest);
        assert_eq!("dot", settings.default_type);
        assert_eq!(12, settings.max_chars_before_scroll);

        // Defaults for everything not mentioned.
        assert_eq!(std::time::Duration::from_secs(1), settings.page_pause());
        assert_eq!(210, settings.dest_width);
        assert_eq!(chrono_tz::Europe::Berlin, settings.tz());
        assert_eq!(None, settings.today_icon_object);

        assert_eq!(3, config.pages.len());
        assert_eq!(None, config.pages[0].platform);
        assert_eq!(vec!["zug".to_string()], config.pages[0].mot_filter);
        assert_eq!(Some("2".to_string()), config.pages[1].platform);
        assert_eq!(5, config.pages[2].line_count);
        assert!(config.pages[2].mot_filter.is_empty());
    }

    #[test]
    fn page_query() {
        let config = Config::parse(EXAMPLE).expect("parse config");
        let query = config.pages[1].query();

        assert_eq!("Jocketa", query.station);
        assert_eq!(Some("2".to_string()), query.platform);
        assert!(query.categories.is_empty());
    }

    #[test]
    fn missing_required_keys() {
        assert!(Config::parse(r#"{"pages": [{"id": 1, "vvo_id_or_name": "Hbf"}]}"#).is_err());
        assert!(Config::parse(r#"{"global_settings": {}}"#).is_err());
        assert!(Config::parse(r#"{"global_settings": {}, "pages": [{"id": 1}]}"#).is_err());
    }

    #[test]
    fn invalid_values() {
        assert!(Config::parse(r#"{"global_settings": {}, "pages": []}"#).is_err());
        assert!(Config::parse(
            r#"{"global_settings": {}, "pages": [{"id": 1, "vvo_id_or_name": "Hbf", "line_count": 0}]}"#).is_err());
        assert!(Config::parse(
            r#"{"global_settings": {"mqtt_delay_sec": -1}, "pages": [{"id": 1, "vvo_id_or_name": "Hbf"}]}"#).is_err());
        assert!(Config::parse(
            r#"{"global_settings": {"timezone": "Mars/Olympus"}, "pages": [{"id": 1, "vvo_id_or_name": "Hbf"}]}"#).is_err());
        assert!(Config::parse(
            r#"{"global_settings": {}, "pages": [{"id": 1, "vvo_id_or_name": "Hbf", "platform": [1]}]}"#).is_err());
    }

    #[test]
    fn oversized_durations_rejected() {
        let err = Config::parse(
            r#"{"global_settings": {"update_interval_sec": 18446744073709551615}, "pages": [{"id": 1, "vvo_id_or_name": "Hbf"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("update_interval_sec"), "{}", err);
        assert!(Config::parse(
            r#"{"global_settings": {"mqtt_delay_sec": 1e300}, "pages": [{"id": 1, "vvo_id_or_name": "Hbf"}]}"#).is_err());
        assert!(Config::parse(
            r#"{"global_settings": {"page_pause_sec": 3601}, "pages": [{"id": 1, "vvo_id_or_name": "Hbf"}]}"#).is_err());
        assert!(Config::parse(
            r#"{"global_settings": {"weather_refresh_sec": 100000000}, "pages": [{"id": 1, "vvo_id_or_name": "Hbf"}]}"#).is_err());

        let config = Config::parse(
            r#"{"global_settings": {"update_interval_sec": 86400, "page_pause_sec": 60}, "pages": [{"id": 1, "vvo_id_or_name": "Hbf"}]}"#)
            .expect("limits are inclusive");
        assert_eq!(std::time::Duration::from_secs(86400), config.global_settings.update_interval());
    }

    #[test]
    fn load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(EXAMPLE.as_bytes()).expect("write config");

        let config = Config::load(file.path()).expect("load config");
        assert_eq!(2, config.pages[0].id);

        let err = Config::load("/nonexistent/vvodash.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/vvodash.json"), "{}", err);
    }
}
