// Maps station data onto openHASP objects. Object ids are fixed by the page
// design loaded on the display:
//
//   p<page>b1    title            p<page>b2   temperature
//   p<page>b3    weather icon     p<page>b99  "last updated"
//   p<page>b<11 + 10*i + k>       slot i, k = 0 time, 1 icon, 2 line, 3 destination
extern crate chrono;
extern crate chrono_tz;

use crate::config::{Config, GlobalSettings, PageConfig};
use crate::structs::{Departure, StationResult};

const TITLE_OBJECT: u32 = 1;
const TEMPERATURE_OBJECT: u32 = 2;
const WEATHER_ICON_OBJECT: u32 = 3;
const FOOTER_OBJECT: u32 = 99;

const FIRST_SLOT_OBJECT: u32 = 11;
const SLOT_STRIDE: u32 = 10;
const TIME_FIELD: u32 = 0;
const ICON_FIELD: u32 = 1;
const LINE_FIELD: u32 = 2;
const DEST_FIELD: u32 = 3;
const SLOT_FIELDS: [u32; 4] = [TIME_FIELD, ICON_FIELD, LINE_FIELD, DEST_FIELD];

// mdi "train" glyph
const TITLE_GLYPH: &str = "\u{E70E}";
const SCROLL_SEPARATOR: &str = "  +++  ";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(i64),
}

impl Value {
    pub fn payload(&self) -> String {
        return match *self {
            Value::Text(ref s) => s.clone(),
            Value::Number(n) => n.to_string(),
        };
    }
}

/// One property change on the display, e.g. ("p2b11.text", "3 min").
#[derive(Debug, Clone, PartialEq)]
pub struct RegionUpdate {
    pub address: String,
    pub value: Value,
}

pub fn slot_base(slot: usize) -> u32 {
    return FIRST_SLOT_OBJECT + SLOT_STRIDE * slot as u32;
}

struct PageUpdates {
    page_id: u32,
    updates: Vec<RegionUpdate>,
}

impl PageUpdates {
    fn new(page_id: u32) -> PageUpdates {
        return PageUpdates{page_id: page_id, updates: vec![]};
    }

    fn set(&mut self, object: u32, property: &str, value: Value) {
        self.updates.push(RegionUpdate{
            address: format!("p{}b{}.{}", self.page_id, object, property),
            value: value,
        });
    }

    fn text(&mut self, object: u32, property: &str, text: &str) {
        self.set(object, property, Value::Text(text.to_string()));
    }

    fn number(&mut self, object: u32, property: &str, n: i64) {
        self.set(object, property, Value::Number(n));
    }

    fn hide_slot(&mut self, base: u32, hidden: bool) {
        for field in SLOT_FIELDS.iter() {
            self.number(base + field, "hidden", if hidden { 1 } else { 0 });
        }
    }
}

/// Column positions for every slot of every page. Sent once when the
/// display is first driven.
pub fn init_layout(config: &Config) -> Vec<RegionUpdate> {
    let columns = &config.global_settings.columns_x;
    let mut all = vec![];

    for page in &config.pages {
        let mut updates = PageUpdates::new(page.id);
        for slot in 0..page.line_count {
            let base = slot_base(slot);
            updates.number(base + TIME_FIELD, "x", columns.time);
            updates.number(base + ICON_FIELD, "x", columns.icon);
            updates.number(base + LINE_FIELD, "x", columns.line);
            updates.number(base + DEST_FIELD, "x", columns.dest);
            updates.number(base + DEST_FIELD, "w", config.global_settings.dest_width);
        }
        all.extend(updates.updates);
    }
    return all;
}

pub fn map_page(page: &PageConfig,
                settings: &GlobalSettings,
                station: &StationResult,
                now: chrono::DateTime<chrono_tz::Tz>) -> Vec<RegionUpdate> {
    let mut updates = PageUpdates::new(page.id);

    let title = match page.platform {
        Some(ref platform) => format!("{} {} Gl.{}", TITLE_GLYPH, station.title, platform),
        None => format!("{} {}", TITLE_GLYPH, station.title),
    };
    updates.text(TITLE_OBJECT, "text", &title);
    updates.text(FOOTER_OBJECT, "text", &format!("Update: {}", now.format("%H:%M")));

    if let Some(ref weather) = station.weather {
        updates.text(TEMPERATURE_OBJECT, "text", &weather.temperature);
        updates.text(WEATHER_ICON_OBJECT, "text", &weather.icon_now);
        if let Some(object) = settings.today_icon_object {
            updates.text(object, "text", &weather.icon_today);
        }
    }

    for slot in 0..page.line_count {
        let base = slot_base(slot);
        match station.departures.get(slot) {
            Some(departure) => fill_slot(&mut updates, base, departure, settings),
            None => updates.hide_slot(base, true),
        }
    }

    return updates.updates;
}

fn fill_slot(updates: &mut PageUpdates, base: u32, departure: &Departure, settings: &GlobalSettings) {
    let color = if departure.is_delayed {
        &settings.colors.delay
    } else if departure.is_urgent {
        &settings.colors.urgent
    } else {
        &settings.colors.normal
    };

    updates.hide_slot(base, false);
    updates.text(base + TIME_FIELD, "text", &departure.time_label);
    updates.text(base + TIME_FIELD, "text_color", color);
    updates.text(base + ICON_FIELD, "src", &departure.icon_key);
    updates.text(base + LINE_FIELD, "text", &departure.line);

    let (mode, destination) = destination_mode(&departure.direction, settings);
    updates.text(base + DEST_FIELD, "mode", mode);
    updates.text(base + DEST_FIELD, "text", &destination);
}

/// Long destinations scroll; the separator keeps the loop readable.
fn destination_mode<'a>(direction: &str, settings: &'a GlobalSettings) -> (&'a str, String) {
    if direction.chars().count() > settings.max_chars_before_scroll {
        return (settings.scroll_type.as_str(), format!("{}{}", direction, SCROLL_SEPARATOR));
    }
    return (settings.default_type.as_str(), direction.to_string());
}
