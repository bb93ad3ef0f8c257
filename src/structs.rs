/// What to ask the transit API for on behalf of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct StationQuery {
    pub station: String,
    pub platform: Option<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub time_label: String,
    pub line: String,
    pub direction: String,
    pub icon_key: String,
    pub is_urgent: bool,
    pub is_delayed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    pub temperature: String,
    pub today_min: f32,
    pub today_max: f32,
    pub icon_now: String,
    pub icon_today: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationResult {
    pub title: String,
    pub departures: Vec<Departure>,
    pub weather: Option<Weather>,
}

impl StationResult {
    /// What a page shows when fetching failed: its own name and nothing else.
    pub fn empty(query: &StationQuery) -> StationResult {
        return StationResult{
            title: query.station.clone(),
            departures: vec![],
            weather: None,
        };
    }
}
