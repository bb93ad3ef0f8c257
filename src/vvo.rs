// Client for the VVO (Verkehrsverbund Oberelbe) web API:
// https://github.com/kiliankoe/vvo/blob/main/documentation/webapi.md
extern crate anyhow;
extern crate chrono;
extern crate reqwest;
extern crate serde_json;

use anyhow::Context;

use crate::mot;
use crate::result;

const POINTFINDER_URL: &str = "https://webapi.vvo-online.de/tr/pointfinder?format=json";
const DEPARTURE_MONITOR_URL: &str = "https://webapi.vvo-online.de/dm?format=json";
const DEPARTURE_LIMIT: u32 = 50;
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub type PostFn = fn(&str, &serde_json::Value) -> result::DashResult<String>;

/// A resolved stop. The coordinate is Gauss-Krüger zone 4 (easting,
/// northing), if the API reported one.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: String,
    pub city: String,
    pub name: String,
    pub coordinate: Option<(f64, f64)>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RawPlatform {
    #[serde(default)]
    pub name: String,
}

/// One entry of a departure monitor response, as sent by the API.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RawDeparture {
    pub scheduled_time: Option<String>,
    pub real_time: Option<String>,
    pub platform: Option<RawPlatform>,
    #[serde(default)]
    pub mot: mot::Mot,
    #[serde(default)]
    pub line_name: String,
    #[serde(default)]
    pub direction: String,
}

impl RawDeparture {
    pub fn platform_name(&self) -> &str {
        return self.platform.as_ref().map(|p| p.name.as_str()).unwrap_or("");
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PointfinderResponse {
    #[serde(default)]
    points: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DepartureMonitorResponse {
    #[serde(default)]
    departures: Vec<RawDeparture>,
}

pub fn find_stop(query: &str) -> result::DashResult<Option<Stop>> {
    return find_stop_ext(query, real_post);
}

pub fn fetch_departures(stop_id: &str, now: chrono::DateTime<chrono::Utc>) -> result::DashResult<Vec<RawDeparture>> {
    return fetch_departures_ext(stop_id, now, real_post);
}

fn find_stop_ext(query: &str, post_fn: PostFn) -> result::DashResult<Option<Stop>> {
    let request = serde_json::json!({
        "query": query,
        "stopsOnly": true,
        "limit": 1,
    });
    let response_body = post_fn(POINTFINDER_URL, &request)?;
    let response: PointfinderResponse = serde_json::from_str(&response_body)
        .with_context(|| format!("while parsing pointfinder response for '{}'", query))?;

    return Ok(response.points.first().and_then(|p| parse_point(p)));
}

// "33000028|||Hauptbahnhof|5655904|4621157|0||"
//  id      |type|city|name|northing|easting|...
fn parse_point(point: &str) -> Option<Stop> {
    let parts: Vec<&str> = point.split('|').collect();
    if parts.len() < 4 || parts[0].is_empty() {
        warn!("Unexpected pointfinder entry: '{}'", point);
        return None;
    }

    let number = |i: usize| parts.get(i).and_then(|v| v.parse::<f64>().ok()).filter(|v| *v > 0.0);
    let coordinate = match (number(5), number(4)) {
        (Some(easting), Some(northing)) => Some((easting, northing)),
        _ => None,
    };

    return Some(Stop{
        id: parts[0].to_string(),
        city: parts[2].to_string(),
        name: parts[3].to_string(),
        coordinate: coordinate,
    });
}

fn fetch_departures_ext(stop_id: &str,
                        now: chrono::DateTime<chrono::Utc>,
                        post_fn: PostFn) -> result::DashResult<Vec<RawDeparture>> {
    let request = serde_json::json!({
        "stopid": stop_id,
        "time": now.to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
        "isarrival": false,
        "limit": DEPARTURE_LIMIT,
        "mot": mot::ALL_KNOWN,
    });
    let response_body = post_fn(DEPARTURE_MONITOR_URL, &request)?;
    let response: DepartureMonitorResponse = serde_json::from_str(&response_body)
        .with_context(|| format!("while parsing departures for stop {}", stop_id))?;

    debug!("Stop {}: {} raw departures", stop_id, response.departures.len());
    return Ok(response.departures);
}

fn real_post(url: &str, body: &serde_json::Value) -> result::DashResult<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    let response = client.post(url)
        .header(reqwest::header::USER_AGENT, "vvodash")
        .json(body)
        .send()
        .with_context(|| format!("while posting to url: {}", url))?
        .error_for_status()?;
    return Ok(response.text()?);
}
