// Current conditions and today's range from Open-Meteo:
// https://open-meteo.com/en/docs
extern crate anyhow;
extern crate reqwest;
extern crate serde_json;

use anyhow::Context;

use crate::result;
use crate::structs::Weather;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

#[derive(Serialize, Deserialize, Debug)]
struct OpenMeteoCurrent {
    temperature_2m: f32,
    weather_code: i32,
}

#[derive(Serialize, Deserialize, Debug)]
struct OpenMeteoDaily {
    temperature_2m_max: Vec<f32>,
    temperature_2m_min: Vec<f32>,
    weather_code: Vec<i32>,
}

#[derive(Serialize, Deserialize, Debug)]
struct OpenMeteoForecast {
    current: OpenMeteoCurrent,
    daily: OpenMeteoDaily,
}

/// Maps a WMO weather interpretation code to a Material Design Icons glyph
/// from the display's built-in icon font.
pub fn weather_icon(wmo_code: i32) -> &'static str {
    return match wmo_code {
        0 => "\u{E599}",                          // weather-sunny
        1 | 2 => "\u{E595}",                      // weather-partly-cloudy
        3 => "\u{E590}",                          // weather-cloudy
        45 | 48 => "\u{E591}",                    // weather-fog
        51 | 53 | 55 | 56 | 57 | 61 | 63 | 80 | 81 => "\u{E597}", // weather-rainy
        65 | 66 | 67 | 82 => "\u{E596}",          // weather-pouring
        71 | 73 | 75 | 77 | 85 | 86 => "\u{E598}", // weather-snowy
        95 | 96 | 99 => "\u{E67E}",               // weather-lightning-rainy
        _ => "\u{E590}",
    };
}

pub fn get_weather(lat: f64, lon: f64) -> result::DashResult<Weather> {
    return get_weather_ext(lat, lon, real_fetch);
}

fn get_weather_ext(lat: f64, lon: f64, fetch_fn: fn(&str) -> result::DashResult<String>) -> result::DashResult<Weather> {
    let url = format!(
        "https://api.open-meteo.com/v1/forecast?latitude={:.4}&longitude={:.4}\
         &current=temperature_2m,weather_code\
         &daily=temperature_2m_max,temperature_2m_min,weather_code\
         &timezone=auto&forecast_days=1",
        lat, lon);
    let response_body = fetch_fn(&url)?;
    let forecast: OpenMeteoForecast = serde_json::from_str(&response_body)
        .with_context(|| format!("while parsing json: \"{}\"", response_body))?;

    let today_max = *forecast.daily.temperature_2m_max.first()
        .ok_or(result::make_error("No daily max temperature"))?;
    let today_min = *forecast.daily.temperature_2m_min.first()
        .ok_or(result::make_error("No daily min temperature"))?;
    let today_code = forecast.daily.weather_code.first()
        .cloned()
        .unwrap_or(forecast.current.weather_code);

    return Ok(Weather{
        temperature: format!("{:.1}°C ({:.0}/{:.0})",
                             forecast.current.temperature_2m, today_min, today_max),
        today_min: today_min,
        today_max: today_max,
        icon_now: weather_icon(forecast.current.weather_code).to_string(),
        icon_today: weather_icon(today_code).to_string(),
    });
}

fn real_fetch(url: &str) -> result::DashResult<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    let response = client.get(url)
        .header(reqwest::header::USER_AGENT, "vvodash")
        .send()
        .with_context(|| format!("while fetching url: {}", url))?
        .error_for_status()?;
    return Ok(response.text()?);
}

#[cfg(test)]
mod tests {
    use super::result;

    fn golden_fetch(url: &str) -> result::DashResult<String> {
        assert!(url.contains("latitude=51.0500&longitude=13.7400"), "{}", url);
        assert!(url.contains("current=temperature_2m,weather_code"), "{}", url);
        return Ok(std::fs::read_to_string("testdata/openmeteo.json")
            .expect("Error reading openmeteo.json"));
    }

    fn truncated_fetch(_url: &str) -> result::DashResult<String> {
        return Ok("{\"current\":{\"temperature_2m\":1.0,\"weather_code\":0},\"daily\":{\"temperature_2m_max\":[],\"temperature_2m_min\":[],\"weather_code\":[]}}".to_string());
    }

    #[test]
    fn fetch_golden() {
        let weather = super::get_weather_ext(51.05, 13.74, golden_fetch).expect("weather");

        assert_eq!("7.8°C (2/10)", weather.temperature);
        assert_eq!(2.4, weather.today_min);
        assert_eq!(9.6, weather.today_max);
        assert_eq!("\u{E597}", weather.icon_now);
        assert_eq!("\u{E590}", weather.icon_today);
    }

    #[test]
    fn missing_daily_values() {
        let err = super::get_weather_ext(51.05, 13.74, truncated_fetch).unwrap_err();
        assert!(err.to_string().contains("No daily max"), "{}", err);
    }

    #[test]
    fn icons() {
        assert_eq!("\u{E599}", super::weather_icon(0));
        assert_eq!("\u{E598}", super::weather_icon(75));
        assert_eq!("\u{E590}", super::weather_icon(1234));
    }
}
