extern crate chrono;

use crate::config::GlobalSettings;
use crate::departures;
use crate::geo;
use crate::names;
use crate::result;
use crate::structs::{StationQuery, StationResult, Weather};
use crate::vvo;
use crate::weather;

/// Everything one page needs, fetched and normalized.
pub trait StationSource {
    fn fetch(&mut self, query: &StationQuery, settings: &GlobalSettings) -> result::DashResult<StationResult>;
}

type FindStopFn = fn(&str) -> result::DashResult<Option<vvo::Stop>>;
type DeparturesFn = fn(&str, chrono::DateTime<chrono::Utc>) -> result::DashResult<Vec<vvo::RawDeparture>>;
type WeatherFn = fn(f64, f64) -> result::DashResult<Weather>;

struct CachedWeather {
    fetched: std::time::Instant,
    weather: Weather,
}

pub struct VvoStationSource {
    find_stop_fn: FindStopFn,
    departures_fn: DeparturesFn,
    weather_fn: WeatherFn,
    weather_cache: std::collections::HashMap<String, CachedWeather>,
}

impl VvoStationSource {
    pub fn new() -> VvoStationSource {
        return VvoStationSource::with_fetchers(vvo::find_stop, vvo::fetch_departures, weather::get_weather);
    }

    fn with_fetchers(find_stop_fn: FindStopFn,
                     departures_fn: DeparturesFn,
                     weather_fn: WeatherFn) -> VvoStationSource {
        return VvoStationSource{
            find_stop_fn: find_stop_fn,
            departures_fn: departures_fn,
            weather_fn: weather_fn,
            weather_cache: std::collections::HashMap::new(),
        };
    }

    fn fetch_at(&mut self,
                query: &StationQuery,
                settings: &GlobalSettings,
                now: chrono::DateTime<chrono::Utc>) -> result::DashResult<StationResult> {
        let stop = (self.find_stop_fn)(&query.station)?
            .ok_or_else(|| result::make_error(&format!("Unknown station '{}'", query.station)))?;
        debug!("'{}' resolved to stop {} ({}, {})", query.station, stop.id, stop.city, stop.name);

        let raw = (self.departures_fn)(&stop.id, now)?;
        let departures = departures::normalize(
            &raw, query.platform.as_deref(), &query.categories, now);
        debug!("{}: {} of {} departures kept", stop.id, departures.len(), raw.len());

        return Ok(StationResult{
            title: names::clean_name(&stop.city, &stop.name),
            departures: departures,
            weather: self.weather_for(&stop, settings.weather_refresh()),
        });
    }

    // Weather is decoration: failures are logged and the page goes without.
    fn weather_for(&mut self, stop: &vvo::Stop, max_age: std::time::Duration) -> Option<Weather> {
        if let Some(cached) = self.weather_cache.get(&stop.id) {
            if cached.fetched.elapsed() < max_age {
                return Some(cached.weather.clone());
            }
        }

        let (lat, lon) = geo::project_or_default(stop.coordinate);
        match (self.weather_fn)(lat, lon) {
            Ok(weather) => {
                self.weather_cache.insert(stop.id.clone(), CachedWeather{
                    fetched: std::time::Instant::now(),
                    weather: weather.clone(),
                });
                return Some(weather);
            },
            Err(err) => {
                warn!("Weather for {} ({:.3}, {:.3}) failed: {}", stop.id, lat, lon, err);
                return None;
            },
        }
    }
}

impl StationSource for VvoStationSource {
    fn fetch(&mut self, query: &StationQuery, settings: &GlobalSettings) -> result::DashResult<StationResult> {
        return self.fetch_at(query, settings, chrono::Utc::now());
    }
}
