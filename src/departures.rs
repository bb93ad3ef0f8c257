extern crate chrono;

use crate::mot;
use crate::structs::Departure;
use crate::vvo::RawDeparture;

// Anything leaving sooner than this is shown as "jetzt".
const NOW_CUTOFF_MS: i64 = 45_000;
// Real time differing from the timetable by more than this gets a '*'.
const OFFSET_MARK_MS: i64 = 30_000;
// Running later than this switches to the "delay" color.
const DELAYED_MS: i64 = 45_000;
const URGENT_MINUTES: i64 = 2;

/// Parses VVO's "/Date(1487778279147+0100)/" literals. The embedded number
/// is already UTC milliseconds; the zone suffix is informational.
pub fn parse_vvo_date(literal: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    use chrono::TimeZone;

    let inner = literal.split('(').nth(1)?.split(')').next()?;
    let millis: i64 = inner.split(|c: char| c == '+' || c == '-').next()?.parse().ok()?;
    return chrono::Utc.timestamp_millis_opt(millis).single();
}

/// Minutes until departure, rounded half-up rather than truncated.
pub fn rounded_minutes(until_ms: i64) -> i64 {
    return (until_ms + 30_000).div_euclid(60_000);
}

pub fn time_label(until_ms: i64, offset_ms: i64) -> String {
    let mut label = if until_ms < NOW_CUTOFF_MS {
        "jetzt".to_string()
    } else {
        format!("{} min", rounded_minutes(until_ms))
    };
    if offset_ms.abs() > OFFSET_MARK_MS {
        label.push('*');
    }
    return label;
}

/// Turns raw departure monitor records into display-ready departures,
/// keeping the source order. Records that fail a filter or carry no usable
/// timetable time are skipped.
pub fn normalize(raw: &[RawDeparture],
                 platform_filter: Option<&str>,
                 categories: &[String],
                 now: chrono::DateTime<chrono::Utc>) -> Vec<Departure> {
    let platform_filter = platform_filter.filter(|p| !p.is_empty());
    let active = mot::expand_filter(categories);

    return raw.iter()
        .filter(|dep| platform_filter.map_or(true, |p| dep.platform_name() == p))
        .filter(|dep| active.is_empty() || active.contains(&dep.mot))
        .filter_map(|dep| normalize_one(dep, platform_filter.is_some(), now))
        .collect();
}

fn normalize_one(dep: &RawDeparture,
                 platform_filtered: bool,
                 now: chrono::DateTime<chrono::Utc>) -> Option<Departure> {
    let scheduled = dep.scheduled_time.as_ref().and_then(|t| parse_vvo_date(t));
    let scheduled = match scheduled {
        Some(scheduled) => scheduled,
        None => {
            debug!("Dropping {} -> {}: no scheduled time ({:?})",
                   dep.line_name, dep.direction, dep.scheduled_time);
            return None;
        }
    };
    // No real time means on schedule; an unreadable one drops the record.
    let effective = match dep.real_time {
        None => scheduled,
        Some(ref literal) => match parse_vvo_date(literal) {
            Some(real) => real,
            None => {
                debug!("Dropping {} -> {}: malformed real time ({})",
                       dep.line_name, dep.direction, literal);
                return None;
            }
        },
    };

    let offset_ms = (effective - scheduled).num_milliseconds();
    let until_ms = (effective - now).num_milliseconds();

    return Some(Departure{
        time_label: time_label(until_ms, offset_ms),
        line: line_label(dep),
        direction: direction_label(dep, platform_filtered),
        icon_key: dep.mot.icon().to_string(),
        is_urgent: rounded_minutes(until_ms) <= URGENT_MINUTES,
        is_delayed: offset_ms > DELAYED_MS,
    });
}

fn line_label(dep: &RawDeparture) -> String {
    if dep.mot == mot::Mot::BusOnRequest {
        return format!("{}*", dep.line_name);
    }
    if dep.mot == mot::Mot::IntercityBus || dep.line_name == "SEV" {
        return "SEV".to_string();
    }
    return dep.line_name.clone();
}

fn direction_label(dep: &RawDeparture, platform_filtered: bool) -> String {
    let platform = dep.platform_name();
    if platform_filtered || platform.is_empty() {
        return dep.direction.clone();
    }
    let label = if dep.mot.is_rail() { "Gl." } else { "St." };
    return format!("{}{} {}", label, platform, dep.direction);
}
