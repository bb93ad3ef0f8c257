extern crate regex;

use regex::Regex;

// Applied in order: the specific "... Bahnhof" forms must win over the
// generic one.
const ABBREVIATIONS: &[(&str, &str)] = &[
    (r"(?i)\boberer Bahnhof\b", "Ob. Bf."),
    (r"(?i)\bunterer Bahnhof\b", "Unt. Bf."),
    (r"(?i)\bHauptbahnhof\b", "Hbf."),
    (r"(?i)\bBahnhof\b", "Bf."),
    (r",", ""),
];

struct Patterns {
    qualifier: Regex,
    whitespace: Regex,
    abbreviations: Vec<(Regex, &'static str)>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: std::sync::OnceLock<Patterns> = std::sync::OnceLock::new();
    return PATTERNS.get_or_init(|| {
        return Patterns{
            qualifier: Regex::new(r"\(.*?\)").expect("qualifier regex"),
            whitespace: Regex::new(r"\s+").expect("whitespace regex"),
            abbreviations: ABBREVIATIONS.iter()
                .map(|(pattern, replacement)| (Regex::new(pattern).expect("abbreviation regex"), *replacement))
                .collect(),
        };
    });
}

/// Builds a short display title from the city and stop name the transit API
/// reports, e.g. ("Plauen", "oberer Bahnhof") -> "Plauen Ob. Bf.".
pub fn clean_name(city: &str, stop: &str) -> String {
    let patterns = patterns();

    let simple_city = patterns.qualifier.replace_all(city, "").trim().to_lowercase();
    let mut name = if stop.to_lowercase().contains(&simple_city) {
        stop.to_string()
    } else {
        format!("{} {}", city, stop)
    };

    for (pattern, replacement) in &patterns.abbreviations {
        name = pattern.replace_all(&name, *replacement).into_owned();
    }

    return patterns.whitespace.replace_all(&name, " ").trim().to_string();
}

#[cfg(test)]
mod tests {
    use super::clean_name;

    #[test]
    fn specific_station_forms_first() {
        assert_eq!("Plauen Ob. Bf.", clean_name("Plauen", "oberer Bahnhof"));
        assert_eq!("Plauen Unt. Bf.", clean_name("Plauen", "Unterer Bahnhof"));
        assert_eq!("Zwickau Hbf.", clean_name("Zwickau", "Hauptbahnhof"));
    }

    #[test]
    fn city_already_in_stop_name() {
        assert_eq!("Jocketa Bf.", clean_name("Jocketa", "Jocketa, Bahnhof"));
    }

    #[test]
    fn qualifier_ignored_for_containment() {
        assert_eq!("Plauen Tunnel", clean_name("Plauen (Vogtl)", "Plauen Tunnel"));
    }

    #[test]
    fn qualifier_kept_when_concatenating() {
        assert_eq!("Plauen (Vogtl) Ob. Bf.", clean_name("Plauen (Vogtl)", "oberer Bahnhof"));
    }

    #[test]
    fn empty_city_is_the_stop_name() {
        // VVO leaves the city empty for stops inside Dresden.
        assert_eq!("Hbf.", clean_name("", "Hauptbahnhof"));
        assert_eq!("Postplatz", clean_name("", "  Postplatz "));
    }

    #[test]
    fn bahnhof_inside_a_word_is_untouched() {
        assert_eq!("Pirna Bahnhofstraße", clean_name("Pirna", "Bahnhofstraße"));
    }
}
