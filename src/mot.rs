// Mode-of-transport ("Mot") tags as reported by the VVO departure monitor,
// plus the lookup tables hung off them.

/// Vehicle category of a departure.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mot {
    Tram,
    CityBus,
    RegionalBus,
    Bus,
    SchoolBus,
    BusOnRequest,
    // VVO reports rail replacement services (SEV) under this tag.
    IntercityBus,
    ClockBus,
    PlusBus,
    SuburbanRailway,
    Subway,
    RegionalTrain,
    Train,
    Ferry,
    Cableway,
    #[serde(other)]
    Unknown,
}

impl Default for Mot {
    fn default() -> Mot {
        return Mot::Unknown;
    }
}

/// Every category we know about, sent along with departure monitor requests.
pub const ALL_KNOWN: &[Mot] = &[
    Mot::Tram,
    Mot::CityBus,
    Mot::RegionalBus,
    Mot::Bus,
    Mot::SchoolBus,
    Mot::BusOnRequest,
    Mot::IntercityBus,
    Mot::ClockBus,
    Mot::PlusBus,
    Mot::SuburbanRailway,
    Mot::Subway,
    Mot::RegionalTrain,
    Mot::Train,
    Mot::Ferry,
    Mot::Cableway,
];

const BUSES: &[Mot] = &[
    Mot::CityBus,
    Mot::RegionalBus,
    Mot::Bus,
    Mot::SchoolBus,
    Mot::BusOnRequest,
    Mot::IntercityBus,
    Mot::ClockBus,
    Mot::PlusBus,
];

const TRAINS: &[Mot] = &[Mot::RegionalTrain, Mot::Train];

const DEFAULT_ICON: &str = "L:ico-train.png";

impl Mot {
    /// Rail-like categories label their platform "Gl." (Gleis) instead of
    /// "St." (Steig).
    pub fn is_rail(&self) -> bool {
        return match *self {
            Mot::Train | Mot::RegionalTrain | Mot::SuburbanRailway => true,
            _ => false,
        };
    }

    /// Image resource on the display's flash filesystem.
    pub fn icon(&self) -> &'static str {
        return match *self {
            Mot::Tram => "L:ico-tram.png",
            Mot::CityBus | Mot::RegionalBus | Mot::Bus | Mot::IntercityBus => "L:ico-bus.png",
            Mot::SchoolBus => "L:school-bus.png",
            Mot::ClockBus => "L:clock-bus.png",
            Mot::PlusBus => "L:ico-plus-bus.png",
            Mot::BusOnRequest => "L:busOnRequest.png",
            Mot::Ferry => "L:ferry-colored.png",
            Mot::SuburbanRailway => "L:ico-metropolitan-railway.png",
            Mot::Subway => "L:U-Bahn_Berlin_logo.png",
            Mot::RegionalTrain | Mot::Train => "L:ico-train.png",
            Mot::Cableway | Mot::Unknown => DEFAULT_ICON,
        };
    }
}

/// Expands a user-facing filter token ("bus", "zug", ...) into the raw tags
/// it stands for. Unknown tokens expand to nothing.
pub fn expand_filter_token(token: &str) -> &'static [Mot] {
    return match token.trim().to_lowercase().as_str() {
        "tram" => &[Mot::Tram],
        "bus" => BUSES,
        "s" => &[Mot::SuburbanRailway],
        "u" => &[Mot::Subway],
        "zug" => TRAINS,
        "faehre" => &[Mot::Ferry],
        _ => &[],
    };
}

/// Union of all tokens' expansions. An empty result means "don't filter".
pub fn expand_filter(tokens: &[String]) -> std::collections::HashSet<Mot> {
    let mut active = std::collections::HashSet::new();
    for token in tokens {
        let expanded = expand_filter_token(token);
        if expanded.is_empty() {
            warn!("Ignoring unknown transport filter '{}'", token);
        }
        active.extend(expanded.iter().cloned());
    }
    return active;
}

#[cfg(test)]
mod tests {
    use super::Mot;

    #[test]
    fn bus_token_expands_to_all_buses() {
        let active = super::expand_filter(&["bus".to_string()]);

        for mot in &[Mot::CityBus, Mot::RegionalBus, Mot::Bus, Mot::SchoolBus,
                     Mot::BusOnRequest, Mot::IntercityBus, Mot::ClockBus, Mot::PlusBus] {
            assert!(active.contains(mot), "{:?} missing", mot);
        }
        assert!(!active.contains(&Mot::Tram));
        assert_eq!(8, active.len());
    }

    #[test]
    fn tokens_are_case_insensitive_and_unioned() {
        let active = super::expand_filter(&["Tram".to_string(), "ZUG".to_string()]);

        assert_eq!(3, active.len());
        assert!(active.contains(&Mot::Tram));
        assert!(active.contains(&Mot::Train));
        assert!(active.contains(&Mot::RegionalTrain));
    }

    #[test]
    fn unknown_tokens_expand_to_nothing() {
        assert!(super::expand_filter(&["monorail".to_string()]).is_empty());
        assert!(super::expand_filter(&[]).is_empty());
    }

    #[test]
    fn unknown_tags_deserialize() {
        let mot: Mot = serde_json::from_str("\"HailedSharedTaxi\"").expect("parse mot");
        assert_eq!(Mot::Unknown, mot);
        assert_eq!("L:ico-train.png", mot.icon());

        let mot: Mot = serde_json::from_str("\"SuburbanRailway\"").expect("parse mot");
        assert_eq!(Mot::SuburbanRailway, mot);
        assert!(mot.is_rail());
    }
}
