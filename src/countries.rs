//! ISO 3166-1 alpha-3 codes for the countries that show up in film catalogs.
//!
//! Sorted by code so lookups can binary search.

const COUNTRIES: &[(&str, &str)] = &[
    ("ARE", "United Arab Emirates"),
    ("ARG", "Argentina"),
    ("AUS", "Australia"),
    ("AUT", "Austria"),
    ("BEL", "Belgium"),
    ("BGR", "Bulgaria"),
    ("BRA", "Brazil"),
    ("CAN", "Canada"),
    ("CHE", "Switzerland"),
    ("CHL", "Chile"),
    ("CHN", "China"),
    ("COL", "Colombia"),
    ("CZE", "Czechia"),
    ("DEU", "Germany"),
    ("DNK", "Denmark"),
    ("EGY", "Egypt"),
    ("ESP", "Spain"),
    ("EST", "Estonia"),
    ("FIN", "Finland"),
    ("FRA", "France"),
    ("GBR", "United Kingdom"),
    ("GRC", "Greece"),
    ("HKG", "Hong Kong"),
    ("HRV", "Croatia"),
    ("HUN", "Hungary"),
    ("IDN", "Indonesia"),
    ("IND", "India"),
    ("IRL", "Ireland"),
    ("IRN", "Iran"),
    ("ISL", "Iceland"),
    ("ISR", "Israel"),
    ("ITA", "Italy"),
    ("JPN", "Japan"),
    ("KOR", "South Korea"),
    ("LTU", "Lithuania"),
    ("LVA", "Latvia"),
    ("MAR", "Morocco"),
    ("MEX", "Mexico"),
    ("MYS", "Malaysia"),
    ("NGA", "Nigeria"),
    ("NLD", "Netherlands"),
    ("NOR", "Norway"),
    ("NZL", "New Zealand"),
    ("PAK", "Pakistan"),
    ("PER", "Peru"),
    ("PHL", "Philippines"),
    ("POL", "Poland"),
    ("PRT", "Portugal"),
    ("ROU", "Romania"),
    ("RUS", "Russia"),
    ("SAU", "Saudi Arabia"),
    ("SGP", "Singapore"),
    ("SRB", "Serbia"),
    ("SVK", "Slovakia"),
    ("SVN", "Slovenia"),
    ("SWE", "Sweden"),
    ("THA", "Thailand"),
    ("TUR", "Turkey"),
    ("TWN", "Taiwan"),
    ("UKR", "Ukraine"),
    ("URY", "Uruguay"),
    ("USA", "United States of America"),
    ("VEN", "Venezuela"),
    ("VNM", "Vietnam"),
    ("ZAF", "South Africa"),
];

pub fn display_name(code: &str) -> Option<&'static str> {
    COUNTRIES.binary_search_by_key(&code, |&(c, _)| c).ok().map(|idx| COUNTRIES[idx].1)
}

/// Trims and upper-cases a country code, rejecting anything but three ASCII letters.
pub fn normalize_code(raw: &str) -> Option<String> {
    let code = raw.trim();
    (code.len() == 3 && code.bytes().all(|b| b.is_ascii_alphabetic()))
        .then(|| code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted() {
        assert!(COUNTRIES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn known_and_unknown_codes() {
        assert_eq!(display_name("USA"), Some("United States of America"));
        assert_eq!(display_name("JPN"), Some("Japan"));
        assert_eq!(display_name("XYZ"), None);
    }

    #[test]
    fn codes_are_normalized() {
        assert_eq!(normalize_code(" usa ").as_deref(), Some("USA"));
        assert_eq!(normalize_code("US"), None);
        assert_eq!(normalize_code("U5A"), None);
        assert_eq!(normalize_code("USAA"), None);
        assert_eq!(normalize_code("ßa"), None);
        assert_eq!(normalize_code("ÄBC"), None);
    }
}
