//! Country directory
//!
//! Static lookup of ISO 3166-1 alpha-2 codes, display names and flags.
//! Coffee and roaster countries are stored as free text; this directory is
//! only used to validate form input and to decorate pages with a flag.

use serde::Serialize;

/// A resolved country entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
}

impl Country {
    /// Flag emoji built from the regional indicator symbols of the code
    pub fn flag(&self) -> String {
        self.code
            .chars()
            .filter_map(|c| {
                let offset = u32::from(c.to_ascii_uppercase()).checked_sub(u32::from('A'))?;
                char::from_u32(0x1F1E6 + offset)
            })
            .collect()
    }
}

/// Known country names, keyed by code
const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("AQ", "Antarctica"),
    ("AR", "Argentina"),
    ("AT", "Austria"),
    ("AU", "Australia"),
    ("BE", "Belgium"),
    ("BI", "Burundi"),
    ("BO", "Bolivia"),
    ("BR", "Brazil"),
    ("CA", "Canada"),
    ("CD", "Congo (the Democratic Republic of the)"),
    ("CH", "Switzerland"),
    ("CM", "Cameroon"),
    ("CN", "China"),
    ("CO", "Colombia"),
    ("CR", "Costa Rica"),
    ("CU", "Cuba"),
    ("CZ", "Czechia"),
    ("DE", "Germany"),
    ("DK", "Denmark"),
    ("DO", "Dominican Republic"),
    ("EC", "Ecuador"),
    ("ES", "Spain"),
    ("ET", "Ethiopia"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("GT", "Guatemala"),
    ("HN", "Honduras"),
    ("HT", "Haiti"),
    ("ID", "Indonesia"),
    ("IE", "Ireland"),
    ("IN", "India"),
    ("IS", "Iceland"),
    ("IT", "Italy"),
    ("JM", "Jamaica"),
    ("JP", "Japan"),
    ("KE", "Kenya"),
    ("KR", "South Korea"),
    ("LA", "Laos"),
    ("LS", "Lesotho"),
    ("MG", "Madagascar"),
    ("MM", "Myanmar"),
    ("MW", "Malawi"),
    ("MX", "Mexico"),
    ("NI", "Nicaragua"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("NZ", "New Zealand"),
    ("PA", "Panama"),
    ("PE", "Peru"),
    ("PG", "Papua New Guinea"),
    ("PH", "Philippines"),
    ("PL", "Poland"),
    ("PT", "Portugal"),
    ("RW", "Rwanda"),
    ("SE", "Sweden"),
    ("SV", "El Salvador"),
    ("TH", "Thailand"),
    ("TL", "Timor-Leste"),
    ("TW", "Taiwan"),
    ("TZ", "Tanzania"),
    ("UG", "Uganda"),
    ("US", "United States of America"),
    ("VE", "Venezuela"),
    ("VN", "Viet Nam"),
    ("YE", "Yemen"),
    ("ZM", "Zambia"),
    ("ZW", "Zimbabwe"),
];

/// Allow-list of codes offered and accepted by the application: coffee
/// origins plus the usual roasting countries.
const ORIGIN_COUNTRY_CODES: &[&str] = &[
    "AR", "AT", "AU", "BE", "BI", "BO", "BR", "CA", "CD", "CH", "CM", "CN", "CO", "CR", "CU",
    "CZ", "DE", "DK", "DO", "EC", "ES", "ET", "FI", "FR", "GB", "GT", "HN", "HT", "ID", "IE",
    "IN", "IS", "IT", "JM", "JP", "KE", "KR", "LA", "LS", "MG", "MM", "MW", "MX", "NI", "NL",
    "NO", "NZ", "PA", "PE", "PG", "PH", "PL", "PT", "RW", "SE", "SV", "TH", "TL", "TW", "TZ",
    "UG", "US", "VE", "VN", "YE", "ZM", "ZW",
];

/// Resolve an allow-listed code (case-insensitive) to its entry
pub fn resolve_code(code: &str) -> Option<Country> {
    let code = code.trim();

    let allowed = ORIGIN_COUNTRY_CODES
        .iter()
        .find(|allowed| allowed.eq_ignore_ascii_case(code))?;

    COUNTRY_NAMES
        .iter()
        .find(|(known, _)| known == allowed)
        .map(|&(code, name)| Country { code, name })
}

/// Resolve an exact (case-sensitive) country name through the allow-list
pub fn resolve_name(name: &str) -> Option<Country> {
    let (code, _) = COUNTRY_NAMES.iter().find(|(_, known)| *known == name)?;
    resolve_code(code)
}

/// All allow-listed countries, ordered by name
pub fn origin_countries() -> Vec<Country> {
    let mut countries: Vec<Country> = ORIGIN_COUNTRY_CODES
        .iter()
        .filter_map(|code| resolve_code(code))
        .collect();

    countries.sort_by(|a, b| a.name.cmp(b.name));
    countries
}

/// Flag for a free-text country name, empty when it does not resolve
pub fn country_flag(name: &str) -> String {
    resolve_name(name).map(|c| c.flag()).unwrap_or_default()
}
