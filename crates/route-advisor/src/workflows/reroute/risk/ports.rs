use crate::workflows::reroute::domain::Waypoint;

/// UN/LOCODE lookup for ports that commonly appear by name only.
const WELL_KNOWN_PORTS: &[(&str, &str)] = &[
    ("singapore", "SGSIN"),
    ("rotterdam", "NLRTM"),
    ("shanghai", "CNSHA"),
    ("los angeles", "USLAX"),
    ("hamburg", "DEHAM"),
    ("hong kong", "HKHKG"),
    ("dubai", "AEDXB"),
    ("colombo", "LKCMB"),
    ("cape town", "ZACPT"),
    ("gibraltar", "GIGIB"),
    ("suez", "EGSUZ"),
    ("panama", "PAPAN"),
];

pub(crate) fn port_code_for_name(name: &str) -> Option<&'static str> {
    let lowered = name.to_ascii_lowercase();
    WELL_KNOWN_PORTS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, code)| *code)
}

/// Explicit `port_code` wins; otherwise fall back to the name table.
pub(crate) fn resolve_port_code(waypoint: &Waypoint) -> Option<String> {
    if let Some(code) = waypoint
        .port_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
    {
        return Some(code.to_ascii_uppercase());
    }
    port_code_for_name(&waypoint.name).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(name: &str, code: Option<&str>) -> Waypoint {
        Waypoint {
            name: name.to_string(),
            lat: 0.0,
            lon: 0.0,
            kind: Some("port".to_string()),
            port_code: code.map(str::to_string),
        }
    }

    #[test]
    fn resolves_names_by_substring() {
        assert_eq!(port_code_for_name("Port of Los Angeles"), Some("USLAX"));
        assert_eq!(port_code_for_name("SUEZ CANAL (north)"), Some("EGSUZ"));
        assert_eq!(port_code_for_name("Valparaiso"), None);
    }

    #[test]
    fn explicit_code_takes_precedence() {
        assert_eq!(
            resolve_port_code(&port("Singapore", Some(" nlrtm "))),
            Some("NLRTM".to_string())
        );
        assert_eq!(
            resolve_port_code(&port("Singapore", Some(""))),
            Some("SGSIN".to_string())
        );
        assert_eq!(resolve_port_code(&port("Unknown Harbour", None)), None);
    }
}
