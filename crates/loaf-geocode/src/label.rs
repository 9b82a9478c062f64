//! Display labels for geocoder results.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::AddressComponents;

/// A leading house number such as `515`, `1200A` or `12-34`.
static HOUSE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[A-Za-z]?(-\d+[A-Za-z]?)?$").expect("valid house number regex"));

/// Builds the label shown for a suggestion and stored as the address.
///
/// Joins the place name, a street line, the locality and the postal code
/// with `", "`, skipping empty or repeated parts. The street line prefers
/// the structured `house_number` + `road` fields; without a road it falls
/// back to the first two `display_name` parts when the first one looks like
/// a house number. If nothing usable is left, `display_name` is returned.
#[must_use]
pub fn format_label(name: Option<&str>, display_name: &str, address: &AddressComponents) -> String {
    let street = street_line(display_name, address);
    let road = non_empty(address.road.as_deref());

    let name = non_empty(name).filter(|n| {
        let same_as = |other: Option<&str>| other.is_some_and(|o| o.eq_ignore_ascii_case(n));
        !same_as(street.as_deref()) && !same_as(road)
    });

    let mut parts: Vec<&str> = Vec::with_capacity(4);
    for part in [
        name,
        street.as_deref(),
        non_empty(address.locality()),
        non_empty(address.postcode.as_deref()),
    ]
    .into_iter()
    .flatten()
    {
        if !parts.iter().any(|p| p.eq_ignore_ascii_case(part)) {
            parts.push(part);
        }
    }

    if parts.is_empty() {
        return display_name.trim().to_string();
    }
    parts.join(", ")
}

fn street_line(display_name: &str, address: &AddressComponents) -> Option<String> {
    let house = non_empty(address.house_number.as_deref());
    let road = non_empty(address.road.as_deref());

    match (house, road) {
        (Some(h), Some(r)) => Some(format!("{h} {r}")),
        (None, Some(r)) => Some(r.to_string()),
        _ => street_from_display_name(display_name),
    }
}

fn street_from_display_name(display_name: &str) -> Option<String> {
    let mut parts = display_name.split(',').map(str::trim);
    let first = parts.next().filter(|p| HOUSE_NUMBER.is_match(p))?;
    let second = parts.next().filter(|p| !p.is_empty())?;
    Some(format!("{first} {second}"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hastings() -> AddressComponents {
        AddressComponents {
            house_number: Some("515".to_string()),
            road: Some("West Hastings Street".to_string()),
            city: Some("Vancouver".to_string()),
            postcode: Some("V6B 5K3".to_string()),
            ..AddressComponents::default()
        }
    }

    #[test]
    fn structured_street_line_is_preferred() {
        let label = format_label(
            Some(""),
            "515, West Hastings Street, Downtown, Vancouver, British Columbia, V6B 5K3, Canada",
            &hastings(),
        );
        assert_eq!(label, "515 West Hastings Street, Vancouver, V6B 5K3");
    }

    #[test]
    fn place_name_leads_the_label() {
        let label = format_label(Some("SFU Harbour Centre"), "", &hastings());
        assert_eq!(
            label,
            "SFU Harbour Centre, 515 West Hastings Street, Vancouver, V6B 5K3"
        );
    }

    #[test]
    fn name_equal_to_road_is_not_repeated() {
        let address = AddressComponents {
            road: Some("Granville Street".to_string()),
            city: Some("Vancouver".to_string()),
            ..AddressComponents::default()
        };
        let label = format_label(Some("Granville Street"), "", &address);
        assert_eq!(label, "Granville Street, Vancouver");
    }

    #[test]
    fn display_name_heuristic_used_without_road() {
        let address = AddressComponents {
            town: Some("Burnaby".to_string()),
            ..AddressComponents::default()
        };
        let label = format_label(None, "8888, University Drive, Burnaby, BC", &address);
        assert_eq!(label, "8888 University Drive, Burnaby");
    }

    #[test]
    fn heuristic_ignores_non_numeric_first_part() {
        let address = AddressComponents {
            city: Some("Vancouver".to_string()),
            ..AddressComponents::default()
        };
        let label = format_label(Some("Stanley Park"), "Stanley Park, Vancouver, BC", &address);
        assert_eq!(label, "Stanley Park, Vancouver");
    }

    #[test]
    fn falls_back_to_display_name_when_nothing_structured() {
        let label = format_label(None, "  Somewhere, BC  ", &AddressComponents::default());
        assert_eq!(label, "Somewhere, BC");
    }
}
