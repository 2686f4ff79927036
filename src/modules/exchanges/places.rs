use anyhow::anyhow;

/// The fixed set of physical locations an exchange may be arranged at.
/// Non-empty by construction; order is the configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceCatalog {
    places: Vec<String>,
}

impl PlaceCatalog {
    pub fn new(places: Vec<String>) -> anyhow::Result<Self> {
        let places: Vec<String> = places.into_iter().map(|p| p.trim().to_string()).collect();
        if places.is_empty() {
            return Err(anyhow!("at least one exchange place is required"));
        }
        if places.iter().any(String::is_empty) {
            return Err(anyhow!("exchange places must not be blank"));
        }
        Ok(Self { places })
    }

    /// Exact set membership; no fuzzy matching.
    pub fn contains(&self, place: &str) -> bool {
        self.places.iter().any(|known| known == place)
    }

    /// Preselected place when a client opens the exchange form.
    pub fn default_place(&self) -> &str {
        &self.places[0]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.places
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PlaceCatalog {
        PlaceCatalog::new(vec!["Room B104".to_string(), " Gym ".to_string()]).unwrap()
    }

    #[test]
    fn membership_is_exact() {
        let places = catalog();
        assert!(places.contains("Room B104"));
        assert!(places.contains("Gym"));
        assert!(!places.contains("room b104"));
        assert!(!places.contains("Library"));
    }

    #[test]
    fn first_place_is_the_default() {
        assert_eq!(catalog().default_place(), "Room B104");
    }

    #[test]
    fn empty_or_blank_catalogs_are_rejected() {
        assert!(PlaceCatalog::new(vec![]).is_err());
        assert!(PlaceCatalog::new(vec!["Gym".to_string(), "  ".to_string()]).is_err());
    }
}
