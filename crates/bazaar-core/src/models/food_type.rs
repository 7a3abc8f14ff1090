//! Food type catalogue

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Food sold at a bazaar. The wire value is the kebab-case slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FoodType {
    NasiLemak,
    Satay,
    Murtabak,
    RotiJohn,
    AyamPercik,
    Laksa,
    Kuih,
    AirTebu,
    NasiKerabu,
    Rendang,
    TepungPelita,
    BuburLambuk,
    Kebab,
    BurgerRamly,
    PutuPiring,
}

impl FoodType {
    pub const ALL: [Self; 15] = [
        Self::NasiLemak,
        Self::Satay,
        Self::Murtabak,
        Self::RotiJohn,
        Self::AyamPercik,
        Self::Laksa,
        Self::Kuih,
        Self::AirTebu,
        Self::NasiKerabu,
        Self::Rendang,
        Self::TepungPelita,
        Self::BuburLambuk,
        Self::Kebab,
        Self::BurgerRamly,
        Self::PutuPiring,
    ];

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::NasiLemak => "nasi-lemak",
            Self::Satay => "satay",
            Self::Murtabak => "murtabak",
            Self::RotiJohn => "roti-john",
            Self::AyamPercik => "ayam-percik",
            Self::Laksa => "laksa",
            Self::Kuih => "kuih",
            Self::AirTebu => "air-tebu",
            Self::NasiKerabu => "nasi-kerabu",
            Self::Rendang => "rendang",
            Self::TepungPelita => "tepung-pelita",
            Self::BuburLambuk => "bubur-lambuk",
            Self::Kebab => "kebab",
            Self::BurgerRamly => "burger-ramly",
            Self::PutuPiring => "putu-piring",
        }
    }

    /// Human readable name
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NasiLemak => "Nasi Lemak",
            Self::Satay => "Satay",
            Self::Murtabak => "Murtabak",
            Self::RotiJohn => "Roti John",
            Self::AyamPercik => "Ayam Percik",
            Self::Laksa => "Laksa",
            Self::Kuih => "Kuih",
            Self::AirTebu => "Air Tebu",
            Self::NasiKerabu => "Nasi Kerabu",
            Self::Rendang => "Rendang",
            Self::TepungPelita => "Tepung Pelita",
            Self::BuburLambuk => "Bubur Lambuk",
            Self::Kebab => "Kebab",
            Self::BurgerRamly => "Burger Ramly",
            Self::PutuPiring => "Putu Piring",
        }
    }
}

impl fmt::Display for FoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for FoodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|food| food.slug() == needle)
            .ok_or_else(|| format!("unknown food type '{}'", s.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_round_trip_through_from_str() {
        for food in FoodType::ALL {
            assert_eq!(food.slug().parse::<FoodType>(), Ok(food));
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_rejects_unknown() {
        assert_eq!(" Nasi-Lemak ".parse::<FoodType>(), Ok(FoodType::NasiLemak));
        assert!("pizza".parse::<FoodType>().is_err());
    }

    #[test]
    fn serde_uses_slug() {
        let json = serde_json::to_string(&FoodType::BurgerRamly).unwrap();
        assert_eq!(json, "\"burger-ramly\"");
        assert_eq!(FoodType::BurgerRamly.label(), "Burger Ramly");
    }
}
