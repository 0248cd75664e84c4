//! Record types stored in the central database.

use serde::{Deserialize, Serialize};
use stowdb_core::record;

record! {
    /// One value per school, plus a universal value that applies to all.
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    pub struct SchoolBasedStat {
        pub universal: f64,
        pub fire: f64,
        pub ice: f64,
        pub storm: f64,
        pub myth: f64,
        pub life: f64,
        pub death: f64,
        pub balance: f64,
        pub sun: f64,
        pub moon: f64,
        pub star: f64,
    }
}

impl SchoolBasedStat {
    /// The universal value plus the value for `school`, if given.
    ///
    /// An unknown school contributes nothing.
    pub fn total(&self, school: Option<&str>) -> f64 {
        let specific = match school {
            Some("fire") => self.fire,
            Some("ice") => self.ice,
            Some("storm") => self.storm,
            Some("myth") => self.myth,
            Some("life") => self.life,
            Some("death") => self.death,
            Some("balance") => self.balance,
            Some("sun") => self.sun,
            Some("moon") => self.moon,
            Some("star") => self.star,
            _ => 0.0,
        };
        self.universal + specific
    }
}

record! {
    /// The full stat block of an item, ability or jewel.
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    pub struct Stats {
        pub damage_percent: SchoolBasedStat,
        pub damage_flat: SchoolBasedStat,
        pub resist_percent: SchoolBasedStat,
        pub resist_flat: SchoolBasedStat,
        pub critical_rating: SchoolBasedStat,
        pub critical_block_rating: SchoolBasedStat,
        pub pierce_percent: SchoolBasedStat,
        pub shadow_pip_rating: f64,
        pub power_pip_percent: f64,
        pub accuracy_percent: SchoolBasedStat,
        pub health: f64,
        pub mana: f64,
    }
}

record! {
    /// A fetched page, stored before it is parsed.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RawSiteData {
        pub page_url: String,
        pub category: String,
        pub page_source: Option<String>,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct WearableItem {
        pub page_url: String,
        pub name: String,
        pub category: String,
        pub stats: Stats,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct PetAbility {
        pub page_url: String,
        pub name: String,
        pub stats: Stats,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Jewel {
        pub page_url: String,
        pub name: String,
        pub shape: String,
        pub stats: Stats,
        pub pet_ability_page_url: Option<String>,
    }
}

const UNKNOWN: &str = "N/A";

impl Default for RawSiteData {
    fn default() -> Self {
        Self {
            page_url: String::new(),
            category: UNKNOWN.to_string(),
            page_source: None,
        }
    }
}

impl Default for WearableItem {
    fn default() -> Self {
        Self {
            page_url: String::new(),
            name: UNKNOWN.to_string(),
            category: UNKNOWN.to_string(),
            stats: Stats::default(),
        }
    }
}

impl Default for PetAbility {
    fn default() -> Self {
        Self {
            page_url: String::new(),
            name: UNKNOWN.to_string(),
            stats: Stats::default(),
        }
    }
}

impl Default for Jewel {
    fn default() -> Self {
        Self {
            page_url: String::new(),
            name: UNKNOWN.to_string(),
            shape: UNKNOWN.to_string(),
            stats: Stats::default(),
            pet_ability_page_url: None,
        }
    }
}
