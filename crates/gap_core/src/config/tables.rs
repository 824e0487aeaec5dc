//! Static per-map zone rectangles and equipment prices.
//!
//! Both tables are plain data, built once at startup (defaults or YAML) and
//! handed to the analyzers by reference.

use super::ranks::RankTable;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Zone name reported for positions outside every zone (or on unknown maps).
pub const UNKNOWN_ZONE: &str = "Unknown";

/// Named axis-aligned rectangle, bounds inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Zone {
    pub fn new(name: &str, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self { name: name.to_string(), min_x, max_x, min_y, max_y }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_y <= y && y <= self.max_y
    }
}

/// Map name (lowercase) → ordered zone list. Zones need not tile the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawZoneTable")]
pub struct ZoneTable {
    maps: BTreeMap<String, Vec<Zone>>,
}

/// Zone table as written in YAML; keys are normalised on conversion.
#[derive(Deserialize)]
struct RawZoneTable {
    #[serde(default)]
    maps: BTreeMap<String, Vec<Zone>>,
}

impl From<RawZoneTable> for ZoneTable {
    fn from(raw: RawZoneTable) -> Self {
        raw.maps
            .into_iter()
            .fold(Self::empty(), |table, (map, zones)| table.with_map(&map, zones))
    }
}

impl ZoneTable {
    pub fn empty() -> Self {
        Self { maps: BTreeMap::new() }
    }

    /// Builder-style insert; replaces any existing zones for `map`.
    pub fn with_map(mut self, map: &str, zones: Vec<Zone>) -> Self {
        self.maps.insert(map.to_lowercase(), zones);
        self
    }

    pub fn zones_for(&self, map: &str) -> Option<&[Zone]> {
        self.maps.get(&map.to_lowercase()).map(Vec::as_slice)
    }

    pub fn maps(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }
}

impl Default for ZoneTable {
    /// Approximate callouts for the three most played maps.
    fn default() -> Self {
        Self::empty()
            .with_map(
                "de_dust2",
                vec![
                    Zone::new("T Spawn", -2600.0, -1800.0, 1400.0, 2600.0),
                    Zone::new("Long Doors", -1800.0, -800.0, 1400.0, 2600.0),
                    Zone::new("Long", -800.0, 600.0, 1400.0, 2600.0),
                    Zone::new("A Site", 600.0, 1600.0, 1400.0, 2600.0),
                    Zone::new("CT Spawn", 1600.0, 2600.0, 1400.0, 2600.0),
                    Zone::new("Tunnels", -2600.0, -1800.0, -600.0, 1400.0),
                    Zone::new("Mid Doors", -1800.0, -800.0, -600.0, 1400.0),
                    Zone::new("Mid", -800.0, 600.0, -600.0, 1400.0),
                    Zone::new("B Doors", 600.0, 1600.0, -600.0, 1400.0),
                    Zone::new("B Site", 1600.0, 2600.0, -600.0, 1400.0),
                    Zone::new("Lower Tunnels", -2600.0, -1800.0, -2600.0, -600.0),
                    Zone::new("Outside B", -1800.0, 2600.0, -2600.0, -600.0),
                ],
            )
            .with_map(
                "de_mirage",
                vec![
                    Zone::new("T Spawn", -3300.0, -2200.0, -1800.0, -300.0),
                    Zone::new("T Ramp", -2200.0, -1100.0, -1800.0, -300.0),
                    Zone::new("Palace", -1100.0, 200.0, -1800.0, -300.0),
                    Zone::new("A Site", 200.0, 1400.0, -1800.0, -300.0),
                    Zone::new("CT Spawn", 1400.0, 2600.0, -1800.0, -300.0),
                    Zone::new("Top Mid", -2200.0, -1100.0, -300.0, 1200.0),
                    Zone::new("Mid", -1100.0, 200.0, -300.0, 1200.0),
                    Zone::new("Connector", 200.0, 1400.0, -300.0, 1200.0),
                    Zone::new("Underpass", -2200.0, -1100.0, 1200.0, 2600.0),
                    Zone::new("Apartments", -1100.0, 200.0, 1200.0, 2600.0),
                    Zone::new("B Site", 200.0, 1400.0, 1200.0, 2600.0),
                ],
            )
            .with_map(
                "de_inferno",
                vec![
                    Zone::new("T Spawn", -2800.0, -1600.0, -2400.0, -800.0),
                    Zone::new("Banana", -1600.0, -400.0, -2400.0, -800.0),
                    Zone::new("B Site", -400.0, 800.0, -2400.0, -800.0),
                    Zone::new("Second Mid", -2800.0, -1600.0, -800.0, 800.0),
                    Zone::new("Mid", -1600.0, -400.0, -800.0, 800.0),
                    Zone::new("Arch", -400.0, 800.0, -800.0, 800.0),
                    Zone::new("Pit", 800.0, 2000.0, -800.0, 800.0),
                    Zone::new("Apartments", -1600.0, -400.0, 800.0, 2200.0),
                    Zone::new("Balcony", -400.0, 800.0, 800.0, 2200.0),
                    Zone::new("A Site", 800.0, 2000.0, 800.0, 2200.0),
                    Zone::new("CT Spawn", 2000.0, 3200.0, 800.0, 2200.0),
                ],
            )
    }
}

/// Equipment prices and kill rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceTable {
    /// Weapon identifier → purchase price
    pub weapons: BTreeMap<String, u32>,
    /// Flat value added when the player owns a helmet
    pub helmet_bonus: u32,
    /// Flat value added when the player owns a defuse kit
    pub kit_bonus: u32,
    /// Weapon identifier → kill reward, overriding `default_kill_reward`
    pub kill_rewards: BTreeMap<String, u32>,
    pub default_kill_reward: u32,
}

const DEFAULT_WEAPON_PRICES: &[(&str, u32)] = &[
    // Pistols
    ("usp_silencer", 0),
    ("glock", 0),
    ("hkp2000", 0),
    ("p250", 300),
    ("elite", 300),
    ("fiveseven", 500),
    ("tec9", 500),
    ("cz75a", 500),
    ("revolver", 600),
    ("deagle", 700),
    // SMGs
    ("mac10", 1050),
    ("ump45", 1200),
    ("mp9", 1250),
    ("bizon", 1400),
    ("mp7", 1500),
    ("mp5sd", 1500),
    ("p90", 2350),
    // Rifles
    ("galilar", 1800),
    ("famas", 2050),
    ("ak47", 2700),
    ("m4a1", 2900),
    ("m4a1_silencer", 2900),
    ("sg556", 3000),
    ("aug", 3300),
    // Snipers
    ("ssg08", 1700),
    ("awp", 4750),
    ("scar20", 5000),
    ("g3sg1", 5000),
    // Heavy
    ("nova", 1050),
    ("sawedoff", 1100),
    ("mag7", 1300),
    ("negev", 1700),
    ("xm1014", 2000),
    ("m249", 5200),
    // Free or not a purchase
    ("knife", 0),
    ("world", 0),
    ("inferno", 0),
    ("hegrenade", 0),
    ("flashbang", 0),
    ("smokegrenade", 0),
    ("molotov", 0),
    ("incgrenade", 0),
];

const DEFAULT_KILL_REWARDS: &[(&str, u32)] = &[
    ("knife", 1500),
    ("awp", 100),
    ("ssg08", 300),
    ("mac10", 600),
    ("mp9", 600),
    ("mp7", 600),
    ("ump45", 600),
    ("p90", 600),
    ("bizon", 600),
    ("mp5sd", 600),
    ("nova", 900),
    ("xm1014", 900),
    ("mag7", 900),
    ("sawedoff", 900),
    ("taser", 900),
];

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            weapons: DEFAULT_WEAPON_PRICES.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            helmet_bonus: 350,
            kit_bonus: 400,
            kill_rewards: DEFAULT_KILL_REWARDS.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            default_kill_reward: 300,
        }
    }
}

/// Replays sometimes prefix item names with `weapon_`.
fn canonical_weapon(weapon: &str) -> &str {
    weapon.strip_prefix("weapon_").unwrap_or(weapon)
}

impl PriceTable {
    /// Purchase price, 0 for unknown identifiers.
    pub fn weapon_price(&self, weapon: &str) -> u32 {
        self.weapons.get(canonical_weapon(weapon)).copied().unwrap_or(0)
    }

    pub fn kill_reward(&self, weapon: &str) -> u32 {
        self.kill_rewards
            .get(canonical_weapon(weapon))
            .copied()
            .unwrap_or(self.default_kill_reward)
    }

    pub fn with_weapon(mut self, weapon: &str, price: u32) -> Self {
        self.weapons.insert(weapon.to_string(), price);
        self
    }
}

/// Zone, price and rank tables bundled for the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticTables {
    pub zones: ZoneTable,
    pub prices: PriceTable,
    pub ranks: RankTable,
}

impl StaticTables {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_bounds_inclusive() {
        let zone = Zone::new("Mid", -800.0, 600.0, -600.0, 1400.0);
        assert!(zone.contains(-800.0, -600.0));
        assert!(zone.contains(600.0, 1400.0));
        assert!(!zone.contains(600.1, 0.0));
    }

    #[test]
    fn test_map_lookup_case_insensitive() {
        let table = ZoneTable::default();
        assert!(table.zones_for("DE_DUST2").is_some());
        assert!(table.zones_for("de_nuke").is_none());
        assert_eq!(table.maps().count(), 3);
    }

    #[test]
    fn test_weapon_prefix_stripped() {
        let prices = PriceTable::default();
        assert_eq!(prices.weapon_price("weapon_ak47"), 2700);
        assert_eq!(prices.weapon_price("ak47"), 2700);
        assert_eq!(prices.weapon_price("laser_rifle"), 0);
    }

    #[test]
    fn test_kill_rewards() {
        let prices = PriceTable::default();
        assert_eq!(prices.kill_reward("knife"), 1500);
        assert_eq!(prices.kill_reward("mp9"), 600);
        assert_eq!(prices.kill_reward("ak47"), 300);
    }

    #[test]
    fn test_tables_from_yaml() {
        let yaml = r#"
zones:
  maps:
    de_custom:
      - { name: "Box", min_x: 0.0, max_x: 10.0, min_y: 0.0, max_y: 10.0 }
prices:
  weapons:
    rifle: 2500
"#;
        let tables = StaticTables::from_yaml_str(yaml).unwrap();
        assert_eq!(tables.zones.zones_for("de_custom").map(|z| z.len()), Some(1));
        assert_eq!(tables.prices.weapon_price("rifle"), 2500);
        assert_eq!(tables.prices.helmet_bonus, 350);
        assert_eq!(tables.ranks.tiers.len(), 10, "rank ladder falls back to the default");
    }

    #[test]
    fn test_yaml_map_names_are_case_insensitive() {
        let yaml = r#"
zones:
  maps:
    DE_Custom:
      - { name: "Box", min_x: 0.0, max_x: 10.0, min_y: 0.0, max_y: 10.0 }
"#;
        let tables = StaticTables::from_yaml_str(yaml).unwrap();
        assert!(tables.zones.zones_for("DE_Custom").is_some());
        assert!(tables.zones.zones_for("de_custom").is_some());
        assert_eq!(tables.zones.maps().collect::<Vec<_>>(), vec!["de_custom"]);
    }
}
