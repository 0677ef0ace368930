//! Chemical toxicity reference table
//!
//! ## Table of Contents
//! - **ToxicityEntry**: Weight and hazard flags for one chemical
//! - **ToxicityTable**: Total lookup with canonicalization and aliases
//!
//! Weights follow EPA IRIS / IARC classifications and bioaccumulation
//! potential, on a 0-100 scale. Lookup never fails: names that match no
//! entry resolve to a conservative default weighted at the table median,
//! so unknown but present chemicals are not silently underweighted.

use std::collections::HashMap;

/// Toxicity weight and hazard flags for one chemical
#[derive(Debug, Clone, PartialEq)]
pub struct ToxicityEntry {
    /// Canonical chemical name
    pub chemical_name: String,
    /// Toxicity weight in [0, 100]
    pub toxicity_weight: f64,
    /// Known or probable carcinogen
    pub is_carcinogen: bool,
    /// Bioaccumulating heavy metal
    pub is_heavy_metal: bool,
}

impl ToxicityEntry {
    /// Create an entry with both hazard flags unset
    pub fn new(chemical_name: impl Into<String>, toxicity_weight: f64) -> Self {
        Self {
            chemical_name: chemical_name.into(),
            toxicity_weight: toxicity_weight.clamp(0.0, 100.0),
            is_carcinogen: false,
            is_heavy_metal: false,
        }
    }

    /// Mark the chemical as a carcinogen
    pub fn with_carcinogen(mut self) -> Self {
        self.is_carcinogen = true;
        self
    }

    /// Mark the chemical as a heavy metal
    pub fn with_heavy_metal(mut self) -> Self {
        self.is_heavy_metal = true;
        self
    }
}

/// Static toxicity reference table, loaded once and immutable
///
/// Resolution order: exact canonical match, alias match, substring match
/// against known names, then the median-weighted default.
#[derive(Debug, Clone)]
pub struct ToxicityTable {
    entries: HashMap<String, ToxicityEntry>,
    aliases: HashMap<String, String>,
    // (key, entry key) pairs eligible for the substring pass, longest first
    substring_keys: Vec<(String, String)>,
    default_entry: ToxicityEntry,
}

/// Canonicalize a chemical name: trim, lowercase, strip parenthetical
/// qualifiers, collapse whitespace
pub fn canonicalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c.to_ascii_lowercase()),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Substring matching below this length is too ambiguous ("co" is inside
// "compounds"); short names still resolve via exact or alias match.
const MIN_SUBSTRING_KEY: usize = 4;

impl ToxicityTable {
    /// Build the built-in reference table
    pub fn builtin() -> Self {
        Self::from_entries(builtin_entries(), builtin_aliases())
    }

    /// Build a table from explicit entries and an alias list
    ///
    /// Aliases map an alternative name to the canonical name of an entry.
    /// The default weight is the median of the entry weights.
    pub fn from_entries(entries: Vec<ToxicityEntry>, aliases: Vec<(&str, &str)>) -> Self {
        let mut map = HashMap::new();
        for mut entry in entries {
            let key = canonicalize(&entry.chemical_name);
            entry.chemical_name = key.clone();
            map.insert(key, entry);
        }

        let mut alias_map = HashMap::new();
        for (alias, target) in aliases {
            let target_key = canonicalize(target);
            // An alias pointing at no entry is dropped rather than trusted.
            if map.contains_key(&target_key) {
                alias_map.insert(canonicalize(alias), target_key);
            }
        }

        let mut substring_keys: Vec<(String, String)> = map
            .keys()
            .map(|k| (k.clone(), k.clone()))
            .chain(alias_map.iter().map(|(a, t)| (a.clone(), t.clone())))
            .filter(|(k, _)| k.len() >= MIN_SUBSTRING_KEY)
            .collect();
        substring_keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));

        let mut weights: Vec<f64> = map.values().map(|e| e.toxicity_weight).collect();
        weights.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let default_weight = if weights.is_empty() {
            50.0
        } else if weights.len() % 2 == 1 {
            weights[weights.len() / 2]
        } else {
            (weights[weights.len() / 2 - 1] + weights[weights.len() / 2]) / 2.0
        };

        Self {
            entries: map,
            aliases: alias_map,
            substring_keys,
            default_entry: ToxicityEntry::new("unclassified", default_weight),
        }
    }

    /// Look up a chemical by its reported name; total, never errors
    pub fn lookup(&self, name: &str) -> &ToxicityEntry {
        let canonical = canonicalize(name);
        if let Some(entry) = self.entries.get(&canonical) {
            return entry;
        }
        if let Some(target) = self.aliases.get(&canonical) {
            return &self.entries[target];
        }
        for (key, target) in &self.substring_keys {
            if canonical.contains(key.as_str()) {
                return &self.entries[target];
            }
        }
        &self.default_entry
    }

    /// The conservative default entry used for unmatched names
    pub fn default_entry(&self) -> &ToxicityEntry {
        &self.default_entry
    }

    /// Number of canonical entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ToxicityTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_entries() -> Vec<ToxicityEntry> {
    vec![
        // Extreme neurotoxins and carcinogens
        ToxicityEntry::new("mercury", 100.0).with_carcinogen().with_heavy_metal(),
        ToxicityEntry::new("lead", 95.0).with_carcinogen().with_heavy_metal(),
        ToxicityEntry::new("arsenic", 95.0).with_carcinogen().with_heavy_metal(),
        ToxicityEntry::new("formaldehyde", 92.0).with_carcinogen(),
        ToxicityEntry::new("hexavalent chromium", 90.0).with_carcinogen().with_heavy_metal(),
        ToxicityEntry::new("dioxins", 90.0).with_carcinogen(),
        ToxicityEntry::new("benzene", 88.0).with_carcinogen(),
        ToxicityEntry::new("cadmium", 87.0).with_carcinogen().with_heavy_metal(),
        // PAHs and persistent organics
        ToxicityEntry::new("benzo(a)pyrene", 85.0).with_carcinogen(),
        ToxicityEntry::new("pcbs", 85.0).with_carcinogen(),
        ToxicityEntry::new("polycyclic aromatic hydrocarbons", 83.0).with_carcinogen(),
        // Chlorinated solvents
        ToxicityEntry::new("tetrachloroethylene", 82.0).with_carcinogen(),
        ToxicityEntry::new("trichloroethylene", 80.0).with_carcinogen(),
        ToxicityEntry::new("dichloromethane", 78.0),
        ToxicityEntry::new("nickel", 75.0),
        // Respiratory and systemic toxins
        ToxicityEntry::new("pm2.5", 74.0),
        ToxicityEntry::new("styrene", 72.0),
        ToxicityEntry::new("particulate matter", 70.0),
        ToxicityEntry::new("nitrogen oxides", 68.0),
        ToxicityEntry::new("pm10", 66.0),
        ToxicityEntry::new("sulfur dioxide", 65.0),
        ToxicityEntry::new("ammonia", 62.0),
        // VOCs and organic compounds
        ToxicityEntry::new("toluene", 60.0),
        ToxicityEntry::new("volatile organic compounds", 58.0),
        ToxicityEntry::new("xylene", 58.0),
        ToxicityEntry::new("ethylbenzene", 56.0),
        ToxicityEntry::new("hydrogen chloride", 55.0),
        ToxicityEntry::new("carbon monoxide", 52.0),
        ToxicityEntry::new("methanol", 50.0),
        ToxicityEntry::new("acetone", 45.0),
    ]
}

fn builtin_aliases() -> Vec<(&'static str, &'static str)> {
    vec![
        // "Chromium (VI)" canonicalizes to "chromium"
        ("chromium", "hexavalent chromium"),
        ("perchloroethylene", "tetrachloroethylene"),
        ("methylene chloride", "dichloromethane"),
        ("pahs", "polycyclic aromatic hydrocarbons"),
        ("nox", "nitrogen oxides"),
        ("so2", "sulfur dioxide"),
        ("sulphur dioxide", "sulfur dioxide"),
        ("vocs", "volatile organic compounds"),
        ("voc", "volatile organic compounds"),
        ("hcl", "hydrogen chloride"),
        ("co", "carbon monoxide"),
        ("pm 2.5", "pm2.5"),
        ("fine particulate matter", "pm2.5"),
        ("pm 10", "pm10"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("  Mercury  "), "mercury");
        assert_eq!(canonicalize("Chromium (VI)"), "chromium");
        assert_eq!(canonicalize("Benzo(a)Pyrene"), "benzopyrene");
        assert_eq!(canonicalize("Volatile   Organic\tCompounds"), "volatile organic compounds");
    }

    #[test]
    fn test_exact_lookup() {
        let table = ToxicityTable::builtin();
        let entry = table.lookup("Mercury");
        assert_eq!(entry.toxicity_weight, 100.0);
        assert!(entry.is_carcinogen);
        assert!(entry.is_heavy_metal);
    }

    #[test]
    fn test_alias_lookup() {
        let table = ToxicityTable::builtin();
        let hex = table.lookup("Hexavalent Chromium");
        let roman = table.lookup("Chromium (VI)");
        assert_eq!(hex.chemical_name, roman.chemical_name);
        assert_eq!(roman.toxicity_weight, 90.0);
        assert!(roman.is_heavy_metal);

        assert_eq!(table.lookup("Sulphur Dioxide").toxicity_weight, 65.0);
        assert_eq!(table.lookup("Perchloroethylene").toxicity_weight, 82.0);
    }

    #[test]
    fn test_substring_lookup() {
        let table = ToxicityTable::builtin();
        assert_eq!(table.lookup("Lead compounds").toxicity_weight, 95.0);
        assert_eq!(table.lookup("Mercury and its compounds").toxicity_weight, 100.0);
    }

    #[test]
    fn test_short_names_never_substring_match() {
        let table = ToxicityTable::builtin();
        // "co" resolves carbon monoxide only on exact match; "cobalt" must not.
        assert_eq!(table.lookup("CO").toxicity_weight, 52.0);
        assert_eq!(
            table.lookup("Cobalt").toxicity_weight,
            table.default_entry().toxicity_weight
        );
    }

    #[test]
    fn test_unknown_gets_median_default() {
        let table = ToxicityTable::builtin();
        let entry = table.lookup("XYZ-123");
        assert_eq!(entry.toxicity_weight, table.default_entry().toxicity_weight);
        assert!(entry.toxicity_weight > 0.0);
        assert!(!entry.is_carcinogen);
        assert!(!entry.is_heavy_metal);
    }

    #[test]
    fn test_median_default_from_entries() {
        let table = ToxicityTable::from_entries(
            vec![
                ToxicityEntry::new("a", 10.0),
                ToxicityEntry::new("b", 20.0),
                ToxicityEntry::new("c", 90.0),
            ],
            vec![],
        );
        assert_eq!(table.default_entry().toxicity_weight, 20.0);
    }
}
