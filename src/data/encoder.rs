// ============================================================
// Layer 4 — Categorical Encoder
// ============================================================
// Turns the raw string answers of the survey into numbers.
//
// Three different rules apply:
//
//   Age     → linear rescale (age - 18) / 82, roughly [0, 1]
//   Gender  → fixed 3-way classifier over a static alias list
//   others  → growable per-feature mapping, first-seen order
//
// The growable mapping is NOT sorted: ids depend on the row
// order of the source file. Previously trained artifacts were
// encoded this way, so changing it would silently change the
// model's input encoding.
//
// The encoder is an explicit value passed by `&mut`, never
// global state, so every run (and every test) starts fresh.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Substituted for missing or empty cells before lookup
pub const MISSING_VALUE: &str = "NA";

/// Inclusive valid age range
pub const MIN_AGE: i64 = 18;
pub const MAX_AGE: i64 = 100;

/// Gender codes fed to the model
pub const GENDER_MALE:  f32 = 0.0;
pub const GENDER_FEMALE: f32 = 1.0;
pub const GENDER_OTHER: f32 = 2.0;

// Free-text survey answers, compared after trim + lower-case
const MALE_ALIASES: &[&str] = &[
    "male", "m", "man", "cis male", "cis man", "male (cis)", "make", "mal",
    "malr", "msle", "mail", "maile", "male.", "guy (-ish) ^_^",
];

const FEMALE_ALIASES: &[&str] = &[
    "female", "f", "woman", "cis female", "cis woman", "female (cis)",
    "femake", "femail", "female.", "cis-female/femme",
];

// ─── Age ──────────────────────────────────────────────────────────────────────
/// Parse an age cell. Returns `None` for non-integers and for
/// values outside `[MIN_AGE, MAX_AGE]`; such rows are dropped.
pub fn parse_age(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|age| (MIN_AGE..=MAX_AGE).contains(age))
}

/// Rescale a valid age to `(age - 18) / 82`
pub fn normalize_age(age: i64) -> f32 {
    (age - MIN_AGE) as f32 / (MAX_AGE - MIN_AGE) as f32
}

// ─── Gender ───────────────────────────────────────────────────────────────────
/// Map a free-text gender answer to 0 (male), 1 (female) or 2 (other/absent)
pub fn gender_code(raw: Option<&str>) -> f32 {
    let Some(raw) = raw else {
        return GENDER_OTHER;
    };
    let normalized = raw.trim().to_lowercase();
    if MALE_ALIASES.contains(&normalized.as_str()) {
        GENDER_MALE
    } else if FEMALE_ALIASES.contains(&normalized.as_str()) {
        GENDER_FEMALE
    } else {
        GENDER_OTHER
    }
}

// ─── CategoricalMapping ──────────────────────────────────────────────────────
/// Raw value → id for one feature, ids in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoricalMapping {
    ids:    HashMap<String, u32>,
    values: Vec<String>,
}

impl CategoricalMapping {
    /// Id of `value`, assigning the next id if it is new
    pub fn encode(&mut self, value: &str) -> u32 {
        if let Some(&id) = self.ids.get(value) {
            return id;
        }
        let id = self.values.len() as u32;
        self.ids.insert(value.to_string(), id);
        self.values.push(value.to_string());
        id
    }

    /// Lookup without growing the mapping
    pub fn get(&self, value: &str) -> Option<u32> {
        self.ids.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in id order
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl Serialize for CategoricalMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (id, value) in self.values.iter().enumerate() {
            map.serialize_entry(value, &id)?;
        }
        map.end()
    }
}

// ─── CategoricalEncoder ──────────────────────────────────────────────────────
/// One `CategoricalMapping` per feature, created on first use.
///
/// Serialises as `{feature: {value: id}}` with features in the
/// order they were first encoded and values in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoricalEncoder {
    index:    HashMap<String, usize>,
    mappings: Vec<(String, CategoricalMapping)>,
}

impl CategoricalEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode one raw cell of `feature`.
    /// `None` and empty strings are encoded as `"NA"`.
    pub fn encode(&mut self, feature: &str, raw: Option<&str>) -> u32 {
        let value = match raw {
            Some(v) if !v.is_empty() => v,
            _ => MISSING_VALUE,
        };
        self.mapping_mut(feature).encode(value)
    }

    pub fn mapping(&self, feature: &str) -> Option<&CategoricalMapping> {
        self.index.get(feature).map(|&i| &self.mappings[i].1)
    }

    fn mapping_mut(&mut self, feature: &str) -> &mut CategoricalMapping {
        let slot = match self.index.get(feature) {
            Some(&i) => i,
            None => {
                self.mappings.push((feature.to_string(), CategoricalMapping::default()));
                let i = self.mappings.len() - 1;
                self.index.insert(feature.to_string(), i);
                i
            }
        };
        &mut self.mappings[slot].1
    }
}

impl Serialize for CategoricalEncoder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.mappings.len()))?;
        for (feature, mapping) in &self.mappings {
            map.serialize_entry(feature, mapping)?;
        }
        map.end()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("18", Some(18))]
    #[case("100", Some(100))]
    #[case(" 42 ", Some(42))]
    #[case("17", None)]
    #[case("101", None)]
    #[case("-1726", None)]
    #[case("99999999999", None)]
    #[case("forty", None)]
    #[case("32.5", None)]
    #[case("", None)]
    fn test_parse_age(#[case] raw: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_age(raw), expected);
    }

    #[test]
    fn test_normalize_age_bounds() {
        assert_eq!(normalize_age(18), 0.0);
        assert_eq!(normalize_age(100), 1.0);
        assert!((normalize_age(59) - 0.5).abs() < 1e-6);
    }

    #[rstest]
    #[case(Some("Male"), GENDER_MALE)]
    #[case(Some("m "), GENDER_MALE)]
    #[case(Some("Cis Man"), GENDER_MALE)]
    #[case(Some("Female"), GENDER_FEMALE)]
    #[case(Some("F"), GENDER_FEMALE)]
    #[case(Some(" woman"), GENDER_FEMALE)]
    #[case(Some(""), GENDER_OTHER)]
    #[case(Some("nonbinary"), GENDER_OTHER)]
    #[case(None, GENDER_OTHER)]
    fn test_gender_code(#[case] raw: Option<&str>, #[case] expected: f32) {
        assert_eq!(gender_code(raw), expected);
    }

    #[test]
    fn test_first_seen_ids() {
        let mut enc = CategoricalEncoder::new();
        assert_eq!(enc.encode("benefits", Some("Yes")), 0);
        assert_eq!(enc.encode("benefits", Some("No")), 1);
        assert_eq!(enc.encode("benefits", Some("Yes")), 0);
        assert_eq!(enc.encode("benefits", Some("Don't know")), 2);
        // each feature has its own counter
        assert_eq!(enc.encode("leave", Some("Yes")), 0);
    }

    #[test]
    fn test_encoding_is_order_dependent() {
        let mut first = CategoricalEncoder::new();
        for v in ["A", "B", "A"] {
            first.encode("f", Some(v));
        }
        let mut second = CategoricalEncoder::new();
        for v in ["B", "A", "A"] {
            second.encode("f", Some(v));
        }
        assert_eq!(first.mapping("f").unwrap().get("A"), Some(0));
        assert_eq!(second.mapping("f").unwrap().get("A"), Some(1));
        assert_ne!(first, second);
    }

    #[test]
    fn test_missing_values_become_na() {
        let mut enc = CategoricalEncoder::new();
        let a = enc.encode("work_interfere", None);
        let b = enc.encode("work_interfere", Some(""));
        let c = enc.encode("work_interfere", Some("NA"));
        assert_eq!((a, b, c), (0, 0, 0));
        assert_eq!(enc.mapping("work_interfere").unwrap().values(), ["NA"]);
    }

    #[test]
    fn test_serialises_in_first_seen_order() {
        let mut enc = CategoricalEncoder::new();
        enc.encode("self_employed", Some("No"));
        enc.encode("family_history", Some("Yes"));
        enc.encode("self_employed", Some("Yes"));
        enc.encode("family_history", Some("No"));
        let json = serde_json::to_string(&enc).unwrap();
        assert_eq!(
            json,
            r#"{"self_employed":{"No":0,"Yes":1},"family_history":{"Yes":0,"No":1}}"#
        );
    }
}
