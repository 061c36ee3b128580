//! Registration data and the per-school roster built from it.
//!
//! Records come from the JSON data file (see [`load_records`]); the roster
//! groups them by school in codepoint order (see [`group_records`]).

mod group;
mod loader;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use group::group_records;
pub use loader::{load_records, parse_records, RecordSchema};

/// One registration entry as it appears in the data file.
///
/// `companions[i]` is paired with `verification_codes[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// School name.
    #[serde(rename = "sekolah")]
    pub school: String,

    /// File name of the school's PDF, relative to the download directory.
    pub pdf_file: String,

    /// Companion names, in source order.
    #[serde(rename = "pendamping")]
    pub companions: Vec<String>,

    /// Verification codes, positionally paired with `companions`.
    pub verification_codes: Vec<String>,
}

impl RegistrationRecord {
    /// Create a record from its parts.
    #[must_use]
    pub fn new(
        school: impl Into<String>,
        pdf_file: impl Into<String>,
        companions: Vec<String>,
        verification_codes: Vec<String>,
    ) -> Self {
        Self {
            school: school.into(),
            pdf_file: pdf_file.into(),
            companions,
            verification_codes,
        }
    }

    /// Iterate over the (name, code) pairs of this record.
    ///
    /// Extra entries in the longer list are skipped; the loader rejects
    /// records where the lengths differ.
    pub fn pairs(&self) -> impl Iterator<Item = Companion> + '_ {
        self.companions
            .iter()
            .zip(&self.verification_codes)
            .map(|(name, code)| Companion::new(name.clone(), code.clone()))
    }
}

/// A companion and the code that unlocks their school's PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Companion {
    /// Companion name.
    pub name: String,
    /// Verification code.
    pub code: String,
}

impl Companion {
    /// Create a companion entry.
    #[must_use]
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

/// All companions registered under one school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolGroup {
    /// The school's PDF file name.
    pub pdf_file: String,
    /// Companions in source order, across all records for the school.
    pub companions: Vec<Companion>,
}

/// Schools keyed by name, iterated in ascending codepoint order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    groups: BTreeMap<String, SchoolGroup>,
}

impl Roster {
    /// Number of distinct schools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the roster has no schools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Look up a school by exact name.
    #[must_use]
    pub fn get(&self, school: &str) -> Option<&SchoolGroup> {
        self.groups.get(school)
    }

    /// Iterate over schools in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchoolGroup)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    /// Total number of companions across all schools.
    #[must_use]
    pub fn companion_count(&self) -> usize {
        self.groups.values().map(|g| g.companions.len()).sum()
    }

    pub(crate) fn groups_mut(&mut self) -> &mut BTreeMap<String, SchoolGroup> {
        &mut self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserialize_field_names() {
        let json = r#"{
            "sekolah": "SMA Negeri 1",
            "pdf_file": "sman1.pdf",
            "pendamping": ["Budi", "Sari"],
            "verification_codes": ["1234", "5678"]
        }"#;
        let record: RegistrationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.school, "SMA Negeri 1");
        assert_eq!(record.pdf_file, "sman1.pdf");
        assert_eq!(record.companions, vec!["Budi", "Sari"]);
        assert_eq!(record.verification_codes, vec!["1234", "5678"]);
    }

    #[test]
    fn test_record_ignores_unknown_fields() {
        let json = r#"{
            "sekolah": "SMP 2",
            "pdf_file": "smp2.pdf",
            "pendamping": [],
            "verification_codes": [],
            "kota": "Bandung"
        }"#;
        let record: RegistrationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.school, "SMP 2");
    }

    #[test]
    fn test_record_pairs() {
        let record = RegistrationRecord::new(
            "SD 3",
            "sd3.pdf",
            vec!["Ani".to_string(), "Dedi".to_string()],
            vec!["1111".to_string(), "2222".to_string()],
        );
        let pairs: Vec<Companion> = record.pairs().collect();
        assert_eq!(
            pairs,
            vec![Companion::new("Ani", "1111"), Companion::new("Dedi", "2222")]
        );
    }

    #[test]
    fn test_empty_roster() {
        let roster = Roster::default();
        assert!(roster.is_empty());
        assert_eq!(roster.len(), 0);
        assert_eq!(roster.companion_count(), 0);
        assert!(roster.get("anything").is_none());
    }

    #[test]
    fn test_roster_serializes_as_map() {
        let roster = group_records(vec![RegistrationRecord::new(
            "SD 3",
            "sd3.pdf",
            vec!["Ani".to_string()],
            vec!["1111".to_string()],
        )]);
        let json = serde_json::to_value(&roster).unwrap();
        assert_eq!(json["SD 3"]["pdf_file"], "sd3.pdf");
        assert_eq!(json["SD 3"]["companions"][0]["name"], "Ani");
    }
}
