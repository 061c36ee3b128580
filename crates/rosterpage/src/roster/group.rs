use tracing::{debug, warn};

use super::{RegistrationRecord, Roster, SchoolGroup};

/// Group records by school name.
///
/// Companions are appended in source order and never deduplicated. When
/// several records share a school, the first record's PDF file is kept.
#[must_use]
pub fn group_records(records: impl IntoIterator<Item = RegistrationRecord>) -> Roster {
    let mut roster = Roster::default();
    let groups = roster.groups_mut();

    for record in records {
        let pairs: Vec<_> = record.pairs().collect();
        let group = groups
            .entry(record.school)
            .or_insert_with_key(|school| {
                debug!(school = %school, pdf = %record.pdf_file, "New school group");
                SchoolGroup {
                    pdf_file: record.pdf_file.clone(),
                    companions: Vec::new(),
                }
            });

        if group.pdf_file != record.pdf_file {
            warn!(
                kept = %group.pdf_file,
                ignored = %record.pdf_file,
                "School listed with a different PDF file; keeping the first"
            );
        }
        group.companions.extend(pairs);
    }

    debug!(
        schools = roster.len(),
        companions = roster.companion_count(),
        "Grouped records"
    );
    roster
}
