//! Final CSV artifacts and the quality report

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::compiler::error::CompileError;
use crate::types::Contact;

/// Column order of the final contacts artifact
pub const CONTACT_COLUMNS: [&str; 11] = [
    "School Name",
    "First Name",
    "Last Name",
    "Title",
    "Email",
    "Phone",
    "Source URL",
    "Confidence Score",
    "Date Collected",
    "Verified",
    "Notes",
];

#[derive(Serialize)]
struct ContactRow<'a> {
    school_name: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    title: &'a str,
    email: &'a str,
    phone: &'a str,
    source_url: &'a str,
    confidence: u8,
    date_collected: &'a str,
    verified: &'a str,
    notes: &'a str,
}

impl<'a> ContactRow<'a> {
    fn new(contact: &'a Contact, date_collected: &'a str) -> Self {
        Self {
            school_name: &contact.organization,
            first_name: &contact.first_name,
            last_name: &contact.last_name,
            title: &contact.title,
            email: contact.email.as_deref().unwrap_or(""),
            phone: contact.phone.as_deref().unwrap_or(""),
            source_url: &contact.source_url,
            confidence: contact.confidence,
            date_collected,
            verified: "",
            notes: "",
        }
    }
}

fn create_parent(path: &Path) -> Result<(), CompileError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write contacts as CSV; the header is written even with no rows
pub fn write_contacts_csv<'a>(
    path: &Path,
    contacts: impl IntoIterator<Item = &'a Contact>,
    date_collected: &str,
) -> Result<(), CompileError> {
    create_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(File::create(path)?);
    writer.write_record(CONTACT_COLUMNS)?;
    for contact in contacts {
        writer.serialize(ContactRow::new(contact, date_collected))?;
    }
    writer.flush()?;
    Ok(())
}

/// Paths of the files written for one compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub contacts: PathBuf,
    pub with_emails: PathBuf,
    pub no_emails: PathBuf,
    pub quality_report: PathBuf,
}

impl OutputPaths {
    /// Derive sibling artifact paths from the main CSV path
    pub fn for_csv(csv_path: &Path) -> Self {
        let stem = csv_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "contacts".to_string());
        let sibling = |suffix: &str| csv_path.with_file_name(format!("{stem}{suffix}"));
        Self {
            contacts: csv_path.to_path_buf(),
            with_emails: sibling("_with_emails.csv"),
            no_emails: sibling("_no_emails.csv"),
            quality_report: sibling("_quality_report.txt"),
        }
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Counts sorted by count descending, then key ascending
fn ranked<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    ranked
}

/// Plain-text quality report over compiled contacts
pub fn quality_report(contacts: &[Contact], generated: &str) -> String {
    let total = contacts.len();
    let rule = "-".repeat(70);
    let mut report = String::new();

    let _ = writeln!(report, "{}", "=".repeat(70));
    let _ = writeln!(report, "CONTACT DATA QUALITY REPORT");
    let _ = writeln!(report, "{}", "=".repeat(70));
    let _ = writeln!(report, "Generated: {generated}\n");

    let schools = ranked(contacts.iter().map(|c| c.organization.as_str()));
    let _ = writeln!(report, "Total Contacts: {total}");
    let _ = writeln!(report, "Unique Schools: {}\n", schools.len());

    let _ = writeln!(report, "DATA COMPLETENESS\n{rule}");
    let completeness = [
        ("First Name", contacts.iter().filter(|c| !c.first_name.trim().is_empty()).count()),
        ("Last Name", contacts.iter().filter(|c| !c.last_name.trim().is_empty()).count()),
        ("Phone", contacts.iter().filter(|c| c.has_phone()).count()),
        ("Email", contacts.iter().filter(|c| c.has_email()).count()),
    ];
    for (field, complete) in completeness {
        let _ = writeln!(
            report,
            "{field:15} {complete:5} / {total:5} ({:5.1}%)",
            percent(complete, total)
        );
    }

    let _ = writeln!(report, "\nCONFIDENCE DISTRIBUTION\n{rule}");
    for (low, high) in [(90u8, 100u8), (80, 89), (70, 79), (60, 69), (0, 59)] {
        let count = contacts
            .iter()
            .filter(|c| (low..=high).contains(&c.confidence))
            .count();
        let _ = writeln!(report, "{low:2}-{high:3}: {count:5} ({:5.1}%)", percent(count, total));
    }

    let _ = writeln!(report, "\nSCHOOLS BY CONTACT COUNT\n{rule}");
    for (school, count) in &schools {
        let _ = writeln!(report, "{:50} {count:3}", truncate(school, 50));
    }

    let _ = writeln!(report, "\nTITLE DISTRIBUTION\n{rule}");
    for (title, count) in ranked(contacts.iter().map(|c| c.title.as_str())) {
        let _ = writeln!(report, "{:50} {count:3}", truncate(title, 50));
    }

    report
}

fn truncate(text: &str, width: usize) -> &str {
    match text.char_indices().nth(width) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Write the main CSV, the email split files and the quality report
pub fn write_outputs(
    csv_path: &Path,
    contacts: &[Contact],
    date_collected: &str,
    generated: &str,
) -> Result<OutputPaths, CompileError> {
    let paths = OutputPaths::for_csv(csv_path);

    write_contacts_csv(&paths.contacts, contacts, date_collected)?;
    write_contacts_csv(
        &paths.with_emails,
        contacts.iter().filter(|c| c.has_email()),
        date_collected,
    )?;
    write_contacts_csv(
        &paths.no_emails,
        contacts.iter().filter(|c| !c.has_email()),
        date_collected,
    )?;

    create_parent(&paths.quality_report)?;
    fs::write(&paths.quality_report, quality_report(contacts, generated))?;

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(first: &str, org: &str, email: Option<&str>, confidence: u8) -> Contact {
        Contact {
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            title: "Principal".to_string(),
            email: email.map(str::to_string),
            organization: org.to_string(),
            source_url: "https://grace.org/staff".to_string(),
            confidence,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_csv_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("final.csv");
        write_contacts_csv(&path, &[], "2024-09-01").unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim_end(), CONTACT_COLUMNS.join(","));
    }

    #[test]
    fn test_write_outputs_splits_by_email() {
        let dir = tempfile::tempdir().unwrap();
        let contacts = vec![
            contact("Jane", "Grace Academy", Some("jdoe@grace.org"), 70),
            contact("John", "Grace Academy", None, 50),
            contact("Ann", "Hope School", None, 95),
        ];

        let paths = write_outputs(&dir.path().join("out").join("final.csv"), &contacts, "2024-09-01", "now").unwrap();
        assert_eq!(paths.with_emails, dir.path().join("out").join("final_with_emails.csv"));

        let main = fs::read_to_string(&paths.contacts).unwrap();
        let mut lines = main.lines();
        assert_eq!(lines.next().unwrap(), CONTACT_COLUMNS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "Grace Academy,Jane,Doe,Principal,jdoe@grace.org,,https://grace.org/staff,70,2024-09-01,,"
        );
        assert_eq!(main.lines().count(), 4);
        assert_eq!(fs::read_to_string(&paths.with_emails).unwrap().lines().count(), 2);
        assert_eq!(fs::read_to_string(&paths.no_emails).unwrap().lines().count(), 3);
        assert!(paths.quality_report.exists());
    }

    #[test]
    fn test_quality_report_sections() {
        let contacts = vec![
            contact("Jane", "Grace Academy", Some("jdoe@grace.org"), 70),
            contact("John", "Grace Academy", None, 50),
            contact("Ann", "Hope School", None, 95),
        ];
        let report = quality_report(&contacts, "2024-09-01 10:00:00");

        assert!(report.contains("Total Contacts: 3"));
        assert!(report.contains("Unique Schools: 2"));
        assert!(report.contains("90-100:     1 ( 33.3%)"));
        assert!(report.contains("Email               1 /     3 ( 33.3%)"));
        let grace = report.find("Grace Academy").unwrap();
        let hope = report.find("Hope School").unwrap();
        assert!(grace < hope);
    }

    #[test]
    fn test_empty_report() {
        let report = quality_report(&[], "now");
        assert!(report.contains("Total Contacts: 0"));
        assert!(report.contains(" 0- 59:     0 (  0.0%)"));
    }
}
