//! # Compiler Module
//!
//! Turns the raw extracted contact set into the final artifacts: cleaned
//! fields, a completeness-derived confidence score, deduplication, CSV files
//! and a quality report.

mod config;
mod dedup;
mod error;
mod output;
mod score;
mod validation;

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, instrument};

pub use config::{CompilerConfig, CompilerConfigBuilder};
pub use dedup::dedup_contacts;
pub use error::CompileError;
pub use output::{CONTACT_COLUMNS, OutputPaths, quality_report, write_contacts_csv, write_outputs};
pub use score::{ScoreWeights, confidence};
pub use validation::{
    GENERIC_LOCAL_PARTS, GENERIC_NAME_TEXT, NAME_PREFIXES, PLACEHOLDER_NAMES, clean_email, format_phone,
    is_generic_email, is_placeholder_name, is_valid_name, split_name,
};

use crate::types::Contact;

/// What compilation removed and why
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileStats {
    /// Contacts received
    pub input: usize,
    /// Emails that failed cleaning and were dropped from their contact
    pub emails_cleared: usize,
    /// Contacts rejected for a shared-mailbox email
    pub generic_emails: usize,
    /// Contacts rejected for a placeholder or non-person name
    pub invalid_names: usize,
    /// Contacts removed as duplicates
    pub duplicates: usize,
    /// Contacts in the final set
    pub output: usize,
}

/// Compiled contacts, highest confidence first
#[derive(Debug, Clone, Default)]
pub struct Compiled {
    pub contacts: Vec<Contact>,
    pub stats: CompileStats,
}

/// Validates, scores and deduplicates extracted contacts
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Clean one contact, or `None` when it must be rejected
    fn clean(&self, mut contact: Contact, stats: &mut CompileStats) -> Option<Contact> {
        let raw_email = contact.email.take().filter(|e| !e.trim().is_empty());
        if let Some(raw) = raw_email {
            match clean_email(&raw) {
                Some(email) if self.config.reject_generic_emails && is_generic_email(&email) => {
                    debug!(%email, "rejected shared mailbox");
                    stats.generic_emails += 1;
                    return None;
                }
                Some(email) => contact.email = Some(email),
                None => {
                    debug!(email = %raw, "cleared invalid email");
                    stats.emails_cleared += 1;
                }
            }
        }

        contact.first_name = contact.first_name.trim().to_string();
        contact.last_name = contact.last_name.trim().to_string();
        let name = contact.full_name();
        if !is_valid_name(&name) {
            stats.invalid_names += 1;
            return None;
        }
        if contact.email.is_none() && is_placeholder_name(&name) {
            debug!(%name, "rejected placeholder name without an address");
            stats.invalid_names += 1;
            return None;
        }

        contact.title = contact.title.trim().to_string();
        contact.phone = contact
            .phone
            .as_deref()
            .map(format_phone)
            .filter(|p| !p.is_empty());
        contact.confidence = confidence(&contact, &self.config.weights);
        Some(contact)
    }

    /// Clean, score and deduplicate `raw`
    #[instrument(skip_all, fields(input = raw.len()))]
    pub fn compile(&self, raw: Vec<Contact>) -> Compiled {
        let mut stats = CompileStats {
            input: raw.len(),
            ..Default::default()
        };

        let cleaned: Vec<Contact> = raw
            .into_iter()
            .filter_map(|contact| self.clean(contact, &mut stats))
            .collect();
        let before = cleaned.len();
        let contacts = dedup_contacts(cleaned);
        stats.duplicates = before - contacts.len();
        stats.output = contacts.len();

        info!(
            output = stats.output,
            duplicates = stats.duplicates,
            invalid_names = stats.invalid_names,
            generic_emails = stats.generic_emails,
            "compiled contacts"
        );
        Compiled { contacts, stats }
    }

    /// Write the final CSVs and the quality report into `dir`
    pub fn write(&self, dir: &Path, contacts: &[Contact]) -> Result<OutputPaths, CompileError> {
        let now = Local::now();
        write_outputs(
            &dir.join(&self.config.output_file_name),
            contacts,
            &now.format("%Y-%m-%d").to_string(),
            &now.format("%Y-%m-%d %H:%M:%S").to_string(),
        )
    }
}

/// Read contacts saved by [`write_raw_contacts`]
pub fn load_raw_contacts(path: &Path) -> Result<Vec<Contact>, CompileError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Save extracted contacts as pretty JSON
pub fn write_raw_contacts(path: &Path, contacts: &[Contact]) -> Result<(), CompileError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(contacts)?)?;
    Ok(())
}
