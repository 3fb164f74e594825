use std::collections::HashSet;

use crate::types::Contact;

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Deduplicate scored contacts and order them by confidence, highest first.
///
/// Records are first grouped by normalized first name, last name and
/// organization, keeping the highest-confidence record of each group. A
/// second pass drops repeated email addresses among the records that have
/// one. Ties keep the earlier record.
pub fn dedup_contacts(mut contacts: Vec<Contact>) -> Vec<Contact> {
    // Stable sort: equal scores keep their input order
    contacts.sort_by(|a, b| b.confidence.cmp(&a.confidence));

    let mut people = HashSet::new();
    let mut emails = HashSet::new();
    contacts
        .into_iter()
        .filter(|c| {
            people.insert((
                normalize(&c.first_name),
                normalize(&c.last_name),
                normalize(&c.organization),
            ))
        })
        .filter(|c| match c.email.as_deref().map(normalize).filter(|e| !e.is_empty()) {
            Some(email) => emails.insert(email),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(first: &str, last: &str, org: &str, email: Option<&str>, confidence: u8) -> Contact {
        Contact {
            first_name: first.to_string(),
            last_name: last.to_string(),
            organization: org.to_string(),
            email: email.map(str::to_string),
            confidence,
            ..Default::default()
        }
    }

    #[test]
    fn test_same_person_keeps_highest_confidence() {
        let kept = dedup_contacts(vec![
            contact("Jane", "Doe", "Example School", None, 50),
            contact("Jane", "Doe", "Example School", Some("jdoe@example.org"), 70),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].email.as_deref(), Some("jdoe@example.org"));
    }

    #[test]
    fn test_normalized_keys_and_email_pass() {
        let kept = dedup_contacts(vec![
            contact("JANE ", "doe", "example school", None, 50),
            contact("Jane", "Doe", "Example School", None, 50),
            contact("J.", "Doe", "Example School", Some("jdoe@example.org"), 70),
            contact("Janet", "Doe", "Example School", Some("JDOE@example.org"), 70),
            contact("Jane", "Doe", "Other School", None, 30),
        ]);

        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].first_name, "J.");
        assert_eq!(kept[1].first_name, "JANE ");
        assert_eq!(kept[2].organization, "Other School");
        assert!(kept.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }
}
