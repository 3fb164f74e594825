use crate::compiler::validation::{clean_email, is_generic_email};
use crate::types::Contact;

/// Points for each completeness signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWeights {
    pub valid_email: u8,
    pub full_name: u8,
    pub partial_name: u8,
    pub title: u8,
    pub phone: u8,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            valid_email: 20,
            full_name: 30,
            partial_name: 15,
            title: 20,
            phone: 20,
        }
    }
}

/// Completeness-derived confidence, capped at 100
pub fn confidence(contact: &Contact, weights: &ScoreWeights) -> u8 {
    let mut score: u32 = 0;

    let valid_email = contact
        .email
        .as_deref()
        .and_then(clean_email)
        .is_some_and(|email| !is_generic_email(&email));
    if valid_email {
        score += u32::from(weights.valid_email);
    }

    let first = !contact.first_name.trim().is_empty();
    let last = !contact.last_name.trim().is_empty();
    score += u32::from(match (first, last) {
        (true, true) => weights.full_name,
        (true, false) | (false, true) => weights.partial_name,
        (false, false) => 0,
    });

    if !contact.title.trim().is_empty() {
        score += u32::from(weights.title);
    }
    if contact.has_phone() {
        score += u32::from(weights.phone);
    }

    score.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> Contact {
        Contact {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            title: "Principal".to_string(),
            email: Some("jdoe@grace.org".to_string()),
            phone: Some("(302) 555-0100".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_contact_scores_ninety() {
        assert_eq!(confidence(&jane(), &ScoreWeights::default()), 90);
    }

    #[test]
    fn test_generic_email_earns_nothing() {
        let mut contact = jane();
        contact.email = Some("office@grace.org".to_string());
        assert_eq!(confidence(&contact, &ScoreWeights::default()), 70);
    }

    #[test]
    fn test_more_fields_never_score_lower() {
        let weights = ScoreWeights::default();
        let full = jane();
        let variants = [
            Contact { email: None, ..jane() },
            Contact { phone: None, ..jane() },
            Contact { title: String::new(), ..jane() },
            Contact { last_name: String::new(), ..jane() },
            Contact { first_name: String::new(), last_name: String::new(), ..jane() },
        ];
        for fewer in variants {
            assert!(confidence(&full, &weights) >= confidence(&fewer, &weights));
        }
    }

    #[test]
    fn test_capped_at_one_hundred() {
        let weights = ScoreWeights {
            valid_email: 60,
            full_name: 60,
            ..ScoreWeights::default()
        };
        assert_eq!(confidence(&jane(), &weights), 100);
    }
}
