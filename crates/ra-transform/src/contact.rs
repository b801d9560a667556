//! Contact flattening.
//!
//! Backends store a single contact. The first contact typed `technical`
//! wins; without one, the first contact in the list is used.

use ra_model::Contact;

/// Selects the contact a backend stores.
#[must_use]
pub fn select_contact(contacts: &[Contact]) -> Option<&Contact> {
    contacts
        .iter()
        .find(|c| c.is_technical())
        .or_else(|| contacts.first())
}

/// Returns the email of the selected contact, if any.
#[must_use]
pub fn contact_email(contacts: &[Contact]) -> Option<&str> {
    select_contact(contacts)
        .map(|c| c.email.as_str())
        .filter(|email| !email.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn technical_contact_wins_regardless_of_position() {
        let contacts = vec![
            Contact::new("email2", "security"),
            Contact::new("email1", "technical"),
        ];
        assert_eq!(contact_email(&contacts), Some("email1"));
    }

    #[test]
    fn falls_back_to_first_contact() {
        let contacts = vec![
            Contact {
                name: Some("name1".into()),
                email: "email1".into(),
                contact_type: None,
            },
            Contact::new("email2", "admin"),
        ];
        assert_eq!(contact_email(&contacts), Some("email1"));
        assert_eq!(contact_email(&[]), None);
    }
}
