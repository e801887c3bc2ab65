//! Entry: one validated address-book record.
//!
//! An [`Entry`] only exists in validated form. Raw input lives in an
//! [`EntryDraft`] (from a CSV row, a database row, a JSON body, or an
//! [`EntryBuilder`]) and becomes an entry through `Entry::try_from`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::field::{EntryField, FieldUpdate};
use crate::validation::{
    normalize_optional, parse_birthdate, parse_postal_code, validate_email, validate_required,
};

/// A validated contact.
///
/// Field order is significant: the derived ordering compares fields in
/// declaration order, which is the display sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "EntryDraft")]
pub struct Entry {
    firstname: String,
    lastname: String,
    street: Option<String>,
    number: Option<String>,
    postal_code: Option<u32>,
    place: Option<String>,
    birthdate: Option<NaiveDate>,
    phone: Option<String>,
    email: Option<String>,
}

/// Unvalidated entry input. All optional fields are raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryDraft {
    pub firstname: String,
    pub lastname: String,
    pub street: Option<String>,
    pub number: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub postal_code: Option<String>,
    pub place: Option<String>,
    pub birthdate: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl EntryDraft {
    /// Set a field from raw text. An empty value clears optional fields.
    pub fn set(&mut self, field: EntryField, value: impl Into<String>) {
        let value = value.into();
        match field {
            EntryField::Firstname => self.firstname = value,
            EntryField::Lastname => self.lastname = value,
            EntryField::Street => self.street = Some(value),
            EntryField::Number => self.number = Some(value),
            EntryField::PostalCode => self.postal_code = Some(value),
            EntryField::Place => self.place = Some(value),
            EntryField::Birthdate => self.birthdate = Some(value),
            EntryField::Phone => self.phone = Some(value),
            EntryField::Email => self.email = Some(value),
        }
    }
}

// JSON clients send postal codes as numbers or strings.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(u64),
    }

    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|v| match v {
            TextOrNumber::Text(s) => s,
            TextOrNumber::Number(n) => n.to_string(),
        }),
    )
}

impl TryFrom<EntryDraft> for Entry {
    type Error = ValidationError;

    fn try_from(draft: EntryDraft) -> Result<Self, Self::Error> {
        let firstname = validate_required(EntryField::Firstname, draft.firstname)?;
        let lastname = validate_required(EntryField::Lastname, draft.lastname)?;

        let postal_code = normalize_optional(draft.postal_code)
            .map(|v| parse_postal_code(&v))
            .transpose()?;
        let birthdate = normalize_optional(draft.birthdate)
            .map(|v| parse_birthdate(&v))
            .transpose()?;
        let email = normalize_optional(draft.email.map(|v| v.trim().to_string()))
            .map(|v| validate_email(&v))
            .transpose()?;

        Ok(Entry {
            firstname,
            lastname,
            street: normalize_optional(draft.street),
            number: normalize_optional(draft.number),
            postal_code,
            place: normalize_optional(draft.place),
            birthdate,
            phone: normalize_optional(draft.phone),
            email,
        })
    }
}

impl Entry {
    /// Start building an entry from the two required names.
    pub fn builder(firstname: impl Into<String>, lastname: impl Into<String>) -> EntryBuilder {
        EntryBuilder::new(firstname, lastname)
    }

    pub fn firstname(&self) -> &str {
        &self.firstname
    }

    pub fn lastname(&self) -> &str {
        &self.lastname
    }

    pub fn street(&self) -> Option<&str> {
        self.street.as_deref()
    }

    pub fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }

    pub fn postal_code(&self) -> Option<u32> {
        self.postal_code
    }

    pub fn place(&self) -> Option<&str> {
        self.place.as_deref()
    }

    pub fn birthdate(&self) -> Option<NaiveDate> {
        self.birthdate
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Render a field as text, as stored in CSV and SQL columns.
    ///
    /// Returns `None` for absent optional fields.
    pub fn field_text(&self, field: EntryField) -> Option<String> {
        match field {
            EntryField::Firstname => Some(self.firstname.clone()),
            EntryField::Lastname => Some(self.lastname.clone()),
            EntryField::Street => self.street.clone(),
            EntryField::Number => self.number.clone(),
            EntryField::PostalCode => self.postal_code.map(|c| c.to_string()),
            EntryField::Place => self.place.clone(),
            EntryField::Birthdate => self.birthdate.map(|d| d.format("%Y-%m-%d").to_string()),
            EntryField::Phone => self.phone.clone(),
            EntryField::Email => self.email.clone(),
        }
    }

    /// Convert back to raw input.
    pub fn to_draft(&self) -> EntryDraft {
        EntryDraft {
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
            street: self.field_text(EntryField::Street),
            number: self.field_text(EntryField::Number),
            postal_code: self.field_text(EntryField::PostalCode),
            place: self.field_text(EntryField::Place),
            birthdate: self.field_text(EntryField::Birthdate),
            phone: self.field_text(EntryField::Phone),
            email: self.field_text(EntryField::Email),
        }
    }

    /// Apply field updates, re-validating the result.
    ///
    /// All-or-nothing: if any new value is invalid, `self` is untouched and
    /// the error names the first failing field.
    pub fn with_updates(&self, updates: &[FieldUpdate]) -> Result<Entry, ValidationError> {
        let mut draft = self.to_draft();
        for update in updates {
            draft.set(update.field, update.value.clone());
        }
        Entry::try_from(draft)
    }

    /// Whether this entry and `other` count as the same contact.
    ///
    /// Firstname, lastname and email must match exactly. Two entries without
    /// an email match on names alone.
    pub fn same_identity_as(&self, other: &Entry) -> bool {
        self.firstname == other.firstname
            && self.lastname == other.lastname
            && self.email == other.email
    }

    /// Whether the birthdate falls on the same month and day as `date`.
    pub fn has_birthday_on(&self, date: NaiveDate) -> bool {
        self.birthdate
            .is_some_and(|b| b.month() == date.month() && b.day() == date.day())
    }

    /// Case-insensitive substring match.
    ///
    /// With a field, only that field is checked; with `None`, any field may
    /// match. Absent fields never match. Case folding is ASCII-only, which is
    /// what SQLite's `LIKE` does.
    pub fn matches(&self, field: Option<EntryField>, query: &str) -> bool {
        let needle = query.to_ascii_lowercase();
        let hit = |f: EntryField| {
            self.field_text(f)
                .is_some_and(|text| text.to_ascii_lowercase().contains(&needle))
        };
        match field {
            Some(f) => hit(f),
            None => EntryField::ALL.into_iter().any(hit),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let birthdate = self.field_text(EntryField::Birthdate);
        let postal_code = self.field_text(EntryField::PostalCode);

        let name = join(&[Some(self.firstname.as_str()), Some(self.lastname.as_str()), birthdate.as_deref()]);
        let street = join(&[self.street(), self.number()]);
        let town = join(&[postal_code.as_deref(), self.place()]);
        let address = match (street.is_empty(), town.is_empty()) {
            (false, false) => format!("{street}, {town}"),
            (false, true) => street,
            _ => town,
        };
        let contact = join(&[self.phone(), self.email()]);

        writeln!(f, "Name: {name}")?;
        writeln!(f, "Address: {address}")?;
        writeln!(f, "Contact: {contact}")
    }
}

fn join(parts: &[Option<&str>]) -> String {
    parts.iter().flatten().copied().collect::<Vec<_>>().join(" ")
}

/// Builder for entries. Validation happens once, in [`EntryBuilder::build`].
#[derive(Debug, Clone)]
pub struct EntryBuilder {
    draft: EntryDraft,
}

impl EntryBuilder {
    /// Start building an entry.
    pub fn new(firstname: impl Into<String>, lastname: impl Into<String>) -> Self {
        Self {
            draft: EntryDraft {
                firstname: firstname.into(),
                lastname: lastname.into(),
                ..EntryDraft::default()
            },
        }
    }

    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.draft.street = Some(street.into());
        self
    }

    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.draft.number = Some(number.into());
        self
    }

    pub fn postal_code(mut self, postal_code: impl ToString) -> Self {
        self.draft.postal_code = Some(postal_code.to_string());
        self
    }

    pub fn place(mut self, place: impl Into<String>) -> Self {
        self.draft.place = Some(place.into());
        self
    }

    /// Set the birthdate from `YYYY-MM-DD` text.
    pub fn birthdate(mut self, birthdate: impl Into<String>) -> Self {
        self.draft.birthdate = Some(birthdate.into());
        self
    }

    /// Set the birthdate from a date value.
    pub fn birth_date(self, date: NaiveDate) -> Self {
        self.birthdate(date.format("%Y-%m-%d").to_string())
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.draft.phone = Some(phone.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.draft.email = Some(email.into());
        self
    }

    /// Validate and build the entry.
    pub fn build(self) -> Result<Entry, ValidationError> {
        Entry::try_from(self.draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_entry() -> Entry {
        Entry::builder("Henri", "Henrison")
            .street("ABC-Street")
            .number("10")
            .postal_code(11111)
            .place("Berlin")
            .birthdate("2001-12-01")
            .phone("12345678")
            .email("henri@example.com")
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_full_entry() {
        let entry = full_entry();
        assert_eq!(entry.firstname(), "Henri");
        assert_eq!(entry.postal_code(), Some(11111));
        assert_eq!(entry.birthdate(), NaiveDate::from_ymd_opt(2001, 12, 1));
        assert_eq!(entry.email(), Some("henri@example.com"));
    }

    #[test]
    fn test_empty_optionals_become_absent() {
        let entry = Entry::builder("Ada", "Lovelace")
            .street("")
            .postal_code("")
            .birthdate("")
            .email("")
            .build()
            .unwrap();
        assert_eq!(entry.street(), None);
        assert_eq!(entry.postal_code(), None);
        assert_eq!(entry.birthdate(), None);
        assert_eq!(entry.email(), None);
        assert_eq!(entry, Entry::builder("Ada", "Lovelace").build().unwrap());
    }

    #[test]
    fn test_validation_names_failing_field() {
        let err = Entry::builder("", "Doe").build().unwrap_err();
        assert_eq!(err.field(), EntryField::Firstname);

        let err = Entry::builder("Jane", "Doe").birthdate("01/02/2000").build().unwrap_err();
        assert_eq!(err.field(), EntryField::Birthdate);

        let err = Entry::builder("Jane", "Doe").email("not-an-email").build().unwrap_err();
        assert_eq!(err.field(), EntryField::Email);

        let err = Entry::builder("Jane", "Doe").postal_code("0").build().unwrap_err();
        assert_eq!(err.field(), EntryField::PostalCode);
    }

    #[test]
    fn test_ordering_by_field_order() {
        let a = Entry::builder("Anna", "Zed").build().unwrap();
        let b = Entry::builder("Bert", "Adams").build().unwrap();
        assert!(a < b, "firstname compares first");

        let plain = Entry::builder("Henri", "Henrison").street("ABC-Street").number("10").build().unwrap();
        let other_number = Entry::builder("Henri", "Henrison").street("ABC-Street").number("12a").build().unwrap();
        assert!(plain < other_number);

        // Case-sensitive: uppercase sorts before lowercase.
        let upper = Entry::builder("Zoe", "X").build().unwrap();
        let lower = Entry::builder("adam", "X").build().unwrap();
        assert!(upper < lower);

        let mut list = vec![full_entry(), b.clone(), a.clone()];
        list.sort();
        assert_eq!(list[0], a);
        assert_eq!(list[1], b);
    }

    #[test]
    fn test_postal_code_orders_numerically() {
        let small = Entry::builder("A", "B").postal_code(9).build().unwrap();
        let large = Entry::builder("A", "B").postal_code(10).build().unwrap();
        assert!(small < large);
    }

    #[test]
    fn test_with_updates_revalidates() {
        let entry = full_entry();
        let updated = entry
            .with_updates(&[
                FieldUpdate::new(EntryField::Place, "Hamburg"),
                FieldUpdate::clear(EntryField::Phone),
            ])
            .unwrap();
        assert_eq!(updated.place(), Some("Hamburg"));
        assert_eq!(updated.phone(), None);
        assert_eq!(updated.firstname(), "Henri");

        let err = entry
            .with_updates(&[
                FieldUpdate::new(EntryField::Place, "Hamburg"),
                FieldUpdate::new(EntryField::Birthdate, "yesterday"),
            ])
            .unwrap_err();
        assert_eq!(err.field(), EntryField::Birthdate);
        assert_eq!(entry.place(), Some("Berlin"));

        let err = entry.with_updates(&[FieldUpdate::clear(EntryField::Lastname)]).unwrap_err();
        assert_eq!(err, ValidationError::MissingRequired(EntryField::Lastname));
    }

    #[test]
    fn test_same_identity() {
        let a = full_entry();
        let b = Entry::builder("Henri", "Henrison")
            .place("Paris")
            .email("henri@example.com")
            .build()
            .unwrap();
        assert!(a.same_identity_as(&b));

        let c = Entry::builder("henri", "Henrison").email("henri@example.com").build().unwrap();
        assert!(!a.same_identity_as(&c));

        let no_mail_1 = Entry::builder("X", "Y").build().unwrap();
        let no_mail_2 = Entry::builder("X", "Y").phone("1").build().unwrap();
        assert!(no_mail_1.same_identity_as(&no_mail_2));
    }

    #[test]
    fn test_has_birthday_on() {
        let entry = full_entry();
        assert!(entry.has_birthday_on(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()));
        assert!(!entry.has_birthday_on(NaiveDate::from_ymd_opt(2024, 12, 2).unwrap()));
        assert!(!Entry::builder("A", "B").build().unwrap().has_birthday_on(NaiveDate::MIN));
    }

    #[test]
    fn test_matches() {
        let entry = full_entry();
        assert!(entry.matches(Some(EntryField::Lastname), "henri"));
        assert!(entry.matches(Some(EntryField::PostalCode), "111"));
        assert!(entry.matches(Some(EntryField::Birthdate), "-12-"));
        assert!(!entry.matches(Some(EntryField::Firstname), "berlin"));
        assert!(entry.matches(None, "BERLIN"));
        assert!(!entry.matches(None, "munich"));

        let sparse = Entry::builder("A", "B").build().unwrap();
        assert!(!sparse.matches(Some(EntryField::Email), ""));
    }

    #[test]
    fn test_display_includes_populated_fields() {
        let text = full_entry().to_string();
        assert_eq!(
            text,
            "Name: Henri Henrison 2001-12-01\n\
             Address: ABC-Street 10, 11111 Berlin\n\
             Contact: 12345678 henri@example.com\n"
        );

        let sparse = Entry::builder("A", "B").place("Kiel").build().unwrap().to_string();
        assert_eq!(sparse, "Name: A B\nAddress: Kiel\nContact: \n");
    }

    #[test]
    fn test_draft_roundtrip() {
        let entry = full_entry();
        assert_eq!(Entry::try_from(entry.to_draft()).unwrap(), entry);
    }

    #[test]
    fn test_json_uses_field_names() {
        let entry = full_entry();
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["postal_code"], 11111);
        assert_eq!(value["birthdate"], "2001-12-01");

        let back: Entry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_json_deserialize_validates() {
        let bad = serde_json::json!({"firstname": "A", "lastname": "B", "email": "nope"});
        assert!(serde_json::from_value::<Entry>(bad).is_err());

        let sparse = serde_json::json!({"firstname": "A", "lastname": "B", "postal_code": "123"});
        let entry: Entry = serde_json::from_value(sparse).unwrap();
        assert_eq!(entry.postal_code(), Some(123));
    }
}
