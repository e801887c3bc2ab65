//! Proptest generators for property-based testing.

use proptest::prelude::*;

use addrbook_core::{Entry, EntryField, FieldUpdate};
use chrono::NaiveDate;

/// Generate a name: no surrounding whitespace, never blank.
pub fn name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{0,10}([ '-][A-Z][a-z]{1,8})?".prop_map(String::from)
}

/// Generate free text that needs CSV quoting now and then.
pub fn text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ,.\"'/-]{0,18}[A-Za-z0-9]".prop_map(String::from)
}

/// Generate a house number such as `12` or `4b`.
pub fn house_number() -> impl Strategy<Value = String> {
    "[1-9][0-9]{0,3}[a-z]?".prop_map(String::from)
}

pub fn postal_code() -> impl Strategy<Value = u32> {
    1u32..=99_999
}

/// Generate a birthdate between 1900 and 2030.
pub fn birth_date() -> impl Strategy<Value = NaiveDate> {
    (1900i32..=2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).expect("day 28 exists in every month"))
}

pub fn phone() -> impl Strategy<Value = String> {
    "\\+?[0-9]{2,4}( [0-9]{3,8}){1,2}".prop_map(String::from)
}

/// Generate an address with a deliverable-shaped domain.
pub fn email() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(\\.[a-z]{1,6})?@[a-z]{1,10}\\.(com|org|de|co\\.uk)".prop_map(String::from)
}

/// Parameters for generating an entry.
#[derive(Debug, Clone)]
pub struct EntryParams {
    pub firstname: String,
    pub lastname: String,
    pub street: Option<String>,
    pub number: Option<String>,
    pub postal_code: Option<u32>,
    pub place: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Arbitrary for EntryParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            (name(), name()),
            (
                proptest::option::of(text()),
                proptest::option::of(house_number()),
                proptest::option::of(postal_code()),
                proptest::option::of(text()),
            ),
            (
                proptest::option::of(birth_date()),
                proptest::option::of(phone()),
                proptest::option::of(email()),
            ),
        )
            .prop_map(
                |((firstname, lastname), (street, number, postal_code, place), (birthdate, phone, email))| {
                    EntryParams {
                        firstname,
                        lastname,
                        street,
                        number,
                        postal_code,
                        place,
                        birthdate,
                        phone,
                        email,
                    }
                },
            )
            .boxed()
    }
}

/// Build an entry from parameters.
pub fn entry_from_params(params: &EntryParams) -> Entry {
    let mut builder = Entry::builder(params.firstname.clone(), params.lastname.clone());
    if let Some(street) = &params.street {
        builder = builder.street(street.clone());
    }
    if let Some(number) = &params.number {
        builder = builder.number(number.clone());
    }
    if let Some(code) = params.postal_code {
        builder = builder.postal_code(code);
    }
    if let Some(place) = &params.place {
        builder = builder.place(place.clone());
    }
    if let Some(date) = params.birthdate {
        builder = builder.birth_date(date);
    }
    if let Some(phone) = &params.phone {
        builder = builder.phone(phone.clone());
    }
    if let Some(email) = &params.email {
        builder = builder.email(email.clone());
    }
    builder.build().expect("generated parameters are valid")
}

/// Generate a valid entry.
pub fn entry() -> impl Strategy<Value = Entry> {
    any::<EntryParams>().prop_map(|params| entry_from_params(&params))
}

/// Generate up to `max` entries with pairwise distinct identities.
pub fn distinct_entries(max: usize) -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::vec(entry(), 0..=max).prop_map(|entries| {
        let mut distinct: Vec<Entry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !distinct.iter().any(|e| e.same_identity_as(&entry)) {
                distinct.push(entry);
            }
        }
        distinct
    })
}

/// Generate a valid update to one optional field.
pub fn optional_field_update() -> impl Strategy<Value = FieldUpdate> {
    prop_oneof![
        text().prop_map(|v| FieldUpdate::new(EntryField::Street, v)),
        house_number().prop_map(|v| FieldUpdate::new(EntryField::Number, v)),
        postal_code().prop_map(|v| FieldUpdate::new(EntryField::PostalCode, v.to_string())),
        text().prop_map(|v| FieldUpdate::new(EntryField::Place, v)),
        birth_date().prop_map(|d| FieldUpdate::new(EntryField::Birthdate, d.format("%Y-%m-%d").to_string())),
        phone().prop_map(|v| FieldUpdate::new(EntryField::Phone, v)),
        email().prop_map(|v| FieldUpdate::new(EntryField::Email, v)),
        Just(FieldUpdate::clear(EntryField::Street)),
        Just(FieldUpdate::clear(EntryField::Email)),
    ]
}
