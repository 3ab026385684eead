//! Field descriptor registry: which fields each document category yields.
//!
//! The table is built once on first use and never mutated. Keys are the
//! form-field identifiers the portal uses for its upload slots
//! (`passportFile`, `birthCertificateFile`, …), so callers can pass the
//! upload slot name straight through as the category key.
//!
//! An unknown key is not an error: [`fields_for`] returns an empty slice and
//! the orchestrator treats that document as "nothing to extract".

use crate::error::AnalysisError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Semantic hint surfaced in the prompt next to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Date,
    Enum,
    Address,
    Country,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::Enum => "enum",
            FieldType::Address => "address",
            FieldType::Country => "country",
        };
        f.write_str(s)
    }
}

/// One extractable datum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Stable identifier, unique within a category (`firstName`, `passportNumber`).
    pub name: String,
    /// Human-readable hint rendered into the prompt.
    pub description: String,
    /// Annotates the prompt only; a missing required field never blocks extraction.
    pub required: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
}

impl FieldDescriptor {
    /// An optional field with no type hint.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
            field_type: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn typed(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }
}

/// Document categories known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentCategory {
    Passport,
    BirthCertificate,
    ResidencePermit,
    AddressProof,
    IdentityCard,
    MarriageCertificate,
}

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 6] = [
        DocumentCategory::Passport,
        DocumentCategory::BirthCertificate,
        DocumentCategory::ResidencePermit,
        DocumentCategory::AddressProof,
        DocumentCategory::IdentityCard,
        DocumentCategory::MarriageCertificate,
    ];

    /// The upload-slot key used on the wire.
    pub fn as_key(self) -> &'static str {
        match self {
            DocumentCategory::Passport => "passportFile",
            DocumentCategory::BirthCertificate => "birthCertificateFile",
            DocumentCategory::ResidencePermit => "residencePermitFile",
            DocumentCategory::AddressProof => "addressProofFile",
            DocumentCategory::IdentityCard => "identityCardFile",
            DocumentCategory::MarriageCertificate => "marriageCertificateFile",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_key() == key)
    }

    pub fn fields(self) -> &'static [FieldDescriptor] {
        fields_for(self.as_key())
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

fn identity_fields() -> Vec<FieldDescriptor> {
    use FieldType::*;
    vec![
        FieldDescriptor::new("firstName", "Given name(s) of the holder").required().typed(Text),
        FieldDescriptor::new("lastName", "Family name of the holder").required().typed(Text),
        FieldDescriptor::new("birthDate", "Date of birth").required().typed(Date),
        FieldDescriptor::new("birthPlace", "City or locality of birth").typed(Text),
        FieldDescriptor::new("gender", "Sex of the holder (MALE or FEMALE)").typed(Enum),
        FieldDescriptor::new("nationality", "Nationality of the holder").typed(Country),
    ]
}

static REGISTRY: Lazy<HashMap<&'static str, Vec<FieldDescriptor>>> = Lazy::new(|| {
    use FieldType::*;
    let mut map = HashMap::new();

    let mut passport = identity_fields();
    passport.extend([
        FieldDescriptor::new("passportNumber", "Passport number as printed on the data page")
            .required()
            .typed(Text),
        FieldDescriptor::new("passportIssueDate", "Date the passport was issued").typed(Date),
        FieldDescriptor::new("passportExpiryDate", "Date the passport expires").typed(Date),
        FieldDescriptor::new("passportIssueAuthority", "Authority or place that issued the passport")
            .typed(Text),
    ]);
    map.insert(DocumentCategory::Passport.as_key(), passport);

    map.insert(
        DocumentCategory::BirthCertificate.as_key(),
        vec![
            FieldDescriptor::new("firstName", "Given name(s) of the child").required().typed(Text),
            FieldDescriptor::new("lastName", "Family name of the child").required().typed(Text),
            FieldDescriptor::new("birthDate", "Date of birth").required().typed(Date),
            FieldDescriptor::new("birthPlace", "City or locality of birth").required().typed(Text),
            FieldDescriptor::new("birthCountry", "Country of birth").typed(Country),
            FieldDescriptor::new("gender", "Sex of the child (MALE or FEMALE)").typed(Enum),
            FieldDescriptor::new("fatherFullName", "Full name of the father").typed(Text),
            FieldDescriptor::new("motherFullName", "Full name of the mother").typed(Text),
        ],
    );

    let mut permit = identity_fields();
    permit.extend([
        FieldDescriptor::new("residencePermitNumber", "Residence permit or card number").typed(Text),
        FieldDescriptor::new("residencePermitExpiryDate", "Date the permit expires").typed(Date),
        FieldDescriptor::new("address", "Address printed on the permit").typed(Address),
    ]);
    map.insert(DocumentCategory::ResidencePermit.as_key(), permit);

    map.insert(
        DocumentCategory::AddressProof.as_key(),
        vec![
            FieldDescriptor::new("address", "Full postal address of the resident")
                .required()
                .typed(Address),
            FieldDescriptor::new("firstName", "Given name(s) of the addressee").typed(Text),
            FieldDescriptor::new("lastName", "Family name of the addressee").typed(Text),
        ],
    );

    let mut id_card = identity_fields();
    id_card.extend([
        FieldDescriptor::new("identityCardNumber", "National identity card number")
            .required()
            .typed(Text),
        FieldDescriptor::new("identityCardExpiryDate", "Date the card expires").typed(Date),
    ]);
    map.insert(DocumentCategory::IdentityCard.as_key(), id_card);

    map.insert(
        DocumentCategory::MarriageCertificate.as_key(),
        vec![
            FieldDescriptor::new("maritalStatus", "MARRIED when the certificate is valid").typed(Enum),
            FieldDescriptor::new("spouseFullName", "Full name of the spouse").required().typed(Text),
            FieldDescriptor::new("marriageDate", "Date of the marriage").required().typed(Date),
            FieldDescriptor::new("marriagePlace", "City or locality of the marriage").typed(Text),
        ],
    );

    map
});

/// Ordered field descriptors for `category_key`; empty for unknown keys.
pub fn fields_for(category_key: &str) -> &'static [FieldDescriptor] {
    REGISTRY
        .get(category_key)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Check that every field name is unique within `fields`.
pub fn validate_fields(category: &str, fields: &[FieldDescriptor]) -> Result<(), AnalysisError> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(AnalysisError::InvalidRegistry {
                category: category.to_string(),
                field: field.name.clone(),
            });
        }
    }
    Ok(())
}

/// Validate the whole registry.
pub fn validate_registry() -> Result<(), AnalysisError> {
    for (category, fields) in REGISTRY.iter() {
        validate_fields(category, fields)?;
    }
    Ok(())
}
