//! Client profile extraction from a legacy record's JSON documents.
//!
//! Each legacy user carries three independent JSON documents:
//!
//! 1. Public data: company profile, top-level country and the company address
//! 2. Private data: phone number and a fallback address
//! 3. Protected data: a fallback phone number
//!
//! Sources are merged first-writer-wins. A malformed document never aborts the
//! extraction, it only drops that document's contribution.

use crate::models::ExtractedProfile;
use serde_json::{Map, Value};

/// Outcome of parsing one raw source column.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceDocument {
    /// Empty column or the literal text `null`.
    Absent,
    Parsed(Map<String, Value>),
    /// Not valid JSON, or JSON that is not an object.
    Malformed(String),
}

impl SourceDocument {
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() || raw == "null" {
            return SourceDocument::Absent;
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => SourceDocument::Parsed(map),
            Ok(other) => {
                SourceDocument::Malformed(format!("expected a JSON object, found {}", kind(&other)))
            }
            Err(e) => SourceDocument::Malformed(e.to_string()),
        }
    }

    fn status(&self) -> SourceStatus {
        match self {
            SourceDocument::Absent => SourceStatus::Absent,
            SourceDocument::Parsed(_) => SourceStatus::Parsed,
            SourceDocument::Malformed(reason) => SourceStatus::Malformed(reason.clone()),
        }
    }
}

/// How a source fared during extraction, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Absent,
    Parsed,
    Malformed(String),
}

/// Result of an extraction together with the health of each source.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub profile: Option<ExtractedProfile>,
    pub public: SourceStatus,
    pub private: SourceStatus,
    pub protected: SourceStatus,
}

impl ExtractionReport {
    pub fn malformed_sources(&self) -> Vec<(&'static str, &str)> {
        [
            ("PublicData", &self.public),
            ("PrivateData", &self.private),
            ("ProtectedData", &self.protected),
        ]
        .into_iter()
        .filter_map(|(name, status)| match status {
            SourceStatus::Malformed(reason) => Some((name, reason.as_str())),
            _ => None,
        })
        .collect()
    }
}

/// Extracts a client profile, or `None` when no company name is available.
pub fn extract_client_profile(
    public_data: &str,
    private_data: &str,
    protected_data: &str,
) -> Option<ExtractedProfile> {
    extract_with_report(public_data, private_data, protected_data).profile
}

/// Extracts a client profile and reports how each source parsed.
pub fn extract_with_report(
    public_data: &str,
    private_data: &str,
    protected_data: &str,
) -> ExtractionReport {
    let public = SourceDocument::parse(public_data);
    let private = SourceDocument::parse(private_data);
    let protected = SourceDocument::parse(protected_data);

    let mut draft = ProfileDraft::default();

    match &public {
        SourceDocument::Parsed(doc) => draft.apply_public(doc),
        SourceDocument::Malformed(reason) => {
            tracing::warn!("⚠️ Error parsing PublicData: {}", reason)
        }
        SourceDocument::Absent => {}
    }

    match &private {
        SourceDocument::Parsed(doc) => draft.apply_private(doc),
        SourceDocument::Malformed(reason) => {
            tracing::warn!("⚠️ Error parsing PrivateData: {}", reason)
        }
        SourceDocument::Absent => {}
    }

    match &protected {
        SourceDocument::Parsed(doc) => draft.apply_protected(doc),
        SourceDocument::Malformed(reason) => {
            tracing::warn!("⚠️ Error parsing ProtectedData: {}", reason)
        }
        SourceDocument::Absent => {}
    }

    ExtractionReport {
        profile: draft.into_profile(),
        public: public.status(),
        private: private.status(),
        protected: protected.status(),
    }
}

/// Accumulates fields while the sources are merged.
#[derive(Debug, Default)]
struct ProfileDraft {
    company_name: Option<String>,
    website: Option<String>,
    duns_number: Option<String>,
    industry: Option<String>,
    organisation_type: Option<String>,
    country: Option<String>,
    postal_code: Option<String>,
    address1: Option<String>,
    address2: Option<String>,
    address3: Option<String>,
    phone: Option<String>,
}

impl ProfileDraft {
    fn apply_public(&mut self, doc: &Map<String, Value>) {
        match doc.get("companyProfile") {
            Some(Value::Object(company)) => {
                self.company_name = text_field(company, "companyName");
                self.website = text_field(company, "website");
                self.duns_number = text_field(company, "dunsNumber");
                self.industry = text_field(company, "industry");
                self.organisation_type = text_field(company, "organizationType");
            }
            Some(other) => {
                tracing::debug!("PublicData.companyProfile is {}, ignoring", kind(other))
            }
            None => {}
        }

        if doc.contains_key("country") {
            self.country = text_field(doc, "country");
        }

        // "address" shadows "companyAddress" whenever the key exists
        let address = doc.get("address").or_else(|| doc.get("companyAddress"));
        if let Some(address) = address.and_then(AddressParts::from_value) {
            self.country = address.country.clone();
            self.postal_code = address.zip_code.clone();
            if let Some(line) = address.address1() {
                self.address1 = Some(line);
            }
            if let Some(line) = address.address2() {
                self.address2 = Some(line);
            }
            if let Some(line) = address.address3() {
                self.address3 = Some(line);
            }
        }
    }

    fn apply_private(&mut self, doc: &Map<String, Value>) {
        if let Some(phone) = text_field(doc, "phoneNumber") {
            self.phone = Some(phone);
        }

        if self.country.is_some() {
            return;
        }

        if let Some(address) = doc.get("address").and_then(AddressParts::from_value) {
            set_if_absent(&mut self.country, address.country.clone());
            set_if_absent(&mut self.postal_code, address.zip_code.clone());
            set_if_absent(&mut self.address1, address.address1());
            set_if_absent(&mut self.address2, address.address2());
            set_if_absent(&mut self.address3, address.address3());
        }
    }

    fn apply_protected(&mut self, doc: &Map<String, Value>) {
        set_if_absent(&mut self.phone, text_field(doc, "phoneNumber"));
    }

    fn into_profile(self) -> Option<ExtractedProfile> {
        let company_name = self.company_name.filter(|name| !name.is_empty())?;

        Some(ExtractedProfile {
            company_name,
            website: self.website,
            duns_number: self.duns_number,
            industry: self.industry,
            organisation_type: self.organisation_type,
            country: self.country,
            postal_code: self.postal_code,
            address1: self.address1,
            address2: self.address2,
            address3: self.address3,
            phone: self.phone,
        })
    }
}

/// Components of a legacy address object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub street_name: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl AddressParts {
    /// Reads an address from a JSON value. Only non-empty objects qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object().filter(|obj| !obj.is_empty())?;

        Some(Self {
            street_name: text_field(obj, "streetName"),
            suburb: text_field(obj, "suburb"),
            city: text_field(obj, "city"),
            state: text_field(obj, "state"),
            zip_code: text_field(obj, "zipCode"),
            country: text_field(obj, "country"),
        })
    }

    /// Street name, suffixed with the suburb when there is one.
    pub fn address1(&self) -> Option<String> {
        let street = non_empty(&self.street_name)?;
        Some(join_parts(&[Some(street), non_empty(&self.suburb)]))
    }

    /// City and state, whichever are present.
    pub fn address2(&self) -> Option<String> {
        let parts = [non_empty(&self.city), non_empty(&self.state)];
        if parts.iter().all(Option::is_none) {
            return None;
        }
        Some(join_parts(&parts))
    }

    pub fn address3(&self) -> Option<String> {
        non_empty(&self.city).map(str::to_string)
    }
}

/// Fills `slot` only if nothing has been written to it yet.
pub fn set_if_absent(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Reads a scalar as text. Strings are taken verbatim, numbers and booleans use
/// their JSON rendering, anything else counts as not supplied.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn join_parts(parts: &[Option<&str>]) -> String {
    parts.iter().flatten().copied().collect::<Vec<_>>().join(", ")
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
