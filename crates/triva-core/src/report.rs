//! The structured clinical report that terminates a conversation.
//!
//! When the backend has gathered enough symptoms it stops replying in prose
//! and emits one JSON object carrying the identified symptoms, their mapped
//! diagnoses, ICD-10 codes, an appointment prefill, and optional FHIR
//! projections. That object replaces the assistant message's running text
//! wholesale and freezes it.
//!
//! Every field is defaulted: the backend's degraded path emits only
//! `{symptoms, error_message, icd10, appointment}`, and partial shapes must
//! still deserialize.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One symptom phrase mapped to a clinical diagnosis phrase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisMapping {
    /// The symptom phrase the mapping was made from.
    pub symptom: String,
    /// The detailed clinical diagnosis phrase.
    pub diagnosis: String,
}

/// A diagnosis resolved to an ICD-10 code.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icd10Mapping {
    /// The originating symptom phrase.
    pub symptom: String,
    /// The diagnosis phrase.
    pub diagnosis: String,
    /// The ICD-10 code (e.g. `"R07.9"`).
    pub icd10: String,
}

/// Appointment details suggested from the coded diagnoses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentPrefill {
    /// Suggested medical specialty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    /// Suggested appointment date.
    #[serde(rename = "suggestedDate", skip_serializing_if = "Option::is_none")]
    pub suggested_date: Option<String>,
    /// Suggested appointment time.
    #[serde(rename = "suggestedTime", skip_serializing_if = "Option::is_none")]
    pub suggested_time: Option<String>,
    /// Suggested location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A `{text}` wrapper as used by FHIR codeable concepts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeText {
    /// Display text.
    #[serde(default)]
    pub text: String,
}

/// FHIR `Condition` projection of an identified symptom.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FhirCondition {
    /// Always `"Condition"`.
    #[serde(rename = "resourceType", default)]
    pub resource_type: String,
    /// Clinical status (e.g. active).
    #[serde(rename = "clinicalStatus", default)]
    pub clinical_status: CodeText,
    /// Verification status (e.g. unconfirmed).
    #[serde(rename = "verificationStatus", default)]
    pub verification_status: CodeText,
    /// The symptom as a codeable concept.
    #[serde(default)]
    pub code: CodeText,
}

/// FHIR `Appointment` projection of the suggested appointment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FhirAppointment {
    /// Always `"Appointment"`.
    #[serde(rename = "resourceType", default)]
    pub resource_type: String,
    /// Appointment status (e.g. proposed).
    #[serde(default)]
    pub status: String,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Start instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// End instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// The terminal structured payload of a conversation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalReport {
    /// Identified symptom phrases.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symptoms: Vec<String>,
    /// Symptom-to-diagnosis mappings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<DiagnosisMapping>,
    /// Diagnosis phrases in mapping order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detailed_diagnoses: Vec<String>,
    /// ICD-10 coded rows.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icd10: Vec<Icd10Mapping>,
    /// Appointment prefill details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment: Option<AppointmentPrefill>,
    /// FHIR `Condition` projections.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symptoms_fhir: Vec<FhirCondition>,
    /// FHIR `Appointment` projection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_fhir: Option<FhirAppointment>,
    /// Set when the backend identified symptoms but could not complete the
    /// diagnosis mapping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// JSON keys that mark an object as clinically shaped.
const SHAPE_KEYS: [&str; 6] = [
    "symptoms",
    "mappings",
    "icd10",
    "appointment",
    "symptoms_fhir",
    "appointment_fhir",
];

impl ClinicalReport {
    /// Whether a JSON value looks like a clinical report.
    ///
    /// True only for an object carrying at least one domain key. This is the
    /// wire protocol's disambiguation heuristic: delta text that parses as
    /// JSON is a terminal report exactly when it has this shape, and plain
    /// prose (or a bare JSON string/number/array) is not. The protocol
    /// carries no explicit event-kind tag, so nothing stricter is possible
    /// without changing the backend.
    #[must_use]
    pub fn matches_shape(value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|obj| SHAPE_KEYS.iter().any(|k| obj.contains_key(*k)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
