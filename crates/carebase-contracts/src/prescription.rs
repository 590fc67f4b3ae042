//! Prescription and medication records.
//!
//! A prescription row and its medication rows live in separate tables; the
//! medications reference their prescription through `prescription_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{advisory::MedicationEntry, store::Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub diagnosis: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Prescription {
    const TABLE: &'static str = "prescriptions";

    fn id(&self) -> &str {
        &self.id
    }
}

/// One medication line as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationBase {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl MedicationBase {
    /// Attach the line to a prescription as a stored row.
    pub fn into_record(self, prescription_id: &str) -> Medication {
        Medication {
            id: crate::new_record_id(),
            prescription_id: prescription_id.to_string(),
            name: self.name,
            dosage: self.dosage,
            frequency: self.frequency,
            duration: self.duration,
            instructions: self.instructions,
        }
    }
}

/// A stored medication row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub prescription_id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl Record for Medication {
    const TABLE: &'static str = "medications";
    const TIMESTAMPED: bool = false;

    fn id(&self) -> &str {
        &self.id
    }
}

impl From<&Medication> for MedicationEntry {
    fn from(med: &Medication) -> Self {
        MedicationEntry {
            name: med.name.clone(),
            dosage: Some(med.dosage.clone()),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrescriptionCreate {
    pub patient_id: String,
    /// Prescribing doctor. Defaults to the caller when absent or empty.
    #[serde(default)]
    pub doctor_id: Option<String>,
    pub diagnosis: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    pub medications: Vec<MedicationBase>,
}

impl PrescriptionCreate {
    /// Split into the prescription row and the medication lines still to be
    /// attached to it.
    pub fn into_parts(self, caller_id: &str) -> (Prescription, Vec<MedicationBase>) {
        let now = Utc::now();
        let doctor_id = self
            .doctor_id
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| caller_id.to_string());
        let prescription = Prescription {
            id: crate::new_record_id(),
            patient_id: self.patient_id,
            doctor_id,
            diagnosis: self.diagnosis,
            notes: self.notes,
            file_url: self.file_url,
            created_at: now,
            updated_at: now,
        };
        (prescription, self.medications)
    }
}

/// Partial update. `medications`, when present, replaces the full list and is
/// never part of the prescription row patch.
///
/// `notes` and `file_url` distinguish absent (`None`) from an explicit
/// `null` (`Some(None)`), which clears the column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrescriptionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub file_url: Option<Option<String>>,
    #[serde(default, skip_serializing)]
    pub medications: Option<Vec<MedicationBase>>,
}

/// Called only for keys present in the input, so `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A prescription together with its medication rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionWithMedications {
    #[serde(flatten)]
    pub prescription: Prescription,
    pub medications: Vec<Medication>,
}
