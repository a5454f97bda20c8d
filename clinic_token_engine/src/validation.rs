//! Issuance request validation.
//!
//! The only checks are presence checks: both names non-empty after
//! trimming, and a non-zero age. Zero is treated as "not entered".

use std::fmt;

use thiserror::Error;

use crate::domain::IssueRequest;

/// A form field that must be filled in before a token is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Doctor,
    Patient,
    Age,
}

impl RequiredField {
    pub fn label(self) -> &'static str {
        match self {
            RequiredField::Doctor => "Doctor Name",
            RequiredField::Patient => "Patient Name",
            RequiredField::Age => "Age",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all details (Doctor Name, Patient Name, and Age); missing: {}", join_fields(.0))]
    MissingFields(Vec<RequiredField>),
}

impl ValidationError {
    pub fn missing(&self) -> &[RequiredField] {
        match self {
            ValidationError::MissingFields(fields) => fields,
        }
    }
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Request that passed validation, names already trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRequest {
    pub doctor: String,
    pub patient: String,
    pub age: u8,
}

/// Check every required field and report all missing ones at once.
pub fn validate_request(request: &IssueRequest) -> Result<ValidRequest, ValidationError> {
    let doctor = request.doctor.trim();
    let patient = request.patient.trim();

    let mut missing = Vec::new();
    if doctor.is_empty() {
        missing.push(RequiredField::Doctor);
    }
    if patient.is_empty() {
        missing.push(RequiredField::Patient);
    }
    if request.age == 0 {
        missing.push(RequiredField::Age);
    }

    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    Ok(ValidRequest {
        doctor: doctor.to_string(),
        patient: patient.to_string(),
        age: request.age,
    })
}
