//! Certificate document types.
//!
//! Field names follow the W3C verifiable-credential data model and the
//! schema.org `Rating` vocabulary.

use serde::{Deserialize, Serialize};

use crate::error::CertificateResult;

pub const CREDENTIALS_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const SCHEMA_ORG_CONTEXT: &str = "https://schema.org";
pub const CREDENTIAL_TYPE: &str = "VerifiableCredential";
pub const PROOFPIX_CREDENTIAL_TYPE: &str = "ProofPixAuthenticityCredential";
pub const ISSUER: &str = "https://proofpix.com";
pub const SUBJECT_TYPE: &str = "ImageAuthenticityAssertion";
pub const RATING_TYPE: &str = "Rating";
pub const PROOF_TYPE: &str = "DataIntegrityProof";
pub const PROOF_PURPOSE: &str = "assertionMethod";
pub const BEST_RATING: u8 = 10;
pub const WORST_RATING: u8 = 1;

/// Authenticity certificate for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "@type")]
    pub types: Vec<String>,
    pub issuer: String,
    pub issuance_date: String,
    pub credential_subject: CredentialSubject,
    pub proof: Proof,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    /// `urn:proofpix:asset:{asset_id}`
    pub id: String,
    #[serde(rename = "type")]
    pub subject_type: String,
    /// Uploading user id.
    pub creator: String,
    pub authenticity_rating: AuthenticityRating,
    pub authenticity_narrative: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticityRating {
    #[serde(rename = "@type")]
    pub rating_type: String,
    pub rating_value: u8,
    pub best_rating: u8,
    pub worst_rating: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: String,
    pub proof_purpose: String,
    /// Lowercase hex SHA-256 of `asset_id ++ created_at`.
    pub proof_value: String,
}

impl Certificate {
    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json_bytes(&self) -> CertificateResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Asset id encoded in the subject URN.
    pub fn asset_id(&self) -> Option<&str> {
        self.credential_subject
            .id
            .strip_prefix(crate::generator::SUBJECT_ID_PREFIX)
    }
}
