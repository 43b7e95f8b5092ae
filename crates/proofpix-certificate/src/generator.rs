//! Pure certificate generation.

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use proofpix_core::Asset;

use crate::error::{CertificateError, CertificateResult};
use crate::types::*;

/// Prefix of the credential subject id.
pub const SUBJECT_ID_PREFIX: &str = "urn:proofpix:asset:";

/// Build the certificate for `asset`, issued at `issued_at`.
///
/// The rating is the originality score clamped into
/// [`WORST_RATING`]..=[`BEST_RATING`]; it is not rescaled. An empty
/// narrative falls back to the raw analysis text.
pub fn generate(asset: Option<&Asset>, issued_at: DateTime<Utc>) -> CertificateResult<Certificate> {
    let asset = asset.ok_or(CertificateError::MissingAsset)?;
    let issued = rfc3339(issued_at);

    let narrative = if asset.narrative.is_empty() {
        asset.raw_analysis.clone()
    } else {
        asset.narrative.clone()
    };

    Ok(Certificate {
        context: vec![CREDENTIALS_CONTEXT.into(), SCHEMA_ORG_CONTEXT.into()],
        types: vec![CREDENTIAL_TYPE.into(), PROOFPIX_CREDENTIAL_TYPE.into()],
        issuer: ISSUER.into(),
        issuance_date: issued.clone(),
        credential_subject: CredentialSubject {
            id: format!("{}{}", SUBJECT_ID_PREFIX, asset.id),
            subject_type: SUBJECT_TYPE.into(),
            creator: asset.user_id.clone(),
            authenticity_rating: AuthenticityRating {
                rating_type: RATING_TYPE.into(),
                rating_value: rating_value(asset.originality_score),
                best_rating: BEST_RATING,
                worst_rating: WORST_RATING,
            },
            authenticity_narrative: narrative,
        },
        proof: Proof {
            proof_type: PROOF_TYPE.into(),
            created: issued,
            proof_purpose: PROOF_PURPOSE.into(),
            proof_value: proof_value(&asset.id, asset.created_at),
        },
    })
}

/// Lowercase hex SHA-256 of `asset_id` followed by `created_at` in RFC 3339
/// (whole seconds, `Z` suffix).
///
/// Sub-second precision is dropped before hashing, so two records of the
/// same asset created within one second share a proof value. A redelivered
/// trigger that rewrites `created_at` in the same second therefore yields
/// an identical certificate proof.
pub fn proof_value(asset_id: &str, created_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(asset_id.as_bytes());
    hasher.update(rfc3339(created_at).as_bytes());
    hex::encode(hasher.finalize())
}

/// Originality score clamped to the rating scale.
pub fn rating_value(score: u8) -> u8 {
    score.clamp(WORST_RATING, BEST_RATING)
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proofpix_core::AssetStatus;

    fn asset(id: &str, created_at: DateTime<Utc>) -> Asset {
        Asset {
            id: id.to_string(),
            user_id: "user-42".into(),
            status: AssetStatus::Completed,
            created_at,
            raw_analysis: "Confidence Score: 0.95\n\nJustification: Natural light.".into(),
            originality_score: 95,
            narrative: "Natural light.".into(),
            embedding: vec![0.0; 4],
            transparency_log_position: None,
        }
    }

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, secs).unwrap()
    }

    #[test]
    fn test_generate_fills_credential_shape() {
        let cert = generate(Some(&asset("test-asset-123", ts(0))), ts(5)).unwrap();

        assert_eq!(cert.context, vec![CREDENTIALS_CONTEXT, SCHEMA_ORG_CONTEXT]);
        assert_eq!(cert.types, vec![CREDENTIAL_TYPE, PROOFPIX_CREDENTIAL_TYPE]);
        assert_eq!(cert.issuer, ISSUER);
        assert_eq!(cert.issuance_date, "2024-01-15T10:30:05Z");
        assert_eq!(cert.credential_subject.id, "urn:proofpix:asset:test-asset-123");
        assert_eq!(cert.credential_subject.creator, "user-42");
        assert_eq!(cert.credential_subject.subject_type, SUBJECT_TYPE);
        assert_eq!(cert.credential_subject.authenticity_rating.rating_value, 10);
        assert_eq!(cert.proof.proof_type, PROOF_TYPE);
        assert_eq!(cert.proof.proof_purpose, PROOF_PURPOSE);
        assert_eq!(cert.proof.created, cert.issuance_date);
        assert_eq!(cert.asset_id(), Some("test-asset-123"));
    }

    #[test]
    fn test_generate_without_asset_fails() {
        assert!(matches!(
            generate(None, ts(0)),
            Err(CertificateError::MissingAsset)
        ));
    }

    #[test]
    fn test_narrative_falls_back_to_raw_analysis() {
        let mut a = asset("a", ts(0));
        a.narrative.clear();
        let cert = generate(Some(&a), ts(0)).unwrap();
        assert_eq!(cert.credential_subject.authenticity_narrative, a.raw_analysis);
    }

    #[test]
    fn test_rating_is_clamped_not_rescaled() {
        assert_eq!(rating_value(0), 1);
        assert_eq!(rating_value(1), 1);
        assert_eq!(rating_value(7), 7);
        assert_eq!(rating_value(10), 10);
        assert_eq!(rating_value(98), 10);
    }

    #[test]
    fn test_proof_value_matches_sha256_of_id_and_timestamp() {
        let expected = hex::encode(Sha256::digest(b"asset-12024-01-15T10:30:00Z"));
        assert_eq!(proof_value("asset-1", ts(0)), expected);
        assert_eq!(expected.len(), 64);
        assert!(expected.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_certificate_is_deterministic() {
        println!("=== TEST: certificate determinism ===");
        let a = asset("asset-1", ts(0));
        let first = generate(Some(&a), ts(9)).unwrap().to_json_bytes().unwrap();
        let second = generate(Some(&a), ts(9)).unwrap().to_json_bytes().unwrap();
        assert_eq!(first, second);

        let other_id = generate(Some(&asset("asset-2", ts(0))), ts(9)).unwrap();
        let other_time = generate(Some(&asset("asset-1", ts(1))), ts(9)).unwrap();
        let base = generate(Some(&a), ts(9)).unwrap();
        println!("AFTER: proof={}", base.proof.proof_value);
        assert_ne!(base.proof.proof_value, other_id.proof.proof_value);
        assert_ne!(base.proof.proof_value, other_time.proof.proof_value);

        // Issuance time does not affect the proof value.
        let later = generate(Some(&a), ts(30)).unwrap();
        assert_eq!(base.proof.proof_value, later.proof.proof_value);
        println!("RESULT: PASS");
    }

    #[test]
    fn test_json_uses_credential_field_names_and_two_space_indent() {
        let bytes = generate(Some(&asset("a", ts(0))), ts(0))
            .unwrap()
            .to_json_bytes()
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("{\n  \"@context\": ["));
        for key in [
            "\"@type\"",
            "\"issuanceDate\"",
            "\"credentialSubject\"",
            "\"authenticityRating\"",
            "\"ratingValue\"",
            "\"bestRating\"",
            "\"worstRating\"",
            "\"authenticityNarrative\"",
            "\"proofPurpose\"",
            "\"proofValue\"",
        ] {
            assert!(text.contains(key), "missing {}", key);
        }

        let parsed: Certificate = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.credential_subject.authenticity_rating.rating_type, RATING_TYPE);
    }

    #[test]
    fn test_proof_value_ignores_sub_second_precision() {
        println!("=== TEST: proof value at second granularity ===");
        let base = ts(5);
        let same_second = base + chrono::Duration::milliseconds(999);
        let next_second = base + chrono::Duration::seconds(1);

        let proof = proof_value("asset-1", base);
        println!("BEFORE: {} AFTER: {}", base, same_second);
        assert_eq!(proof, proof_value("asset-1", same_second));
        assert_ne!(proof, proof_value("asset-1", next_second));
        println!("RESULT: PASS");
    }
}
