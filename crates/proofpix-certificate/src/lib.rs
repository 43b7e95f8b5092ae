//! Certificates and badges for fingerprinted assets.
//!
//! [`generate`] turns a persisted [`Asset`](proofpix_core::Asset) into a W3C
//! verifiable-credential shaped [`Certificate`]. It is pure: the same asset
//! and issuance time always yield the same bytes.
//!
//! [`PngBadgeRenderer`] draws a small coloured score badge.

pub mod badge;
pub mod error;
pub mod generator;
pub mod types;

pub use badge::{badge_color, PngBadgeRenderer, BADGE_HEIGHT, BADGE_WIDTH};
pub use error::{CertificateError, CertificateResult};
pub use generator::{generate, proof_value, rating_value};
pub use types::{AuthenticityRating, Certificate, CredentialSubject, Proof};
