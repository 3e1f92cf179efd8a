//! Authentication and authorization system.
//!
//! Authentication is JWT-only: an external identity provider issues tokens,
//! and this service verifies them and materializes users from their claims.
//! The pipeline for every authenticated request is:
//!
//! 1. [`token`]: verify the bearer token (signature, issuer/audience, and
//!    leeway-tolerant `exp`/`iat` checks) into typed [`token::Claims`].
//! 2. [`identity`]: resolve `preferred_username` to a persisted user,
//!    creating it on first sight with bounded retry on creation races.
//! 3. [`roles`]: reconcile the user's `admin` role with the
//!    `administrator` claim.
//!
//! [`middleware`] wires the pipeline into axum; [`current_user`] provides the
//! handler-side extractor; [`permissions`] holds the admin gate for catalog
//! writes.

pub mod current_user;
pub mod identity;
pub mod middleware;
pub mod permissions;
pub mod roles;
pub mod token;
