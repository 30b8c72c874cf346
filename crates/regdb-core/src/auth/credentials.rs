use crate::{
    model::{AttributeType, Record},
    update::{PreparedUpdate, UpdateContext},
};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use tracing::debug;

/// Lowercase hex SHA-256 of `password`, the form stored in `SHA2-PW` lines.
#[must_use]
pub fn sha256_hex(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

///
/// CredentialValidator
///
/// Decides which candidate credential holders accept the credentials
/// supplied with the update.
///

pub trait CredentialValidator: Send + Sync {
    fn authenticate(
        &self,
        update: &PreparedUpdate,
        ctx: &UpdateContext,
        candidates: &[Record],
        strategy: &'static str,
    ) -> Vec<Record>;
}

///
/// AuthScheme
///

#[derive(Clone, Debug, Eq, PartialEq)]
enum AuthScheme {
    Sha2Password(String),
    Sso(String),
}

impl AuthScheme {
    fn parse(value: &str) -> Option<Self> {
        let (scheme, argument) = value.trim().split_once(char::is_whitespace)?;
        let argument = argument.trim();
        if argument.is_empty() {
            return None;
        }

        if scheme.eq_ignore_ascii_case("SHA2-PW") {
            Some(Self::Sha2Password(argument.to_ascii_lowercase()))
        } else if scheme.eq_ignore_ascii_case("SSO") {
            Some(Self::Sso(argument.to_string()))
        } else {
            None
        }
    }
}

///
/// MaintainerCredentials
///
/// Checks `auth:` lines (`SHA2-PW <hex>`, `SSO <user>`) of each candidate
/// against the submitted passwords and SSO users.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct MaintainerCredentials;

impl MaintainerCredentials {
    fn accepts(candidate: &Record, ctx: &UpdateContext) -> bool {
        let credentials = ctx.credentials();

        candidate
            .values(AttributeType::Auth)
            .iter()
            .filter_map(|value| AuthScheme::parse(value.as_str()))
            .any(|scheme| match scheme {
                AuthScheme::Sha2Password(expected) => credentials
                    .passwords()
                    .any(|password| sha256_hex(password) == expected),
                AuthScheme::Sso(expected) => credentials
                    .sso_users()
                    .any(|user| user.eq_ignore_ascii_case(&expected)),
            })
    }
}

impl CredentialValidator for MaintainerCredentials {
    fn authenticate(
        &self,
        update: &PreparedUpdate,
        ctx: &UpdateContext,
        candidates: &[Record],
        strategy: &'static str,
    ) -> Vec<Record> {
        let accepted = candidates
            .iter()
            .filter(|candidate| Self::accepts(candidate, ctx))
            .cloned()
            .collect::<Vec<_>>();

        debug!(
            update = %ctx.id(),
            key = %update.key(),
            strategy,
            candidates = candidates.len(),
            accepted = accepted.len(),
            "credential check"
        );

        accepted
    }
}
