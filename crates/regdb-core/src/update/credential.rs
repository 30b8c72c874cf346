use derive_more::{Deref, IntoIterator};

///
/// Credential
///
/// Credentials supplied alongside one submission.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Credential {
    Password(String),
    SsoUser(String),
    Override { user: String, password: String },
}

impl Credential {
    /// Parse the `user,password` value of an `override:` line.
    #[must_use]
    pub fn parse_override(value: &str) -> Option<Self> {
        let (user, password) = value.split_once(',')?;
        let (user, password) = (user.trim(), password.trim());
        if user.is_empty() || password.is_empty() {
            return None;
        }

        Some(Self::Override {
            user: user.to_string(),
            password: password.to_string(),
        })
    }
}

///
/// Credentials
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, PartialEq)]
pub struct Credentials(Vec<Credential>);

impl Credentials {
    #[must_use]
    pub const fn new(credentials: Vec<Credential>) -> Self {
        Self(credentials)
    }

    pub fn passwords(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|credential| match credential {
            Credential::Password(password) => Some(password.as_str()),
            _ => None,
        })
    }

    pub fn sso_users(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|credential| match credential {
            Credential::SsoUser(user) => Some(user.as_str()),
            _ => None,
        })
    }

    /// The first override credential, if one was supplied.
    #[must_use]
    pub fn override_credential(&self) -> Option<(&str, &str)> {
        self.0.iter().find_map(|credential| match credential {
            Credential::Override { user, password } => Some((user.as_str(), password.as_str())),
            _ => None,
        })
    }
}

impl From<Vec<Credential>> for Credentials {
    fn from(credentials: Vec<Credential>) -> Self {
        Self(credentials)
    }
}

impl FromIterator<Credential> for Credentials {
    fn from_iter<I: IntoIterator<Item = Credential>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_parses_user_and_password() {
        assert_eq!(
            Credential::parse_override(" dbase , secret "),
            Some(Credential::Override {
                user: "dbase".to_string(),
                password: "secret".to_string()
            })
        );
        assert_eq!(Credential::parse_override("no-separator"), None);
        assert_eq!(Credential::parse_override(",secret"), None);
    }

    #[test]
    fn credentials_filter_by_kind() {
        let credentials = Credentials::from(vec![
            Credential::Password("one".to_string()),
            Credential::SsoUser("user@example.net".to_string()),
            Credential::Password("two".to_string()),
        ]);

        assert_eq!(credentials.passwords().collect::<Vec<_>>(), vec!["one", "two"]);
        assert_eq!(credentials.sso_users().collect::<Vec<_>>(), vec!["user@example.net"]);
        assert_eq!(credentials.override_credential(), None);
        assert_eq!(credentials.len(), 3);
    }
}
