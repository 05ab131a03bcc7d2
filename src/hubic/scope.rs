use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Permissions requested when none are configured.
pub const DEFAULT_SCOPE: &str = "account.r,credentials.r";

/// Ordered list of hubiC permissions, e.g. `account.r,credentials.r`.
///
/// Each permission is `name.access` where access is `r`, `w`, `drw`, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope(Vec<String>);

impl Scope {
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        let permissions: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        if permissions.is_empty() {
            return Err(AuthError::Configuration("scope must not be empty".to_string()));
        }

        for permission in &permissions {
            let valid = permission.contains('.')
                && !permission.starts_with('.')
                && !permission.ends_with('.')
                && !permission.contains(['&', '=', ' ', '?', '#']);
            if !valid {
                return Err(AuthError::Configuration(format!(
                    "invalid scope permission {permission:?}: expected name.access"
                )));
            }
        }

        Ok(Self(permissions))
    }

    pub fn permissions(&self) -> &[String] {
        &self.0
    }

    /// Permissions as login form fields: `account.r` becomes `account=r`,
    /// joined with `&` in order.
    pub fn form_fragment(&self) -> String {
        self.0
            .iter()
            .map(|permission| permission.replace('.', "="))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self(DEFAULT_SCOPE.split(',').map(str::to_string).collect())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

impl FromStr for Scope {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Scope {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fragment_preserves_order() {
        let scope = Scope::parse("account.r,credentials.r").unwrap();
        assert_eq!(scope.form_fragment(), "account=r&credentials=r");

        let reversed = Scope::parse("credentials.r,account.r").unwrap();
        assert_eq!(reversed.form_fragment(), "credentials=r&account=r");
    }

    #[test]
    fn test_form_fragment_handles_write_permissions() {
        let scope = Scope::parse("usage.r, activate.w ,links.drw").unwrap();
        assert_eq!(scope.form_fragment(), "usage=r&activate=w&links=drw");
        assert_eq!(scope.to_string(), "usage.r,activate.w,links.drw");
    }

    #[test]
    fn test_default_scope() {
        assert_eq!(Scope::default(), Scope::parse(DEFAULT_SCOPE).unwrap());
    }

    #[test]
    fn test_rejects_malformed_permissions() {
        assert!(Scope::parse("").is_err());
        assert!(Scope::parse("account").is_err());
        assert!(Scope::parse("account.r&x=1").is_err());
        assert!(Scope::parse(".r").is_err());
    }
}
