use serde::{Deserialize, Serialize};

/// Identity handed over by the external auth provider. The daemon does not
/// authenticate; it only records who is signed in and whether anyone is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl AuthUser {
    /// Name shown before a profile exists: the email's local part.
    pub fn fallback_name(&self) -> &str {
        self.email
            .split_once('@')
            .map(|(local, _)| local)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.email)
    }
}

/// Methods reachable without an open session.
pub fn is_public_method(method: &str) -> bool {
    matches!(
        method,
        "health" | "workspace.select" | "session.open" | "session.get" | "session.close"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_name_uses_local_part() {
        let u = AuthUser {
            user_id: "u1".into(),
            email: "motorista@escola.br".into(),
            avatar_url: None,
        };
        assert_eq!(u.fallback_name(), "motorista");

        let odd = AuthUser {
            email: "@escola.br".into(),
            ..u
        };
        assert_eq!(odd.fallback_name(), "@escola.br");
    }

    #[test]
    fn only_bootstrap_methods_are_public() {
        assert!(is_public_method("health"));
        assert!(is_public_method("session.open"));
        assert!(!is_public_method("students.list"));
        assert!(!is_public_method("reports.summary"));
    }
}
