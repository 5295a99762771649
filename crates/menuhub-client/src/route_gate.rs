//! Request-level gate for the web front end.
//!
//! Decides from cookie presence alone (never token validity) whether a path
//! may be served, or where the visitor should be redirected.

use crate::store::{parse_cookie_header, REFRESH_KEY, SESSION_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Pass,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct RouteGate {
    /// Sign-in / sign-up pages, only for visitors without a session
    pub public_routes: Vec<String>,
    /// Prefixes that are never gated
    pub passthrough_prefixes: Vec<String>,
    pub login_path: String,
    pub workspace_path: String,
}

impl Default for RouteGate {
    fn default() -> Self {
        Self {
            public_routes: vec![
                "/auth/login".to_string(),
                "/auth/signOtp".to_string(),
                "/auth/register".to_string(),
            ],
            passthrough_prefixes: vec!["/api/".to_string()],
            login_path: "/auth/login".to_string(),
            workspace_path: "/workspace/business".to_string(),
        }
    }
}

impl RouteGate {
    /// Decide for `path` given the raw `Cookie` request header.
    pub fn decide(&self, path: &str, cookie_header: Option<&str>) -> RouteDecision {
        if self.passthrough_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return RouteDecision::Pass;
        }

        let is_public = self.public_routes.iter().any(|r| path.starts_with(r.as_str()));

        match (has_session(cookie_header), is_public) {
            (true, true) => RouteDecision::Redirect(self.workspace_path.clone()),
            (true, false) | (false, true) => RouteDecision::Pass,
            (false, false) => RouteDecision::Redirect(self.login_redirect(path)),
        }
    }

    fn login_redirect(&self, from: &str) -> String {
        let query: String =
            url::form_urlencoded::Serializer::new(String::new()).append_pair("redirect", from).finish();
        format!("{}?{}", self.login_path, query)
    }
}

/// Both session cookies present and non-empty.
pub fn has_session(cookie_header: Option<&str>) -> bool {
    let Some(header) = cookie_header else {
        return false;
    };
    let cookies = parse_cookie_header(header);
    [SESSION_KEY, REFRESH_KEY]
        .iter()
        .all(|name| cookies.get(name).is_some_and(|v| !v.is_empty()))
}
