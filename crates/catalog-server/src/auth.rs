//! Admin authorization.
//!
//! Mutating catalog endpoints and restricted listings require a bearer
//! token matching the configured admin token. The token may arrive in an
//! `Authorization: Bearer` header or a `session` cookie.

use actix_web::HttpRequest;
use actix_web::http::header;

/// Proof that a request is allowed to mutate the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Principal {
    pub admin: bool,
}

/// Checks request credentials against the configured admin token.
pub struct Authorizer {
    admin_token: Option<String>,
}

impl Authorizer {
    pub fn new(admin_token: Option<String>) -> Self {
        // Empty tokens behave like no token at all.
        let admin_token = admin_token.filter(|t| !t.trim().is_empty());
        Self { admin_token }
    }

    /// Authorize a request. `None` means unauthenticated; with no token
    /// configured every request is unauthenticated and mutations stay
    /// locked out.
    pub fn authorize(&self, req: &HttpRequest) -> Option<Principal> {
        let expected = self.admin_token.as_deref()?;
        let presented = bearer_token(req).or_else(|| session_cookie(req))?;
        if presented == expected {
            Some(Principal { admin: true })
        } else {
            None
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}

fn session_cookie(req: &HttpRequest) -> Option<String> {
    req.cookie("session").map(|c| c.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn authorizes_matching_bearer_token() {
        let auth = Authorizer::new(Some("secret".to_string()));
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer secret"))
            .to_http_request();
        assert_eq!(auth.authorize(&req), Some(Principal { admin: true }));
    }

    #[test]
    fn authorizes_session_cookie() {
        let auth = Authorizer::new(Some("secret".to_string()));
        let req = TestRequest::default()
            .insert_header((header::COOKIE, "session=secret"))
            .to_http_request();
        assert_eq!(auth.authorize(&req), Some(Principal { admin: true }));
    }

    #[test]
    fn rejects_wrong_or_missing_credentials() {
        let auth = Authorizer::new(Some("secret".to_string()));
        let wrong = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer nope"))
            .to_http_request();
        assert_eq!(auth.authorize(&wrong), None);
        let missing = TestRequest::default().to_http_request();
        assert_eq!(auth.authorize(&missing), None);
    }

    #[test]
    fn no_configured_token_rejects_everything() {
        let auth = Authorizer::new(None);
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer anything"))
            .to_http_request();
        assert_eq!(auth.authorize(&req), None);

        let blank = Authorizer::new(Some("   ".to_string()));
        assert_eq!(blank.authorize(&req), None);
    }
}
