//! Bearer token parsing shared by the authentication middleware and the
//! token endpoints.

use axum::http::{HeaderMap, header::AUTHORIZATION};

/// Outcome of reading the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BearerToken {
    Present(String),
    Missing,
    /// Header present but not `Bearer <token>`
    Malformed,
}

/// Parse `Authorization: Bearer <token>`. The scheme is matched case-insensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> BearerToken {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return BearerToken::Missing;
    };
    let Ok(value) = value.to_str() else {
        return BearerToken::Malformed;
    };

    let mut parts = value.trim().splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = token.trim();
            if token.is_empty() {
                BearerToken::Malformed
            } else {
                BearerToken::Present(token.to_string())
            }
        }
        _ => BearerToken::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_present() {
        assert_eq!(
            extract_bearer_token(&headers("Bearer abc.def")),
            BearerToken::Present("abc.def".into())
        );
        assert_eq!(
            extract_bearer_token(&headers("bearer   abc")),
            BearerToken::Present("abc".into())
        );
    }

    #[test]
    fn test_bearer_token_missing_and_malformed() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), BearerToken::Missing);
        assert_eq!(extract_bearer_token(&headers("Basic dXNlcg==")), BearerToken::Malformed);
        assert_eq!(extract_bearer_token(&headers("Bearer")), BearerToken::Malformed);
        assert_eq!(extract_bearer_token(&headers("Bearer ")), BearerToken::Malformed);
    }
}
