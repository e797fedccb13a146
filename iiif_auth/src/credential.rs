//! Finding the credential a request presents
//!
//! Clients that stringify an unset value send `"null"` or `"undefined"`, so
//! those, along with blank strings, count as no credential at all rather than
//! as a token that fails verification.

use iiif_auth_token::AccessTokenRef;

const BEARER_PREFIX: &str = "bearer ";

/// Treats placeholder strings as an absent credential
pub fn normalize(raw: Option<&str>) -> Option<&AccessTokenRef> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
        None
    } else {
        Some(AccessTokenRef::from_str(trimmed))
    }
}

/// The credential in an `Authorization: Bearer` header value
///
/// The scheme is matched case-insensitively. Any other scheme yields no
/// credential.
pub fn from_authorization(header: &str) -> Option<&AccessTokenRef> {
    let prefix = header.get(..BEARER_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(BEARER_PREFIX) {
        normalize(Some(&header[BEARER_PREFIX.len()..]))
    } else {
        None
    }
}

/// The credential a request presents, preferring the `Authorization` header
/// over a query parameter
///
/// An `Authorization` header that holds a placeholder does not hide a query
/// parameter credential.
pub fn presented<'a>(
    authorization: Option<&'a str>,
    query: Option<&'a str>,
) -> Option<&'a AccessTokenRef> {
    authorization
        .and_then(from_authorization)
        .or_else(|| normalize(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_absent() {
        for raw in ["", "   ", "\t\n", "null", "undefined", " null "] {
            assert_eq!(normalize(Some(raw)), None, "{raw:?}");
        }
        assert_eq!(normalize(None), None);
    }

    #[test]
    fn real_values_are_trimmed() {
        assert_eq!(
            normalize(Some(" abc.def.ghi ")).map(AccessTokenRef::as_str),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(
            from_authorization("Bearer abc").map(AccessTokenRef::as_str),
            Some("abc")
        );
        assert_eq!(
            from_authorization("bEaReR abc").map(AccessTokenRef::as_str),
            Some("abc")
        );
        assert_eq!(from_authorization("Basic dXNlcjpwYXNz"), None);
        assert_eq!(from_authorization("Bearer"), None);
        assert_eq!(from_authorization("Bearer undefined"), None);
    }

    #[test]
    fn query_is_used_when_header_holds_a_placeholder() {
        assert_eq!(
            presented(Some("Bearer null"), Some("tok")).map(AccessTokenRef::as_str),
            Some("tok")
        );
        assert_eq!(
            presented(Some("Bearer hdr"), Some("tok")).map(AccessTokenRef::as_str),
            Some("hdr")
        );
        assert_eq!(presented(None, Some("undefined")), None);
    }
}
