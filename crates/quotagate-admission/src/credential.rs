// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller credential extraction from the `Authorization` header.
//!
//! The proxy never validates the key itself; it only checks the header has
//! the shape `Bearer <token>` and forwards the token upstream.

use quotagate_core::QuotaError;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the bearer token from a raw `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, QuotaError> {
    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => {
            return Err(QuotaError::unauthorized(
                "missing Authorization header. Use: Authorization: Bearer your-api-key",
            ));
        }
    };

    let token = header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        QuotaError::unauthorized(
            "invalid Authorization header format. Use: Authorization: Bearer your-api-key",
        )
    })?;

    if token.trim().is_empty() {
        return Err(QuotaError::unauthorized(
            "empty API key. Use: Authorization: Bearer your-api-key",
        ));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotagate_core::ErrorKind;

    #[test]
    fn valid_bearer_returns_token() {
        assert_eq!(bearer_token(Some("Bearer sk-test-key")).unwrap(), "sk-test-key");
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let err = bearer_token(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(err.to_string().contains("missing Authorization"));
    }

    #[test]
    fn empty_header_is_unauthorized() {
        let err = bearer_token(Some("")).unwrap_err();
        assert!(err.to_string().contains("missing Authorization"));
    }

    #[test]
    fn no_bearer_prefix_is_unauthorized() {
        for header in ["sk-test-key", "bearer sk-test-key", "Basic abc", "Bearer"] {
            let err = bearer_token(Some(header)).unwrap_err();
            assert!(
                err.to_string().contains("invalid Authorization header format"),
                "{header}: {err}"
            );
        }
    }

    #[test]
    fn empty_token_is_unauthorized() {
        for header in ["Bearer ", "Bearer    "] {
            let err = bearer_token(Some(header)).unwrap_err();
            assert!(err.to_string().contains("empty API key"), "{header}: {err}");
        }
    }
}
