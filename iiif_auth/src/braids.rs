use aliri_braid::braid;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use url::Url;

use crate::error;

const MESSAGE_ID_LEN: usize = 16;

/// The correlation identifier threading one login attempt through the
/// access service, the token service, and back to the opener
#[braid(serde)]
pub struct MessageId;

impl MessageId {
    /// Generates a fresh, high-entropy correlation identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the system random source fails.
    pub fn generate() -> Result<Self, error::RandomnessUnavailable> {
        Self::generate_with_rng(&SystemRandom::new())
    }

    /// Generates a correlation identifier from the provided source of randomness
    ///
    /// # Errors
    ///
    /// Returns an error if `rng` fails.
    pub fn generate_with_rng(
        rng: &dyn SecureRandom,
    ) -> Result<Self, error::RandomnessUnavailable> {
        let mut raw = [0_u8; MESSAGE_ID_LEN];
        rng.fill(&mut raw)
            .map_err(|_| error::randomness_unavailable())?;
        Ok(Self::new(URL_SAFE_NO_PAD.encode(raw)))
    }
}

/// A web origin in its ASCII serialization, such as `https://viewer.example`
///
/// Only `http` and `https` tuple origins are representable. Opaque origins,
/// `null`, and the `*` wildcard are rejected, so a value of this type is
/// always safe to use as the target of a cross-window message.
#[braid(
    serde,
    validator,
    ref_doc = "A borrowed reference to a web [`Origin`]"
)]
pub struct Origin;

impl aliri_braid::Validator for Origin {
    type Error = error::InvalidOrigin;

    /// Accepts only the exact ASCII serialization of an `http(s)` origin
    fn validate(s: &str) -> Result<(), Self::Error> {
        let normalized = normalize(s)?;
        if normalized == s {
            Ok(())
        } else {
            Err(error::invalid_origin(s))
        }
    }
}

impl Origin {
    /// Parses a declared origin, normalizing it to its ASCII serialization
    ///
    /// Any URL is accepted and reduced to its origin, so a `Referer` value
    /// yields the origin of the referring page.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an absolute `http(s)` URL.
    pub fn parse(declared: &str) -> Result<Self, error::InvalidOrigin> {
        Self::new(normalize(declared)?)
    }

    /// The origin of `url`
    ///
    /// # Errors
    ///
    /// Returns an error if `url` does not have an `http(s)` tuple origin.
    pub fn of(url: &Url) -> Result<Self, error::InvalidOrigin> {
        Self::new(origin_of(url, url.as_str())?)
    }
}

fn normalize(declared: &str) -> Result<String, error::InvalidOrigin> {
    let trimmed = declared.trim();
    let url = Url::parse(trimmed).map_err(|_| error::invalid_origin(declared))?;
    origin_of(&url, declared)
}

fn origin_of(url: &Url, declared: &str) -> Result<String, error::InvalidOrigin> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(error::invalid_origin(declared));
    }

    let origin = url.origin();
    if origin.is_tuple() {
        Ok(origin.ascii_serialization())
    } else {
        Err(error::invalid_origin(declared))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_message_ids_are_distinct() -> color_eyre::Result<()> {
        let a = MessageId::generate()?;
        let b = MessageId::generate()?;
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 22);
        Ok(())
    }

    #[test]
    fn origin_is_normalized_from_any_url() -> color_eyre::Result<()> {
        assert_eq!(
            Origin::parse("HTTPS://Viewer.Example:443/path?q=1")?.as_str(),
            "https://viewer.example"
        );
        assert_eq!(
            Origin::parse("http://localhost:3001")?.as_str(),
            "http://localhost:3001"
        );
        Ok(())
    }

    #[test]
    fn wildcard_null_and_garbage_are_not_origins() {
        for declared in [
            "*",
            "null",
            "",
            "   ",
            "viewer.example",
            "javascript:alert(1)",
            "file:///etc/passwd",
            "data:text/html,x",
        ] {
            assert!(
                Origin::parse(declared).is_err(),
                "{declared:?} should be rejected"
            );
        }
    }

    #[test]
    fn validated_construction_requires_normalized_form() {
        assert!(Origin::new("https://viewer.example".to_owned()).is_ok());
        assert!(Origin::new("https://viewer.example/".to_owned()).is_err());
        assert!(OriginRef::from_str("*").is_err());
    }

    #[test]
    fn origin_deserialization_rejects_wildcard() {
        let result: Result<Origin, _> = serde_json::from_str("\"*\"");
        assert!(result.is_err());
    }
}
