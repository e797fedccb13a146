//! Server configuration

use std::net::SocketAddr;

use iiif_auth::{Authority, DemoCredentials, ServiceCatalog};
use iiif_auth_clock::DurationSecs;
use iiif_auth_token::{KioskPasses, SigningSecret, TokenCodec};
use url::Url;

use crate::AppState;

/// Command line and environment configuration for the demo server
#[derive(Clone, clap::Parser)]
#[command(name = "iiif-auth-demo", version, about)]
pub struct Config {
    /// The socket address to bind
    #[arg(long, env = "IIIF_AUTH_LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// The externally visible base URL used in every service identifier
    #[arg(long, env = "IIIF_AUTH_PUBLIC_URL", default_value = "http://localhost:3000")]
    pub public_url: Url,

    /// The HMAC secret used to sign access tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Refuse to start without a configured signing secret
    #[arg(long, env = "IIIF_AUTH_REQUIRE_SECRET")]
    pub require_secret: bool,

    /// Access token lifetime, in seconds
    #[arg(long, env = "IIIF_AUTH_TOKEN_TTL", default_value_t = 3_600)]
    pub token_ttl: u64,

    /// Kiosk pass lifetime, in seconds
    #[arg(long, env = "IIIF_AUTH_KIOSK_TTL", default_value_t = 3_600)]
    pub kiosk_ttl: u64,

    /// The username accepted by the interactive login
    #[arg(long, env = "IIIF_AUTH_DEMO_USERNAME", default_value = "user")]
    pub demo_username: String,

    /// The password accepted by the interactive login
    #[arg(
        long,
        env = "IIIF_AUTH_DEMO_PASSWORD",
        default_value = "pass",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub demo_password: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("listen", &self.listen)
            .field("public_url", &self.public_url.as_str())
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "***"))
            .field("require_secret", &self.require_secret)
            .field("token_ttl", &self.token_ttl)
            .field("kiosk_ttl", &self.kiosk_ttl)
            .field("demo_username", &self.demo_username)
            .finish_non_exhaustive()
    }
}

/// The server cannot start with this configuration
#[derive(Clone, Copy, Debug, thiserror::Error)]
pub enum ConfigError {
    /// A signing secret is required but none was configured
    #[error("JWT_SECRET must be set when --require-secret is enabled")]
    MissingSecret,
    /// A lifetime of zero would make every credential expire on issue
    #[error("{0} must be at least one second")]
    ZeroLifetime(&'static str),
}

impl Config {
    /// The signing secret, falling back to the development default
    ///
    /// # Errors
    ///
    /// Returns an error if no secret is configured and one is required.
    pub fn signing_secret(&self) -> Result<SigningSecret, ConfigError> {
        let configured = self
            .jwt_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if configured.is_none() && self.require_secret {
            return Err(ConfigError::MissingSecret);
        }

        Ok(SigningSecret::from_configured(configured))
    }

    /// Builds the shared application state
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unusable.
    pub fn app_state(&self) -> Result<AppState, ConfigError> {
        if self.token_ttl == 0 {
            return Err(ConfigError::ZeroLifetime("--token-ttl"));
        }
        if self.kiosk_ttl == 0 {
            return Err(ConfigError::ZeroLifetime("--kiosk-ttl"));
        }

        let codec =
            TokenCodec::new(self.signing_secret()?).with_ttl(DurationSecs(self.token_ttl));
        let kiosk = KioskPasses::new().with_ttl(DurationSecs(self.kiosk_ttl));

        Ok(AppState::new(
            Authority::new(codec, kiosk),
            ServiceCatalog::new(self.public_url.clone()),
            DemoCredentials::new(&self.demo_username, &self.demo_password),
        ))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        Config::try_parse_from(std::iter::once("iiif-auth-demo").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_describe_a_local_demo() -> color_eyre::Result<()> {
        let config = parse(&[])?;

        assert_eq!(config.listen, "127.0.0.1:3000".parse()?);
        assert_eq!(config.public_url.as_str(), "http://localhost:3000/");
        assert_eq!(config.token_ttl, 3_600);
        assert_eq!(config.demo_username, "user");
        Ok(())
    }

    #[test]
    fn required_secret_must_be_present() -> color_eyre::Result<()> {
        let config = parse(&["--require-secret"])?;
        if config.jwt_secret.is_none() {
            assert!(matches!(
                config.signing_secret(),
                Err(ConfigError::MissingSecret)
            ));
        }

        let config = parse(&["--require-secret", "--jwt-secret", "s3cr3t"])?;
        assert!(!config.signing_secret()?.is_insecure());
        Ok(())
    }

    #[test]
    fn blank_secret_does_not_satisfy_requirement() -> color_eyre::Result<()> {
        let config = parse(&["--require-secret", "--jwt-secret", "   "])?;
        assert!(matches!(
            config.signing_secret(),
            Err(ConfigError::MissingSecret)
        ));

        let config = parse(&["--jwt-secret", " \t "])?;
        assert!(config.signing_secret()?.is_insecure());
        Ok(())
    }

    #[test]
    fn zero_lifetimes_are_rejected() -> color_eyre::Result<()> {
        let config = parse(&["--token-ttl", "0"])?;
        assert!(matches!(
            config.app_state(),
            Err(ConfigError::ZeroLifetime("--token-ttl"))
        ));
        Ok(())
    }

    #[test]
    fn secrets_are_not_debug_printed() -> color_eyre::Result<()> {
        let config = parse(&["--jwt-secret", "hunter2", "--demo-password", "letmein"])?;
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("letmein"));
        Ok(())
    }
}
