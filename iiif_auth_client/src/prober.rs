//! Probe transports

use async_trait::async_trait;
use iiif_auth::ProbeResult;
use iiif_auth_clock::Clock;
use iiif_auth_token::AccessTokenRef;
use url::Url;

use crate::ProbeError;

/// Asks a probe service whether a resource is accessible
#[async_trait]
pub trait ProbeClient: Send + Sync {
    /// Probes `resource` at `probe_url`, presenting `credential` if any
    ///
    /// A challenge is a successful probe; errors are reserved for probes
    /// that produced no result at all.
    async fn probe(
        &self,
        probe_url: &Url,
        resource: &str,
        credential: Option<&AccessTokenRef>,
    ) -> Result<ProbeResult, ProbeError>;
}

/// Probes over HTTP, presenting the credential as a bearer token
#[cfg(feature = "http")]
#[derive(Clone, Debug, Default)]
pub struct HttpProber {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpProber {
    /// Constructs a prober using `client`
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl ProbeClient for HttpProber {
    async fn probe(
        &self,
        probe_url: &Url,
        resource: &str,
        credential: Option<&AccessTokenRef>,
    ) -> Result<ProbeResult, ProbeError> {
        let mut request = self
            .client
            .get(probe_url.clone())
            .query(&[("resource", resource)]);
        if let Some(token) = credential {
            request = request.bearer_auth(token.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        if status != 200 && status != 401 {
            return Err(ProbeError::UnexpectedStatus(status));
        }

        let result = response.json::<ProbeResult>().await?;
        tracing::debug!(resource, status, "probed resource");
        Ok(result)
    }
}

/// Probes a service hosted in the same process
///
/// The probe URL is ignored.
#[derive(Clone, Debug)]
pub struct LocalProber<C> {
    service: iiif_auth::ProbeService<C>,
}

impl<C> LocalProber<C> {
    /// Wraps `service`
    pub fn new(service: iiif_auth::ProbeService<C>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<C> ProbeClient for LocalProber<C>
where
    C: Clock + Send + Sync,
{
    async fn probe(
        &self,
        _probe_url: &Url,
        resource: &str,
        credential: Option<&AccessTokenRef>,
    ) -> Result<ProbeResult, ProbeError> {
        Ok(self.service.probe(resource, credential))
    }
}
