use std::time::Duration;

use tracing::debug;

use lectio_config::QueueSettings;

/// Lightweight reachability probe the worker runs before claiming a job.
///
/// Some deployments fetch acoustic-model weights on first use, so the
/// pipeline never starts against an assumption of connectivity it does not
/// have; an unreachable probe just skips the cycle.
pub struct ConnectivityProbe {
    client: reqwest::Client,
    url: String,
}

impl ConnectivityProbe {
    pub fn new(settings: &QueueSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.connectivity_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: settings.connectivity_probe_url.clone(),
        }
    }

    /// `true` when the probe endpoint answers within the timeout.
    pub async fn is_online(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!(url = %self.url, error = %e, "Connectivity probe failed");
                false
            }
        }
    }
}
