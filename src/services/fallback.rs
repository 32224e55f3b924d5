use std::sync::Arc;

use crate::models::RemoteResourceHandle;
use crate::services::control_plane::ControlPlane;

/// How the fallback chain ended.
#[derive(Debug)]
pub enum Resolution {
    /// Processing was confirmed and publish succeeded.
    Published(RemoteResourceHandle),
    /// The asset is usable, but full confirmation was not obtained in time.
    Unconfirmed(RemoteResourceHandle),
}

impl Resolution {
    pub fn into_handle(self) -> RemoteResourceHandle {
        match self {
            Self::Published(handle) | Self::Unconfirmed(handle) => handle,
        }
    }
}

/// Last-resort resolution when polling ran out without confirmation or a
/// post-poll step failed: one more status fetch, then one publish attempt if
/// a URL is present.
///
/// Never fails. The caller gets the best-known handle back whatever happens
/// here, so a run whose blob upload succeeded still yields a usable asset.
pub struct FallbackResolver {
    control: Arc<dyn ControlPlane>,
}

impl FallbackResolver {
    pub fn new(control: Arc<dyn ControlPlane>) -> Self {
        Self { control }
    }

    pub async fn resolve(&self, mut handle: RemoteResourceHandle) -> Resolution {
        match self.control.status(&handle.id).await {
            Ok(status) => {
                if let Some(url) = status.ready_url() {
                    handle.url = Some(url.to_string());
                    handle.stage.advance(status.stage);

                    match self.control.publish(&handle.id).await {
                        Ok(published) => {
                            handle.stage.advance(published.stage);
                            tracing::info!(id = %handle.id, "fallback publish succeeded");
                            return Resolution::Published(handle);
                        }
                        Err(e) => {
                            tracing::warn!(
                                id = %handle.id,
                                error = %e,
                                "fallback publish failed, returning draft asset"
                            );
                        }
                    }
                } else {
                    tracing::warn!(id = %handle.id, "fallback status fetch returned no URL");
                }
            }
            Err(e) => {
                tracing::warn!(id = %handle.id, error = %e, "fallback status fetch failed");
            }
        }

        Resolution::Unconfirmed(handle)
    }
}
