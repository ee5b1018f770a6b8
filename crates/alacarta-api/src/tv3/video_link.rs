//! Playable media URL resolution.

use tracing::instrument;

use super::api::LocalAlacartaApi;
use super::error::{AlacartaError, Result};
use super::params::{QueryParams, WebServiceRequest};

const INFO_METHOD: &str = "pvideo/FLV_bbd_dadesItem.jsp";
const MEDIA_METHOD: &str = "pvideo/FLV_bbd_media.jsp";

/// Quality preference, best first.
const PREFERRED_QUALITIES: [&str; 2] = ["H", "M"];

/// A stream variant advertised for a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamVariant {
    /// Quality code (`qualitat`), e.g. `H` or `M`.
    pub quality: String,
    /// Container format (`format`), e.g. `MP4`.
    pub format: String,
}

/// Resolves a video ID to its media URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoLink {
    /// Video ID.
    pub id: u64,
}

impl VideoLink {
    /// Creates a link for video `id`.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self { id }
    }

    /// Lists the stream variants of the video, in document order.
    ///
    /// # Errors
    ///
    /// Propagates the client error.
    pub async fn variants(&self, api: &(impl LocalAlacartaApi + Sync)) -> Result<Vec<StreamVariant>> {
        let request = WebServiceRequest::new(
            INFO_METHOD,
            QueryParams::new().with("idint", self.id.to_string()),
        );
        let xml = api.execute(&request, true).await?;
        Ok(xml
            .elements("video")
            .into_iter()
            .map(|video| StreamVariant {
                quality: video.field("qualitat").unwrap_or_default(),
                format: video.field("format").unwrap_or_default(),
            })
            .collect())
    }

    /// Picks the stream variant to play: `H`, else `M`, else the first listed.
    ///
    /// # Errors
    ///
    /// Returns `Service` when the video advertises no variant.
    pub async fn resolve_variant(
        &self,
        api: &(impl LocalAlacartaApi + Sync),
    ) -> Result<StreamVariant> {
        let variants = self.variants(api).await?;
        choose_variant(variants).ok_or_else(|| {
            AlacartaError::Service(format!("no stream variants for video {}", self.id))
        })
    }

    /// Resolves the playable media URL.
    ///
    /// # Errors
    ///
    /// Returns `Service` when no variant or no `media` element is found, and
    /// propagates client errors from either call.
    #[instrument(skip_all, fields(video_id = self.id))]
    pub async fn resolve_url(&self, api: &(impl LocalAlacartaApi + Sync)) -> Result<String> {
        let variant = self.resolve_variant(api).await?;
        tracing::debug!(quality = %variant.quality, format = %variant.format, "Stream variant chosen");

        let request = WebServiceRequest::new(
            MEDIA_METHOD,
            QueryParams::new()
                .with("ID", self.id.to_string())
                .with("QUALITY", variant.quality)
                .with("FORMAT", variant.format)
                .with("PROFILE", "HTML5"),
        );
        let xml = api.execute(&request, true).await?;
        xml.field("media")
            .ok_or_else(|| AlacartaError::Service(format!("no media URL for video {}", self.id)))
    }
}

fn choose_variant(variants: Vec<StreamVariant>) -> Option<StreamVariant> {
    PREFERRED_QUALITIES
        .iter()
        .find_map(|q| variants.iter().find(|v| v.quality == *q).cloned())
        .or_else(|| variants.into_iter().next())
}
