//! Media item representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suffix requesting the original image bytes.
const IMAGE_DOWNLOAD_SUFFIX: &str = "=d";

/// Suffix requesting the original video bytes.
const VIDEO_DOWNLOAD_SUFFIX: &str = "=dv";

/// Type of media content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
}

/// A library item as returned by the search endpoint.
///
/// `base_url` is a short-lived signed URL. It is only valid for the run that
/// fetched it and is never persisted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,

    #[serde(default)]
    pub filename: String,

    #[serde(default)]
    pub mime_type: String,

    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub product_url: Option<String>,

    #[serde(default)]
    pub media_metadata: Option<MediaMetadata>,
}

/// Creation time and dimensions. Width and height arrive as strings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub width: Option<String>,

    #[serde(default)]
    pub height: Option<String>,

    #[serde(default)]
    pub photo: Option<PhotoMetadata>,

    #[serde(default)]
    pub video: Option<VideoMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMetadata {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub focal_length: Option<f64>,
    pub aperture_f_number: Option<f64>,
    pub iso_equivalent: Option<u32>,
    pub exposure_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub fps: Option<f64>,
    pub status: Option<String>,
}

impl MediaItem {
    /// Media type from the MIME type, falling back to the metadata block.
    pub fn media_type(&self) -> MediaType {
        let video_metadata = self
            .media_metadata
            .as_ref()
            .is_some_and(|m| m.video.is_some());

        if self.mime_type.starts_with("video") || video_metadata {
            MediaType::Video
        } else {
            MediaType::Image
        }
    }

    pub fn is_video(&self) -> bool {
        self.media_type() == MediaType::Video
    }

    /// Content URL asking for the original resolution.
    pub fn download_url(&self) -> String {
        let suffix = match self.media_type() {
            MediaType::Image => IMAGE_DOWNLOAD_SUFFIX,
            MediaType::Video => VIDEO_DOWNLOAD_SUFFIX,
        };
        format!("{}{}", self.base_url, suffix)
    }

    /// Creation time reported by the provider, if any.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.media_metadata.as_ref().and_then(|m| m.creation_time)
    }

    /// Pixel dimensions, when both are present and numeric.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let metadata = self.media_metadata.as_ref()?;
        let width = metadata.width.as_deref()?.parse().ok()?;
        let height = metadata.height.as_deref()?.parse().ok()?;
        Some((width, height))
    }
}
