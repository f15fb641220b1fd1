//! Media module for item representation and index fetching.

pub mod index;
pub mod item;

pub use index::{year_bounds, MediaIndexFetcher, PAGE_SIZE};
pub use item::{MediaItem, MediaMetadata, MediaType, PhotoMetadata, VideoMetadata};
