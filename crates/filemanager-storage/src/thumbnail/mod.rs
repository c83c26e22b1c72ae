//! Image thumbnails.

pub mod generator;

pub use generator::ThumbnailGenerator;
