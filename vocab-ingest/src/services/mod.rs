//! Remote service clients
//!
//! Concrete `Translator` and `ImageGenerator` implementations over HTTP plus
//! the translation cache decorator.

pub mod image_client;
pub mod translation_cache;
pub mod translation_client;

pub use image_client::HttpImageGenerator;
pub use translation_cache::{CachedTranslator, TranslationCache};
pub use translation_client::HttpTranslator;
