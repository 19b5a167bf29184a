use std::sync::Arc;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::vendors::{GeminiClient, PexelsClient, PhotoSearch, TextGenerator, VendorError};

// Cache and vendor clients shared by the proxy routes
pub struct AppState {
    pub cache: Arc<TtlCache>,
    pub text: Option<Arc<dyn TextGenerator>>, // None when no key is configured
    pub photos: Option<Arc<dyn PhotoSearch>>,
}

impl AppState {
    pub fn new(cache: Arc<TtlCache>) -> Self {
        Self {
            cache,
            text: None,
            photos: None,
        }
    }

    pub fn with_text_generator(mut self, text: Arc<dyn TextGenerator>) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_photo_search(mut self, photos: Arc<dyn PhotoSearch>) -> Self {
        self.photos = Some(photos);
        self
    }

    // Vendor clients are only built for the keys that are present
    pub fn from_config(config: &Config, cache: Arc<TtlCache>) -> Result<Self, VendorError> {
        let mut state = Self::new(cache);

        if let Some(key) = &config.gemini_key {
            let client = GeminiClient::new(key.clone(), config.gemini_model.clone(), config.vendor_timeout)?;
            state = state.with_text_generator(Arc::new(client));
        }

        if let Some(key) = &config.pexel_key {
            let client = PexelsClient::new(key.clone(), config.vendor_timeout)?;
            state = state.with_photo_search(Arc::new(client));
        }

        Ok(state)
    }
}
