use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::cache::{gemini_cache_key, pexel_cache_key};
use crate::error::ProxyError;
use crate::markdown::to_plain_text;
use crate::metrics::{CACHE_HITS, CACHE_MISSES, VENDOR_FAILURES, VENDOR_LATENCY};
use crate::models::{GeminiRequest, PexelRequest};
use crate::state::AppState;
use crate::vendors::{PhotoSearch, TextGenerator, VendorError};

// Empty results are never served from the cache
fn is_cacheable(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Ask the text model and flatten its markdown. Missing configuration or
/// input gives an empty string instead of an error.
pub async fn run_ai(
    generator: Option<&dyn TextGenerator>,
    prompt: &str,
    system_instruction: &str,
) -> Result<String, VendorError> {
    let Some(generator) = generator else {
        warn!("GEMINI_KEY is not configured, answering with an empty result");
        return Ok(String::new());
    };
    if prompt.is_empty() {
        warn!("Empty prompt given");
        return Ok(String::new());
    }
    if system_instruction.is_empty() {
        warn!("Empty system instruction given");
        return Ok(String::new());
    }

    let start = Instant::now();
    let text = generator.generate(prompt, system_instruction).await;
    VENDOR_LATENCY
        .with_label_values(&["gemini"])
        .observe(start.elapsed().as_secs_f64());

    Ok(to_plain_text(text?.trim()))
}

/// Search photos. Same empty-result policy as [`run_ai`].
pub async fn get_photos(
    search: Option<&dyn PhotoSearch>,
    query: &str,
    items: Option<u32>,
) -> Result<Value, VendorError> {
    let Some(search) = search else {
        warn!("PEXEL_KEY is not configured, answering with an empty result");
        return Ok(Value::String(String::new()));
    };
    if query.is_empty() {
        warn!("Empty query given");
        return Ok(Value::String(String::new()));
    }

    let start = Instant::now();
    let photos = search.search(query, items).await;
    VENDOR_LATENCY
        .with_label_values(&["pexels"])
        .observe(start.elapsed().as_secs_f64());

    match photos? {
        Value::Null => Ok(Value::String(String::new())),
        photos => Ok(photos),
    }
}

pub async fn cached_gemini(state: &AppState, req: &GeminiRequest) -> Result<String, ProxyError> {
    let system_instruction = req.system_instruction();
    let cache_key = gemini_cache_key(req.prompt(), req.kind(), &system_instruction);

    // A fresh stored answer skips the vendor
    if let Some(Value::String(cached)) = state.cache.get(&cache_key) {
        if !cached.is_empty() {
            CACHE_HITS.inc();
            debug!(key = %cache_key, "Cache HIT");
            return Ok(cached);
        }
    }
    CACHE_MISSES.inc();
    debug!(key = %cache_key, "Cache MISS - calling text model");

    let result = run_ai(state.text.as_deref(), req.prompt(), &system_instruction)
        .await
        .map_err(|source| {
            VENDOR_FAILURES.with_label_values(&["gemini"]).inc();
            error!("Text model call failed: {}", source);
            ProxyError::Vendor {
                vendor: "gemini",
                source,
            }
        })?;

    let value = Value::String(result.clone());
    if is_cacheable(&value) {
        state.cache.set(cache_key, value);
    }
    Ok(result)
}

pub async fn cached_pexel(state: &AppState, req: &PexelRequest) -> Result<Value, ProxyError> {
    // page size deliberately left out of the key
    let cache_key = pexel_cache_key(req.query());

    if let Some(cached) = state.cache.get(&cache_key) {
        if is_cacheable(&cached) {
            CACHE_HITS.inc();
            debug!(key = %cache_key, "Cache HIT");
            return Ok(cached);
        }
    }
    CACHE_MISSES.inc();
    debug!(key = %cache_key, "Cache MISS - searching photos");

    let photos = get_photos(state.photos.as_deref(), req.query(), req.items)
        .await
        .map_err(|source| {
            VENDOR_FAILURES.with_label_values(&["pexels"]).inc();
            error!("Photo search failed: {}", source);
            ProxyError::Vendor {
                vendor: "pexels",
                source,
            }
        })?;

    if is_cacheable(&photos) {
        state.cache.set(cache_key, photos.clone());
    }
    Ok(photos)
}
