mod gemini;
mod health;
mod metrics;
mod pexel;

pub use gemini::gemini_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use pexel::pexel_handler;
