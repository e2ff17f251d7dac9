use std::sync::Arc;

use form_engine::service::memory::InMemoryFormService;
use form_engine::{FormService, ServiceError};
use tracing::info;

use crate::config::ServiceConfig;

pub mod http;

pub use http::HttpFormService;

/// Pick the form service: the built-in demo form when `offline`, the HTTP
/// service at `config.base_url` otherwise.
pub fn connect(
    config: &ServiceConfig,
    offline: bool,
) -> Result<Arc<dyn FormService>, ServiceError> {
    if offline {
        info!("using the built-in demo form");
        return Ok(Arc::new(InMemoryFormService::demo()));
    }
    info!(base_url = %config.base_url, "using the HTTP form service");
    Ok(Arc::new(HttpFormService::new(
        &config.base_url,
        config.request_timeout(),
    )?))
}
