pub mod http;
pub mod stub;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

pub use http::{EndpointSettings, HttpClassifier};
pub use stub::{ScriptedClassifier, ScriptedReply};

use crate::detect::backend::ClassifierBackend;

/// Build a backend for an endpoint URL. `stub://` selects the offline demo script.
pub fn backend_for_endpoint(url: &str, timeout: Duration) -> Result<Arc<dyn ClassifierBackend>> {
    if url.starts_with("stub://") {
        return Ok(Arc::new(ScriptedClassifier::demo()));
    }
    let settings = EndpointSettings {
        url: url.to_string(),
        timeout,
    };
    Ok(Arc::new(HttpClassifier::new(settings)?))
}
