//! Remote annotation index, per-map annotations and raw image downloads.
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::core::layout::StagingLayout;
use crate::core::params::Endpoints;
use crate::error::{Error, Result};
use crate::io::annotation::{AnnotationPage, map_id_from};

/// Read-only transport to the remote services
pub trait AnnotationService {
    fn fetch_json(&self, url: &str) -> Result<Value>;
    /// Stream the body at `url` into `dest`, returning the byte count
    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64>;
}

/// Blocking HTTP transport
pub struct HttpAnnotationService {
    client: reqwest::blocking::Client,
}

impl HttpAnnotationService {
    pub fn new() -> Result<Self> {
        // Large source TIFFs can take a while; only bound connection setup
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(None)
            .user_agent(concat!("platewarp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        debug!("GET {}", url);
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(Error::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

impl AnnotationService for HttpAnnotationService {
    fn fetch_json(&self, url: &str) -> Result<Value> {
        Ok(self.get(url)?.json()?)
    }

    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        let mut response = self.get(url)?;
        Ok(std::io::copy(&mut response, dest)?)
    }
}

/// Map ids listed by the annotation index for `identifier`.
///
/// An index without an `items` key means nobody has georeferenced the
/// manifest yet; that aborts the step with the editor link.
pub fn list_map_ids(
    service: &dyn AnnotationService,
    endpoints: &Endpoints,
    identifier: &str,
) -> Result<Vec<String>> {
    let index = service.fetch_json(&endpoints.annotation_index_url(identifier))?;
    let Some(items) = index.get("items").and_then(Value::as_array) else {
        return Err(Error::NoGeoreferenceAnnotations {
            identifier: identifier.to_string(),
            remediation: endpoints.collection_editor_url(identifier),
        });
    };
    let mut ids: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if let Some(id) = item.get("id").and_then(Value::as_str) {
            let id = map_id_from(id);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}

/// Fetch one map's annotation and persist it verbatim as `<map_id>.json`.
/// Returns the source image URLs it references.
pub fn fetch_annotation(
    service: &dyn AnnotationService,
    endpoints: &Endpoints,
    layout: &StagingLayout,
    map_id: &str,
) -> Result<Vec<String>> {
    let url = endpoints.map_annotation_url(map_id);
    info!("Downloading annotation {}", url);
    let body = service.fetch_json(&url)?;
    let path = layout.annotation(map_id);
    let page: AnnotationPage =
        serde_json::from_value(body.clone()).map_err(|e| Error::MalformedAnnotation {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    std::fs::write(&path, serde_json::to_vec(&body)?)?;
    Ok(page
        .items
        .iter()
        .map(|item| item.target.source.url().to_string())
        .collect())
}

/// Download `url` to `dest` unless `dest` already exists.
/// Bytes land in a temporary file beside `dest` that is renamed on success,
/// so an interrupted download never looks complete.
pub fn download_if_missing(
    service: &dyn AnnotationService,
    url: &str,
    dest: &Path,
) -> Result<Option<u64>> {
    if dest.exists() {
        info!("Skipping {:?}, already exists...", dest);
        return Ok(None);
    }
    info!("Downloading image {}", url);
    let dir = dest
        .parent()
        .ok_or_else(|| Error::Processing(format!("no parent directory for {:?}", dest)))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".download-")
        .suffix(".part")
        .tempfile_in(dir)?;
    let bytes = service.download(url, tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    debug!("Wrote {} bytes to {:?}", bytes, dest);
    Ok(Some(bytes))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Write;

    use serde_json::Value;

    use super::AnnotationService;
    use crate::error::{Error, Result};

    /// In-memory service keyed by URL
    #[derive(Default)]
    pub struct FakeService {
        pub json: HashMap<String, Value>,
        pub blobs: HashMap<String, Vec<u8>>,
        pub requests: RefCell<Vec<String>>,
    }

    impl AnnotationService for FakeService {
        fn fetch_json(&self, url: &str) -> Result<Value> {
            self.requests.borrow_mut().push(url.to_string());
            self.json.get(url).cloned().ok_or(Error::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
        }

        fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
            self.requests.borrow_mut().push(url.to_string());
            let bytes = self.blobs.get(url).ok_or(Error::HttpStatus {
                status: 404,
                url: url.to_string(),
            })?;
            dest.write_all(bytes)?;
            Ok(bytes.len() as u64)
        }
    }
}
