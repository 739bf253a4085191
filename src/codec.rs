//! Encoding of cached listing pages.
//!
//! Cached values are JSON envelopes carrying a format version and the time
//! they were produced. Decoding checks the envelope against the request it is
//! meant to answer; anything that does not fit is reported as
//! [`CacheError::MalformedPayload`] and the caller treats it as a miss.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CacheError, CacheResult};
use crate::model::{PageRequest, PageResult};

/// Version of the cached payload format. Part of every cache key.
pub const PAYLOAD_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CachedPageRef<'a> {
    version: u32,
    cached_at: DateTime<Utc>,
    page: &'a PageResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CachedPage {
    version: u32,
    #[allow(dead_code)]
    cached_at: DateTime<Utc>,
    page: PageResult,
}

/// Serializes a page for storage in the cache.
pub fn encode_page(page: &PageResult) -> CacheResult<String> {
    let envelope = CachedPageRef {
        version: PAYLOAD_VERSION,
        cached_at: Utc::now(),
        page,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Deserializes a cached page and checks that it answers `request` for `owner_id`.
pub fn decode_page(payload: &str, owner_id: Uuid, request: PageRequest) -> CacheResult<PageResult> {
    let envelope: CachedPage = serde_json::from_str(payload)?;

    if envelope.version != PAYLOAD_VERSION {
        return Err(CacheError::MalformedPayload(format!(
            "unsupported payload version {}",
            envelope.version
        )));
    }

    let page = envelope.page;
    if page.page != request.page() || page.page_size != request.page_size() {
        return Err(CacheError::MalformedPayload(format!(
            "payload is for page {} size {}, expected page {} size {}",
            page.page,
            page.page_size,
            request.page(),
            request.page_size()
        )));
    }
    // Count and slice come from one snapshot, so the slice length is fully determined.
    let expected = page
        .total_items
        .saturating_sub(request.offset())
        .min(u64::from(request.page_size()));
    if page.items.len() as u64 != expected {
        return Err(CacheError::MalformedPayload(format!(
            "{} items at offset {} do not fit a total of {} (expected {})",
            page.items.len(),
            request.offset(),
            page.total_items,
            expected
        )));
    }
    if let Some(foreign) = page.items.iter().find(|todo| todo.owner_id != owner_id) {
        return Err(CacheError::MalformedPayload(format!(
            "todo {} belongs to owner {}, not {}",
            foreign.id, foreign.owner_id, owner_id
        )));
    }

    Ok(page)
}
