//! Reader discovery

use tracing::{debug, info, warn};

use crate::context::ResourceContext;
use crate::manager::ResourceManager;
use crate::status::Condition;

/// Attempts made when readers change between the size query and the fill
const LIST_ATTEMPTS: usize = 3;

/// Snapshot the names of the attached readers
///
/// Returns an empty list when the context is not valid, when no readers are
/// attached, or when the listing fails.
pub fn list_readers<R: ResourceManager>(context: &ResourceContext<R>) -> Vec<String> {
    if !context.is_valid() {
        debug!("Context not established, no readers to list");
        return Vec::new();
    }

    for _ in 0..LIST_ATTEMPTS {
        let len = match context.list_readers(None) {
            Ok(len) => len,
            Err(status) if status.condition() == Condition::NoReadersAvailable => {
                info!("No readers attached");
                return Vec::new();
            }
            Err(status) => {
                warn!(%status, "Failed to query reader list size");
                return Vec::new();
            }
        };

        let mut buffer = vec![0u8; len];
        match context.list_readers(Some(&mut buffer)) {
            Ok(written) => {
                let readers = parse_multi_string(&buffer[..written.min(len)]);
                info!(count = readers.len(), ?readers, "Listed readers");
                return readers;
            }
            Err(status) if status.condition() == Condition::InsufficientBuffer => {
                debug!("Reader list grew between queries, retrying");
            }
            Err(status) if status.condition() == Condition::NoReadersAvailable => {
                info!("No readers attached");
                return Vec::new();
            }
            Err(status) => {
                warn!(%status, "Failed to list readers");
                return Vec::new();
            }
        }
    }

    warn!("Reader list kept changing, giving up");
    Vec::new()
}

/// Split a null-delimited multi-string, dropping empty entries
pub fn parse_multi_string(buffer: &[u8]) -> Vec<String> {
    buffer
        .split(|&b| b == 0)
        .filter(|name| !name.is_empty())
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect()
}
