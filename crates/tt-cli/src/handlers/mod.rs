pub mod events;
pub mod import;
pub mod report;
pub mod status;
pub mod stream;
pub mod sync;
pub mod tag;

use std::path::Path;

use anyhow::Result;
use tt_store::EventStore;

/// Open a database that must already exist; querying commands should not
/// silently create an empty one.
fn open_existing(db_path: &Path) -> Result<EventStore> {
    if !db_path.exists() {
        anyhow::bail!("No database found at {}", db_path.display());
    }
    Ok(EventStore::open(db_path)?)
}
