//! The persisted folder tree: flat arena records, the sled-backed store, the
//! reconciling sync engine and the per-principal filter/promoter.

pub mod node;
pub mod promote;
pub mod store;
pub mod sync;

pub use node::FolderRecord;
pub use promote::{TreeFilterPromoter, VisibleNode};
pub use store::FolderStore;
pub use sync::{FolderSyncEngine, SyncReport};
