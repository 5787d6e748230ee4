/**
 * Access point identifiers and the key prefix
 *  every operation is confined to.
 */
pub mod scope;
/**
 * Connection credentials. Held in memory only,
 *  redacted in debug output.
 */
pub mod credentials;
/**
 * Error taxonomy shared by all dropzone operations.
 */
pub mod error;
/**
 * Zero-byte folder markers.
 */
pub mod folder;
/**
 * Delimiter-scoped, one-level listings.
 */
pub mod listing;
/**
 * Current prefix, clamping and breadcrumbs.
 */
pub mod navigation;
/**
 * Explicit session context tying credentials,
 *  store, navigation and upload strategy together.
 */
pub mod session;
/**
 * Sequential batch uploads with progress events,
 *  either through the object store or the AWS CLI.
 */
pub mod upload;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::credentials::{ConnectRequest, Credentials};
    pub use crate::error::DropzoneError;
    pub use crate::listing::ListingResult;
    pub use crate::navigation::{Breadcrumb, NavigationState};
    pub use crate::scope::{AccessPoint, AccessScope};
    pub use crate::session::{Session, SessionConfig};
    pub use crate::upload::{
        progress_channel, BatchSummary, CliUploader, FileOutcome, UploadEvent, UploadStrategy,
        UploadTask,
    };
    pub use crate::version::build_info;
}
