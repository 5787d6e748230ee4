//! Explicit session context.
//!
//! A [`Session`] bundles what one connection needs: validated credentials,
//! the store handle, navigation state bound to the access scope, and the
//! upload strategy. Every operation goes through it; there is no ambient
//! global state.

use object_store::{ObjectStoreConfig, Storage, DEFAULT_MULTIPART_THRESHOLD};
use tracing::{debug, info};

use crate::credentials::{ConnectRequest, Credentials};
use crate::error::Result;
use crate::folder;
use crate::listing::ListingResult;
use crate::navigation::{Breadcrumb, NavigationState};
use crate::scope::AccessScope;
use crate::upload::{
    upload_batch, BatchSummary, ProgressSender, UploadContext, UploadStrategy, UploadTask,
};

/// Connection settings that are not credentials.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Custom S3 endpoint (path-style addressing)
    pub endpoint: Option<String>,
    pub multipart_threshold: u64,
    pub strategy: UploadStrategy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            multipart_threshold: DEFAULT_MULTIPART_THRESHOLD,
            strategy: UploadStrategy::default(),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    storage: Storage,
    navigation: NavigationState,
    strategy: UploadStrategy,
}

impl Session {
    /// Validate `request`, derive the scope, and list the scope root.
    ///
    /// Credential and identifier problems are reported before any request
    /// reaches the store.
    pub async fn connect(
        request: ConnectRequest,
        config: SessionConfig,
    ) -> Result<(Self, ListingResult)> {
        let credentials = request.validate()?;
        let scope = AccessScope::resolve(credentials.access_point(), credentials.sub_folder())?;
        let storage = Storage::new(ObjectStoreConfig::S3(
            credentials.s3_config(config.endpoint, config.multipart_threshold),
        ))?;
        Self::start(credentials, scope, storage, config.strategy).await
    }

    /// Like [`Session::connect`] but against an already-built store.
    pub async fn open(
        credentials: Credentials,
        storage: Storage,
        strategy: UploadStrategy,
    ) -> Result<(Self, ListingResult)> {
        let scope = AccessScope::resolve(credentials.access_point(), credentials.sub_folder())?;
        Self::start(credentials, scope, storage, strategy).await
    }

    async fn start(
        credentials: Credentials,
        scope: AccessScope,
        storage: Storage,
        strategy: UploadStrategy,
    ) -> Result<(Self, ListingResult)> {
        if let Some(suffix) = scope.access_point().suffix() {
            debug!(suffix, "access point suffix is not used for scoping");
        }

        let mut navigation = NavigationState::new(scope);
        let root = navigation.scope().root_prefix().to_string();
        let listing = navigation.load_folder(&*storage, &root).await?;
        info!(
            access_point = %navigation.scope().access_point(),
            root = %root,
            "connected"
        );

        let session = Self {
            credentials,
            storage,
            navigation,
            strategy,
        };
        Ok((session, listing))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn scope(&self) -> &AccessScope {
        self.navigation.scope()
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn current_prefix(&self) -> &str {
        self.navigation.current_prefix()
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.navigation.breadcrumbs()
    }

    pub fn strategy(&self) -> &UploadStrategy {
        &self.strategy
    }

    /// Navigate to `prefix`. On failure the current prefix is unchanged.
    pub async fn load_folder(&mut self, prefix: &str) -> Result<ListingResult> {
        self.navigation.load_folder(&*self.storage, prefix).await
    }

    /// Re-list the current prefix.
    pub async fn refresh(&mut self) -> Result<ListingResult> {
        let current = self.navigation.current_prefix().to_string();
        self.load_folder(&current).await
    }

    /// Go back to the scope root and list it.
    pub async fn reconnect(&mut self) -> Result<ListingResult> {
        self.navigation.reset();
        self.refresh().await
    }

    /// Create `name` as a folder under the current prefix.
    pub async fn create_folder(&self, name: &str) -> Result<String> {
        folder::create_folder(
            &*self.storage,
            self.navigation.scope(),
            self.navigation.current_prefix(),
            name,
        )
        .await
    }

    /// Upload `tasks` into the current prefix.
    ///
    /// Takes `&mut self` so only one batch can run per session. `events` is
    /// dropped when the batch ends, which closes the channel for the reader.
    pub async fn upload(
        &mut self,
        tasks: &[UploadTask],
        events: ProgressSender,
    ) -> Result<BatchSummary> {
        let ctx = UploadContext {
            store: &*self.storage,
            scope: self.navigation.scope(),
            credentials: &self.credentials,
            strategy: &self.strategy,
        };
        upload_batch(ctx, self.navigation.current_prefix(), tasks, &events).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DropzoneError;
    use object_store::MemoryStore;

    fn credentials(access_point: &str, sub_folder: &str) -> Credentials {
        ConnectRequest {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
            access_point: access_point.to_string(),
            sub_folder: sub_folder.to_string(),
            region: None,
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_lists_root() {
        let memory = MemoryStore::new();
        memory.insert("inbox/amg00000/readme.txt", "hi");
        memory.insert("inbox/amg00000/jobs/", "");

        let (session, listing) = Session::open(
            credentials("x/amg00000-extra", "/"),
            Storage::from_store(memory),
            UploadStrategy::Sdk,
        )
        .await
        .unwrap();

        assert_eq!(session.current_prefix(), "inbox/amg00000/");
        assert_eq!(listing.folders, vec!["inbox/amg00000/jobs/"]);
        assert_eq!(listing.files, vec!["inbox/amg00000/readme.txt"]);
    }

    #[tokio::test]
    async fn test_connect_rejects_before_network() {
        let request = ConnectRequest {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "secret".to_string(),
            access_point: "no-slash".to_string(),
            sub_folder: "/".to_string(),
            ..Default::default()
        };
        let err = Session::connect(request, SessionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DropzoneError::MalformedIdentifier(_)));
    }

    #[tokio::test]
    async fn test_open_fails_on_listing_error() {
        let memory = MemoryStore::new();
        memory.set_fail_listings(true);
        let err = Session::open(
            credentials("x/amg00000", "/"),
            Storage::from_store(memory),
            UploadStrategy::Sdk,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DropzoneError::Listing(_)));
    }
}
