use std::error::Error;
use std::path::PathBuf;

use common::prelude::*;

use crate::args::CredentialArgs;
use crate::state::{AppState, StateError, UploaderKind};

#[derive(Debug, Clone)]
pub struct OpContext {
    /// Optional custom config path (defaults to ~/.dropzone)
    pub config_path: Option<PathBuf>,
    /// Loaded state, or defaults when the directory does not exist yet
    pub state: AppState,
    /// Connection fields from flags/env
    pub credentials: CredentialArgs,
}

impl OpContext {
    pub fn new(
        config_path: Option<PathBuf>,
        credentials: CredentialArgs,
    ) -> Result<Self, StateError> {
        let state = AppState::load_or_default(config_path.clone())?;
        Ok(Self {
            config_path,
            state,
            credentials,
        })
    }

    /// Credentials as typed, before validation. Flags win over the config region.
    pub fn connect_request(&self) -> ConnectRequest {
        let creds = &self.credentials;
        ConnectRequest {
            access_key_id: creds.access_key_id.clone().unwrap_or_default(),
            secret_access_key: creds.secret_access_key.clone().unwrap_or_default(),
            session_token: creds.session_token.clone(),
            access_point: creds.access_point.clone().unwrap_or_default(),
            sub_folder: creds.sub_folder.clone(),
            region: creds
                .region
                .clone()
                .or_else(|| self.state.config.region.clone()),
        }
    }

    pub fn upload_strategy(&self, uploader: Option<UploaderKind>) -> UploadStrategy {
        let config = &self.state.config;
        match uploader.unwrap_or(config.uploader) {
            UploaderKind::Sdk => UploadStrategy::Sdk,
            UploaderKind::Cli => UploadStrategy::Cli(CliUploader::new(&config.cli_program)),
        }
    }

    pub fn session_config(&self, uploader: Option<UploaderKind>) -> SessionConfig {
        SessionConfig {
            endpoint: self.state.config.endpoint.clone(),
            multipart_threshold: self.state.config.multipart_threshold_bytes(),
            strategy: self.upload_strategy(uploader),
        }
    }

    /// Validate credentials, connect, and list the scope root.
    pub async fn connect(
        &self,
        uploader: Option<UploaderKind>,
    ) -> Result<(Session, ListingResult), DropzoneError> {
        Session::connect(self.connect_request(), self.session_config(uploader)).await
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
