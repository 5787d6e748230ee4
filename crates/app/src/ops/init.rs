use clap::Args;

use crate::state::{AppConfig, AppState, UploaderKind};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Default region for connections
    #[arg(long = "default-region")]
    pub default_region: Option<String>,

    /// Custom S3 endpoint (e.g. a local S3-compatible server)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Default uploader
    #[arg(long, value_enum, default_value_t = UploaderKind::Sdk)]
    pub uploader: UploaderKind,

    /// Program used by the CLI uploader
    #[arg(long, default_value = "aws")]
    pub cli_program: String,

    /// Multipart threshold in MiB
    #[arg(long, default_value_t = 8)]
    pub multipart_threshold_mb: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            region: self.default_region.clone(),
            endpoint: self.endpoint.clone(),
            uploader: self.uploader,
            cli_program: self.cli_program.clone(),
            multipart_threshold_mb: self.multipart_threshold_mb,
            log_dir: None,
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let log_dir = state
            .config
            .log_dir
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| "disabled".to_string());

        let output = format!(
            "Initialized dropzone directory at: {}\n\
             - Config: {}\n\
             - Region: {}\n\
             - Uploader: {:?}\n\
             - Multipart threshold: {} MiB\n\
             - Logs: {}",
            state.dropzone_dir.display(),
            state.config_path.display(),
            state.config.region.as_deref().unwrap_or("us-east-1"),
            state.config.uploader,
            state.config.multipart_threshold_mb,
            log_dir
        );

        Ok(output)
    }
}
