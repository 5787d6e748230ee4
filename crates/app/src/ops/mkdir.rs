use clap::Args;

use common::folder::validate_folder_name;
use common::prelude::*;

/// Create an empty folder inside the dropzone.
#[derive(Args, Debug, Clone)]
pub struct Mkdir {
    /// Name of the new folder (no slashes)
    pub name: String,

    /// Parent folder, relative to the dropzone root (defaults to the root)
    #[arg(long)]
    pub path: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MkdirError {
    #[error("mkdir failed: {0}")]
    Dropzone(#[from] DropzoneError),
}

#[async_trait::async_trait]
impl crate::op::Op for Mkdir {
    type Error = MkdirError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        // reject bad names before connecting
        validate_folder_name(&self.name)?;

        let (mut session, _) = ctx.connect(None).await?;
        if let Some(path) = &self.path {
            let prefix = session.navigation().resolve_path(path);
            session.load_folder(&prefix).await?;
        }

        let key = session.create_folder(&self.name).await?;
        Ok(format!("Created folder: {}", key))
    }
}
