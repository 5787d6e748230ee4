use clap::Args;

use common::prelude::*;

/// Show the prefix this connection is confined to, without contacting S3.
#[derive(Args, Debug, Clone)]
pub struct Scope;

#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    #[error("scope resolution failed: {0}")]
    Dropzone(#[from] DropzoneError),
}

#[async_trait::async_trait]
impl crate::op::Op for Scope {
    type Error = ScopeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let credentials = ctx.connect_request().validate()?;
        let scope = AccessScope::resolve(credentials.access_point(), credentials.sub_folder())?;
        let access_point = scope.access_point();

        Ok(format!(
            "Access point: {}\n\
             - Id: {}\n\
             - Suffix: {}\n\
             - Region: {}\n\
             - Root prefix: {}",
            access_point,
            access_point.id(),
            access_point.suffix().unwrap_or("(none)"),
            credentials.region(),
            scope.root_prefix()
        ))
    }
}
