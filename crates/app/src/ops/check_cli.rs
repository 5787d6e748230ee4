use clap::Args;

use common::prelude::*;

/// Check whether the AWS CLI uploader can be used.
#[derive(Args, Debug, Clone)]
pub struct CheckCli {
    /// Program to probe (defaults to `cli_program` from the config)
    #[arg(long)]
    pub program: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckCliError {
    #[error("{program} is not available: {install_hint}")]
    Unavailable {
        program: String,
        install_hint: &'static str,
    },
}

#[async_trait::async_trait]
impl crate::op::Op for CheckCli {
    type Error = CheckCliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let program = self
            .program
            .clone()
            .unwrap_or_else(|| ctx.state.config.cli_program.clone());
        let availability = CliUploader::new(program).check_availability().await;

        if !availability.available {
            return Err(CheckCliError::Unavailable {
                program: availability.program,
                install_hint: availability.install_hint,
            });
        }

        Ok(format!(
            "{} is available: {}",
            availability.program,
            availability.version.as_deref().unwrap_or("unknown version")
        ))
    }
}
