pub use clap::Parser;

use std::fmt;
use std::path::PathBuf;

use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "dropzone")]
#[command(about = "Browse and upload into a scoped S3 access point dropzone")]
#[command(version)]
pub struct Args {
    /// Path to the dropzone config directory (defaults to ~/.dropzone)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level for stderr and the log file (RUST_LOG overrides)
    #[arg(long, global = true, env = "DROPZONE_LOG", default_value = "warn")]
    pub log_level: Level,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: crate::Command,
}

/// Connection fields. Read from flags or the environment, never from disk.
#[derive(clap::Args, Clone, Default)]
pub struct CredentialArgs {
    #[arg(long, global = true, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    #[arg(long, global = true, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    /// Session token for temporary credentials
    #[arg(long, global = true, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Access point ARN, e.g. arn:aws:s3:us-east-1:123456789012:accesspoint/amg00000
    #[arg(long, global = true, env = "DROPZONE_ACCESS_POINT")]
    pub access_point: Option<String>,

    /// Dropzone folder under the access point, or "/" for its root
    #[arg(
        long = "folder",
        global = true,
        env = "DROPZONE_FOLDER",
        default_value = "/"
    )]
    pub sub_folder: String,

    /// Region (overrides the config file; defaults to us-east-1)
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,
}

impl fmt::Debug for CredentialArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialArgs")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("access_point", &self.access_point)
            .field("sub_folder", &self.sub_folder)
            .field("region", &self.region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ls_with_credentials() {
        let args = Args::try_parse_from([
            "dropzone",
            "--access-key-id",
            "AKIA",
            "--secret-access-key",
            "shh",
            "--access-point",
            "x/amg00000",
            "ls",
            "jobs",
            "--folder",
            "uploads",
        ])
        .unwrap();

        assert_eq!(args.credentials.access_key_id.as_deref(), Some("AKIA"));
        assert_eq!(args.credentials.sub_folder, "uploads");
        assert!(matches!(args.command, crate::Command::Ls(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = CredentialArgs {
            secret_access_key: Some("shh-secret".to_string()),
            session_token: Some("token-value".to_string()),
            ..Default::default()
        };
        let shown = format!("{:?}", creds);
        assert!(!shown.contains("shh-secret"));
        assert!(!shown.contains("token-value"));
    }
}
