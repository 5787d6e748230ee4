pub mod check_cli;
pub mod init;
pub mod ls;
pub mod mkdir;
pub mod scope;
pub mod upload;
pub mod version;

pub use check_cli::CheckCli;
pub use init::Init;
pub use ls::Ls;
pub use mkdir::Mkdir;
pub use scope::Scope;
pub use upload::Upload;
pub use version::Version;
