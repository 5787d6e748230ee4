mod args;
mod op;
mod ops;
mod process;
mod state;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{CheckCli, Init, Ls, Mkdir, Scope, Upload, Version};

command_enum! {
    (Scope, Scope),
    (Ls, Ls),
    (Mkdir, Mkdir),
    (Upload, Upload),
    (CheckCli, CheckCli),
    (Init, Init),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let ctx = match op::OpContext::new(args.config_path, args.credentials) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let guards = process::init_logging(args.log_level, ctx.state.config.log_dir.as_deref());
    if !ctx.state.initialized {
        tracing::debug!(
            dir = %ctx.state.dropzone_dir.display(),
            "config directory not initialized, using defaults"
        );
    }

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            // flush log writers before exiting
            drop(guards);
            std::process::exit(1);
        }
    }
}
