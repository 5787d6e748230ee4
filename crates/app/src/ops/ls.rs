use clap::Args;

use common::navigation::{file_display_name, folder_display_name};
use common::prelude::*;

/// List one folder inside the dropzone.
#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Folder to list, relative to the dropzone root (defaults to the root)
    pub path: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error("ls failed: {0}")]
    Dropzone(#[from] DropzoneError),
}

#[async_trait::async_trait]
impl crate::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (mut session, root_listing) = ctx.connect(None).await?;

        let listing = match &self.path {
            Some(path) => {
                let prefix = session.navigation().resolve_path(path);
                session.load_folder(&prefix).await?
            }
            None => root_listing,
        };

        Ok(render_listing(&session.breadcrumbs(), &listing))
    }
}

/// Breadcrumb header followed by folders then files.
pub fn render_listing(breadcrumbs: &[Breadcrumb], listing: &ListingResult) -> String {
    let header = breadcrumbs
        .iter()
        .map(|crumb| crumb.label.as_str())
        .collect::<Vec<_>>()
        .join(" / ");

    let mut lines = vec![format!("{} ({})", header, listing.prefix)];
    if listing.is_empty() {
        lines.push("  (empty)".to_string());
    }
    for folder in &listing.folders {
        lines.push(format!("  {}/", folder_display_name(folder, &listing.prefix)));
    }
    for file in &listing.files {
        lines.push(format!("  {}", file_display_name(file, &listing.prefix)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_listing() {
        let crumbs = vec![
            Breadcrumb {
                label: "Root".to_string(),
                prefix: "inbox/a/".to_string(),
            },
            Breadcrumb {
                label: "jobs".to_string(),
                prefix: "inbox/a/jobs/".to_string(),
            },
        ];
        let listing = ListingResult {
            prefix: "inbox/a/jobs/".to_string(),
            folders: vec!["inbox/a/jobs/2024/".to_string()],
            files: vec!["inbox/a/jobs/spec.pdf".to_string()],
        };

        assert_eq!(
            render_listing(&crumbs, &listing),
            "Root / jobs (inbox/a/jobs/)\n  2024/\n  spec.pdf"
        );
    }

    #[test]
    fn test_render_empty() {
        let listing = ListingResult {
            prefix: "inbox/a/".to_string(),
            ..Default::default()
        };
        let rendered = render_listing(&[], &listing);
        assert!(rendered.ends_with("(empty)"));
    }
}
