//! File storage commands

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use clap::Subcommand;
use colored::Colorize;
use eventdesk_client::{
    format_file_size, FileCategory, FileFilter, FileUpload, ShareLinkRequest, StorageFile,
};
use std::path::PathBuf;

use crate::context::AppContext;
use crate::format;

#[derive(Subcommand)]
pub enum FilesCommand {
    /// List or search files
    List {
        /// Search name, description and original file name
        #[arg(short, long)]
        query: Option<String>,

        /// Filter by category (image, document, video, audio, archive, other)
        #[arg(long)]
        category: Option<FileCategory>,

        /// Only my uploads
        #[arg(long)]
        mine: bool,

        /// Attachments of an event instead of the general storage
        #[arg(long, conflicts_with_all = ["query", "category", "mine"])]
        event: Option<i64>,
    },

    /// Upload one or more files
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Display name (single file only)
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Category; inferred from the extension when omitted
        #[arg(long)]
        category: Option<FileCategory>,

        /// Attach to an event
        #[arg(long)]
        event: Option<i64>,

        /// Only visible to you and administrators
        #[arg(long)]
        private: bool,
    },

    /// Download a file, or print its download URL with --url
    Download {
        id: i64,

        /// Output path (defaults to the stored file name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, conflicts_with = "output")]
        url: bool,
    },

    /// Delete a file
    Delete {
        id: i64,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Create a share link, or list existing ones with --list
    Share {
        id: i64,

        /// Link lifetime in hours
        #[arg(long)]
        hours: Option<i64>,

        /// Maximum number of downloads
        #[arg(long)]
        max_downloads: Option<u32>,

        /// List existing links instead of creating one
        #[arg(long)]
        list: bool,
    },
}

pub async fn run(ctx: &AppContext, cmd: FilesCommand) -> Result<()> {
    let user = ctx.require_user()?;
    let files = ctx.files();

    match cmd {
        FilesCommand::List {
            event: Some(event_id),
            ..
        } => {
            let attachments = files.event_files(event_id).await?;
            if ctx.emit_json(&attachments)? {
                return Ok(());
            }
            if attachments.is_empty() {
                ctx.print_info("No files attached to this event.");
            }
            for file in &attachments {
                println!(
                    "  {:>5}  {:<40} {:<9} {:>9}",
                    file.id,
                    format::truncate(file.file_name.as_deref().unwrap_or("-"), 40),
                    file.category.as_str(),
                    file.file_size_display
                        .clone()
                        .unwrap_or_else(|| format_file_size(file.file_size))
                );
            }
        }

        FilesCommand::List {
            query,
            category,
            mine,
            event: None,
        } => {
            let filter = FileFilter {
                query,
                category,
                uploaded_by: mine.then_some(user.id),
                ..Default::default()
            };
            let page = if filter.query.is_some() {
                files.search(&filter).await?
            } else {
                files.list(&filter).await?
            };
            if ctx.emit_json(&page)? {
                return Ok(());
            }
            if page.is_empty() {
                ctx.print_info("No files found.");
            }
            for file in &page.results {
                print_file(file);
            }
        }

        FilesCommand::Upload {
            paths,
            name,
            description,
            category,
            event,
            private,
        } => {
            if name.is_some() && paths.len() > 1 {
                bail!("--name only applies to a single file");
            }

            let mut uploads = Vec::with_capacity(paths.len());
            for path in &paths {
                let mut upload = FileUpload::from_path(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                upload.name = name.clone();
                upload.description = description.clone();
                upload.category = category;
                upload.event_id = event;
                upload.is_public = !private;
                uploads.push(upload);
            }

            let stored = match uploads.as_slice() {
                [single] => vec![files.upload(single).await?],
                many => {
                    files
                        .upload_multiple(many, category, description.as_deref(), !private)
                        .await?
                }
            };

            if ctx.emit_json(&stored)? {
                return Ok(());
            }
            for file in &stored {
                ctx.print_success(&format!("Uploaded #{} {}", file.id, file.name));
            }
        }

        FilesCommand::Download { id, output, url } => {
            if url {
                println!("{}", files.download_url(id));
                return Ok(());
            }
            let (file, bytes) = tokio::try_join!(files.get(id), files.download(id))?;
            let target = match output {
                Some(path) => path,
                None => {
                    let stored = file.original_name.as_deref().unwrap_or(&file.name);
                    let base = std::path::Path::new(stored)
                        .file_name()
                        .with_context(|| format!("Stored name {:?} is not a file name; pass --output", stored))?;
                    PathBuf::from(base)
                }
            };
            std::fs::write(&target, &bytes)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            ctx.print_success(&format!(
                "Saved {} ({})",
                target.display(),
                format_file_size(bytes.len() as u64)
            ));
        }

        FilesCommand::Delete { id, yes } => {
            let file = files.get(id).await?;
            if !yes && !ctx.confirm(&format!("Delete file \"{}\"?", file.name), false)? {
                ctx.print_warning("Cancelled.");
                return Ok(());
            }
            files.delete(id).await?;
            ctx.print_success(&format!("Deleted file #{}", id));
        }

        FilesCommand::Share {
            id,
            hours,
            max_downloads,
            list,
        } => {
            if list {
                let links = files.share_links(id).await?;
                if ctx.emit_json(&links)? {
                    return Ok(());
                }
                for link in &links {
                    println!(
                        "  {}  downloads {}{}  expires {}  {}",
                        link.token.bold(),
                        link.download_count,
                        link.max_downloads.map(|m| format!("/{}", m)).unwrap_or_default(),
                        format::datetime(link.expires_at),
                        format::yes_no(link.is_active)
                    );
                }
                return Ok(());
            }

            let request = ShareLinkRequest {
                expires_at: hours.map(|h| Utc::now() + Duration::hours(h)),
                max_downloads,
            };
            let link = files.create_share_link(id, &request).await?;
            if ctx.emit_json(&link)? {
                return Ok(());
            }
            ctx.print_success("Share link created.");
            println!("  {}", link.share_url.as_deref().unwrap_or(&link.token));
        }
    }
    Ok(())
}

fn print_file(file: &StorageFile) {
    let size = file
        .file_size_display
        .clone()
        .unwrap_or_else(|| format_file_size(file.file_size));
    let visibility = if file.is_public {
        "public".normal()
    } else {
        "private".yellow()
    };
    println!(
        "  {:>5}  {:<40} {:<9} {:>9}  {:<8} {}",
        file.id,
        format::truncate(&file.name, 40),
        file.category.as_str(),
        size,
        visibility,
        format::datetime(file.created_at).dimmed()
    );
}
