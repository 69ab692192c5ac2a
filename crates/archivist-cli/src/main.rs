//! Archivist — content-addressable article archive client.
//!
//! ## Commands
//!
//! - `hash`: compute the advisory content digest of a local file
//! - `articles`: list the archive index
//! - `article`: show one article with its comments
//! - `comment`: attach a scored annotation to an article
//! - `upload`: store a new document and receive its digest
//! - `verify`: look up (or download as PDF) the provenance certificate
//!   for a digest

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use archivist_core::{
    split_citations, ArchiveClient, ArchiveError, ArticleSession, ArticleUpload, BackendConfig,
    CommentDraft, ContentDigest, SpendDirection, SubmissionState,
};

#[derive(Parser)]
#[command(name = "archivist")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Content-addressable article archive client", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Archive backend base URL
    #[arg(long, global = true, env = "ARCHIVIST_BACKEND_URL")]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the advisory content digest of a local file
    Hash {
        /// File to hash
        file: PathBuf,
    },

    /// List the archive index
    Articles,

    /// Show one article with its comments
    Article {
        /// Article identifier
        id: String,
    },

    /// Attach a scored annotation to an article
    Comment {
        /// Article identifier
        id: String,

        /// Comment body (minimum 3 characters after trimming)
        #[arg(short, long)]
        body: String,

        /// Commenter name (omit to post as Anonymous)
        #[arg(short, long)]
        name: Option<String>,

        /// Citation source (repeatable)
        #[arg(short, long = "citation")]
        citations: Vec<String>,

        /// File with one citation per line
        #[arg(long)]
        citations_file: Option<PathBuf>,

        /// Disclose identifying information (earns extra points)
        #[arg(long)]
        identify: bool,

        /// Spend the earned points against the article's score
        #[arg(long)]
        down: bool,
    },

    /// Upload a new document to the archive
    Upload {
        /// Document file
        file: PathBuf,

        /// Article title
        #[arg(short, long)]
        title: String,

        /// Authors
        #[arg(short, long, default_value = "")]
        authors: String,

        /// Link to the original publication
        #[arg(short, long, default_value = "")]
        link: String,

        /// Bibliography source (repeatable)
        #[arg(short, long = "source")]
        bibliography: Vec<String>,
    },

    /// Look up the provenance certificate for a digest
    Verify {
        /// SHA-256 content digest (64 hex chars)
        sha256: String,

        /// Download the rendered certificate PDF to this path
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    archivist_core::init_tracing(cli.json, level);

    let config = match &cli.backend {
        Some(url) => BackendConfig::new(url),
        None => BackendConfig::from_env(),
    };
    let client =
        ArchiveClient::over_http(config).context("Failed to construct backend client")?;

    match cli.command {
        Commands::Hash { file } => cmd_hash(&file),
        Commands::Articles => cmd_articles(&client).await,
        Commands::Article { id } => cmd_article(&client, &id).await,
        Commands::Comment {
            id,
            body,
            name,
            citations,
            citations_file,
            identify,
            down,
        } => {
            cmd_comment(
                &client,
                &id,
                &body,
                name,
                citations,
                citations_file.as_deref(),
                identify,
                down,
            )
            .await
        }
        Commands::Upload {
            file,
            title,
            authors,
            link,
            bibliography,
        } => cmd_upload(&client, &file, &title, &authors, &link, bibliography).await,
        Commands::Verify { sha256, pdf } => cmd_verify(&client, &sha256, pdf.as_deref()).await,
    }
}

/// Compute the advisory digest of a local file.
fn cmd_hash(file: &std::path::Path) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    let digest = ContentDigest::from_bytes(&bytes);
    println!("{}", digest);
    Ok(())
}

async fn cmd_articles(client: &ArchiveClient) -> Result<()> {
    let index = client.fetch_article_index().await;
    if index.is_empty() {
        println!("No articles found.");
        return Ok(());
    }
    for entry in index {
        println!("{:>8}  {:8.2}  {}", entry.id, entry.points, entry.title);
    }
    Ok(())
}

async fn cmd_article(client: &ArchiveClient, id: &str) -> Result<()> {
    let session = ArticleSession::new(client.clone());
    session.set_article(id);
    session.load().await.context("Article unavailable")?;

    let article = session
        .article()
        .ok_or_else(|| anyhow::anyhow!("article missing after load"))?;
    println!("{}", article.title);
    println!("Points: {:.2}", article.points);
    if let Some(url) = &article.file_url {
        println!("File:   {}", url);
    }
    println!();
    println!("{}", article.content);

    let comments = session.comments();
    println!();
    println!("Comments ({})", comments.len());
    for comment in comments {
        println!(
            "- {} [{:.2} pts, {} citations] {}",
            comment.commenter_name, comment.points, comment.citations_count, comment.body
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_comment(
    client: &ArchiveClient,
    id: &str,
    body: &str,
    name: Option<String>,
    mut citations: Vec<String>,
    citations_file: Option<&std::path::Path>,
    identify: bool,
    down: bool,
) -> Result<()> {
    if let Some(path) = citations_file {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        citations.extend(split_citations(&text));
    }

    let draft = CommentDraft {
        commenter_name: name,
        body: body.to_string(),
        citations,
        has_identifying_info: identify,
        spend_direction: if down {
            SpendDirection::Down
        } else {
            SpendDirection::Up
        },
    };
    let estimate = draft.points();

    let session = ArticleSession::new(client.clone());
    session.set_article(id);
    session.load().await.context("Article unavailable")?;
    session.set_draft(draft)?;

    match session.submit_comment().await? {
        SubmissionState::Confirmed => {
            let article = session
                .article()
                .ok_or_else(|| anyhow::anyhow!("article missing after confirm"))?;
            println!("Comment confirmed ({:.2} pts estimated).", estimate);
            println!("Article points: {:.2}", article.points);
        }
        SubmissionState::DuplicateRejected => {
            println!("Rejected: this comment is already recorded.");
        }
        SubmissionState::Failed(reason) => {
            anyhow::bail!("Submission failed: {}", reason);
        }
        other => anyhow::bail!("unexpected submission state: {:?}", other),
    }
    Ok(())
}

async fn cmd_upload(
    client: &ArchiveClient,
    file: &std::path::Path,
    title: &str,
    authors: &str,
    link: &str,
    bibliography: Vec<String>,
) -> Result<()> {
    let file_bytes = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let upload = ArticleUpload {
        title: title.to_string(),
        authors: authors.to_string(),
        original_link: link.to_string(),
        file_name,
        file_bytes,
        bibliography,
    };

    let session = ArticleSession::new(client.clone());
    match session.submit_upload(upload).await {
        Ok(outcome) => {
            println!("Upload successful.");
            println!("SHA-256: {}", outcome.digest);
            if outcome.digest != outcome.claimed {
                println!("(local claim was {})", outcome.claimed);
            }
            Ok(())
        }
        Err(ArchiveError::Duplicate) => {
            println!("Article already exists. Upload skipped.");
            Ok(())
        }
        Err(err) => Err(err).context("Upload failed"),
    }
}

async fn cmd_verify(
    client: &ArchiveClient,
    sha256: &str,
    pdf: Option<&std::path::Path>,
) -> Result<()> {
    let digest = ContentDigest::try_from(sha256.to_string()).context("Invalid digest")?;

    let certificate = client
        .verify_article(&digest)
        .await
        .context("Verification failed")?;
    println!("{}", serde_json::to_string_pretty(&certificate)?);

    if let Some(path) = pdf {
        let bytes = client
            .verify_article_pdf(&digest)
            .await
            .context("Certificate PDF unavailable")?;
        std::fs::write(path, &bytes).with_context(|| format!("Failed to write {:?}", path))?;
        println!("Certificate PDF written to {:?}", path);
    }
    Ok(())
}
