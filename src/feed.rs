//! The cached RSS feed.
//!
//! The feed is a file in a working directory together with a sibling file
//! holding its fingerprint. It is rebuilt from the newest links when missing
//! or older than the staleness window and served verbatim otherwise.
//!
//! Concurrent requests may rebuild at the same time. Each rebuild renders
//! into private temp files and only the final rename of the document and its
//! fingerprint happens under a lock, which readers also take while loading
//! the pair. A reader therefore always sees a fingerprint that belongs to the
//! document it gets, and a failed rebuild never touches the published pair.

use crate::{db, errors::FeedError, hasher::Fingerprinter, models::FeedEntry};
use askama::Template;
use sqlx::SqlitePool;
use std::{
    fmt,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};
use url::Url;
use uuid::Uuid;

/// How long a generated feed is served before it is rebuilt.
pub const FEED_MAX_AGE: Duration = Duration::from_secs(30 * 60);

const FEED_FILE: &str = "rss.xml";
const FINGERPRINT_FILE: &str = "rss.xml.etag";

// ── Template ───────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "rss.xml")]
struct RssTemplate {
    title: String,
    link: String,
    description: String,
    build_date: String,
    items: Vec<RssItem>,
}

struct RssItem {
    title: String,
    link: String,
    description: String,
}

// ── Artifact ───────────────────────────────────────────────────────────────

/// A published feed document and the fingerprint of exactly those bytes.
#[derive(Debug, Clone)]
pub struct FeedArtifact {
    pub body: Vec<u8>,
    pub fingerprint: String,
}

pub struct FeedCache {
    dir: PathBuf,
    pretty_addr: String,
    limit: u32,
    max_age: Duration,
    publish: Arc<RwLock<()>>,
}

impl FeedCache {
    pub fn new(
        dir: impl Into<PathBuf>,
        pretty_addr: impl Into<String>,
        limit: u32,
        max_age: Duration,
    ) -> Self {
        Self {
            dir: dir.into(),
            pretty_addr: pretty_addr.into(),
            limit,
            max_age,
            publish: Arc::new(RwLock::new(())),
        }
    }

    pub fn document_path(&self) -> PathBuf {
        self.dir.join(FEED_FILE)
    }

    pub fn fingerprint_path(&self) -> PathBuf {
        self.dir.join(FINGERPRINT_FILE)
    }

    /// Return the current feed, rebuilding it first if it is missing or stale.
    pub async fn get(&self, pool: &SqlitePool) -> Result<FeedArtifact, FeedError> {
        if self.is_stale().await {
            tracing::debug!("Regenerating RSS feed in {}", self.dir.display());
            self.regenerate(pool).await?;
        }
        self.load().await
    }

    /// Rebuild and publish the feed from the newest links.
    pub async fn regenerate(&self, pool: &SqlitePool) -> Result<(), FeedError> {
        let entries = db::recent_feed_entries(pool, self.limit).await?;
        let template = self.build_template(entries);

        let dir = self.dir.clone();
        let publish = self.publish.clone();
        let fingerprint =
            tokio::task::spawn_blocking(move || write_and_publish(&dir, &template, &publish))
                .await??;

        tracing::info!("RSS feed regenerated (fingerprint {})", fingerprint);
        Ok(())
    }

    async fn is_stale(&self) -> bool {
        if !matches!(tokio::fs::try_exists(self.fingerprint_path()).await, Ok(true)) {
            return true;
        }
        let modified = match tokio::fs::metadata(self.document_path()).await {
            Ok(meta) => meta.modified(),
            Err(_) => return true,
        };
        match modified {
            // A modification time in the future reads as fresh.
            Ok(at) => at.elapsed().map(|age| age > self.max_age).unwrap_or(false),
            Err(_) => true,
        }
    }

    async fn load(&self) -> Result<FeedArtifact, FeedError> {
        let document = self.document_path();
        let fingerprint = self.fingerprint_path();
        let publish = self.publish.clone();

        let artifact = tokio::task::spawn_blocking(move || -> io::Result<FeedArtifact> {
            let _guard = publish.read().unwrap_or_else(PoisonError::into_inner);
            Ok(FeedArtifact {
                body: fs::read(&document)?,
                fingerprint: fs::read_to_string(&fingerprint)?.trim().to_owned(),
            })
        })
        .await??;

        Ok(artifact)
    }

    fn build_template(&self, entries: Vec<FeedEntry>) -> RssTemplate {
        let items = entries
            .into_iter()
            .filter_map(|entry| {
                let raw = format!("{}/:/{}", self.pretty_addr, entry.hash);
                match Url::parse(&raw) {
                    Ok(link) => Some(RssItem {
                        title: entry.description.clone(),
                        link: link.to_string(),
                        description: entry.description,
                    }),
                    Err(e) => {
                        tracing::warn!("Skipping feed item with bad link '{}': {}", raw, e);
                        None
                    }
                }
            })
            .collect();

        RssTemplate {
            title: "linkblog".into(),
            link: format!("{}/rss", self.pretty_addr),
            description: "recently shared links".into(),
            build_date: chrono::Utc::now().to_rfc2822(),
            items,
        }
    }
}

// ── Writing ────────────────────────────────────────────────────────────────

/// Tees rendered text into a file and a running fingerprint.
struct HashingWriter<W: Write> {
    inner: W,
    fingerprint: Fingerprinter,
    error: Option<io::Error>,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            fingerprint: Fingerprinter::new(),
            error: None,
        }
    }
}

impl<W: Write> fmt::Write for HashingWriter<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if let Err(e) = self.inner.write_all(s.as_bytes()) {
            self.error = Some(e);
            return Err(fmt::Error);
        }
        self.fingerprint.update(s.as_bytes());
        Ok(())
    }
}

/// Render into temp files, then swap both into place. Returns the fingerprint.
fn write_and_publish(
    dir: &Path,
    template: &RssTemplate,
    publish: &RwLock<()>,
) -> Result<String, FeedError> {
    let suffix = Uuid::new_v4();
    let doc_tmp = dir.join(format!(".{FEED_FILE}.{suffix}.tmp"));
    let fp_tmp = dir.join(format!(".{FINGERPRINT_FILE}.{suffix}.tmp"));

    let result = render_to(&doc_tmp, template).and_then(|fingerprint| {
        fs::write(&fp_tmp, &fingerprint)?;

        let _guard = publish.write().unwrap_or_else(PoisonError::into_inner);
        swap_pair(dir, &doc_tmp, &fp_tmp)?;
        Ok(fingerprint)
    });

    if result.is_err() {
        let _ = fs::remove_file(&doc_tmp);
        let _ = fs::remove_file(&fp_tmp);
    }
    result
}

/// Move the new fingerprint and document into place. If the document can't
/// be moved, the previous fingerprint is put back so the published pair still
/// matches. Callers hold the publish lock.
fn swap_pair(dir: &Path, doc_tmp: &Path, fp_tmp: &Path) -> io::Result<()> {
    let fp_path = dir.join(FINGERPRINT_FILE);
    let previous = fs::read(&fp_path).ok();

    fs::rename(fp_tmp, &fp_path)?;
    if let Err(e) = fs::rename(doc_tmp, dir.join(FEED_FILE)) {
        let restored = match previous {
            Some(bytes) => fs::write(&fp_path, bytes),
            None => fs::remove_file(&fp_path),
        };
        if let Err(restore_err) = restored {
            tracing::error!("Could not restore previous feed fingerprint: {}", restore_err);
        }
        return Err(e);
    }
    Ok(())
}

fn render_to(path: &Path, template: &RssTemplate) -> Result<String, FeedError> {
    let mut writer = HashingWriter::new(BufWriter::new(File::create(path)?));

    if let Err(e) = template.render_into(&mut writer) {
        return Err(match writer.error.take() {
            Some(io_err) => io_err.into(),
            None => e.into(),
        });
    }

    let fingerprint = writer.fingerprint.finish();
    writer
        .inner
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?
        .sync_all()?;
    Ok(fingerprint)
}
