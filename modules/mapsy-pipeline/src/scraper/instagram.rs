use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use browserless_client::{BrowserlessClient, BrowserlessError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use mapsy_common::{ContentMetadata, ScrapeError, UrlClassification};

use super::ContentScraper;
use crate::sessions::BrowserSessions;

/// Page script run inside Browserless. Loads the post, reads the Open Graph
/// tags, walks the carousel if there is one and returns what it found.
const PAGE_SCRIPT: &str = r#"
export default async function ({ page, context }) {
  await page.setUserAgent(context.userAgent);
  await page.setViewport({ width: 1920, height: 1080 });
  const response = await page.goto(context.url, { waitUntil: "networkidle2", timeout: context.navTimeoutMs });
  const status = response ? response.status() : null;

  const og = await page.evaluate(() => {
    const read = (p) => document.querySelector(`meta[property="${p}"]`)?.content ?? null;
    return { description: read("og:description"), image: read("og:image") };
  });

  const collect = () => page.evaluate(() => {
    const carousel = document.querySelector("ul._acay");
    if (carousel) {
      return Array.from(carousel.querySelectorAll('li._acaz img[src*="cdninstagram.com"]')).map((i) => i.src).filter(Boolean);
    }
    const main = document.querySelector('article div._aagv img[src*="cdninstagram.com"]');
    return main && main.src ? [main.src] : [];
  });

  const seen = new Set(await collect());
  const slides = await page.evaluate(() => document.querySelectorAll("div._acnb").length || 1);
  for (let i = 1; i < slides; i++) {
    const clicked = await page.evaluate(() => {
      const next = document.querySelector('button[aria-label="Next"]');
      if (next) { next.click(); return true; }
      return false;
    });
    if (!clicked) break;
    await new Promise((r) => setTimeout(r, 400));
    (await collect()).forEach((u) => seen.add(u));
  }

  const profileImageUrl = await page.evaluate(
    () => document.querySelector('img[alt*="profile picture"]')?.src ?? null
  );

  return {
    data: { status, description: og.description, image: og.image, imageUrls: [...seen], profileImageUrl },
    type: "application/json",
  };
}
"#;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageContext<'a> {
    url: &'a str,
    user_agent: &'a str,
    nav_timeout_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PageData {
    status: Option<u16>,
    description: Option<String>,
    image: Option<String>,
    image_urls: Vec<String>,
    profile_image_url: Option<String>,
}

// --- Scraper ---

pub struct InstagramScraper {
    client: BrowserlessClient,
    sessions: BrowserSessions,
    timeout: Duration,
}

impl InstagramScraper {
    /// `timeout` starts once a browser session is held; queueing for one is
    /// not counted.
    pub fn new(client: BrowserlessClient, sessions: BrowserSessions, timeout: Duration) -> Self {
        info!(timeout_secs = timeout.as_secs(), "Using InstagramScraper (browserless)");
        Self {
            client,
            sessions,
            timeout,
        }
    }

    async fn run_page_script(&self, url: &str) -> Result<PageData, ScrapeError> {
        let context = PageContext {
            url,
            user_agent: USER_AGENT,
            nav_timeout_ms: NAVIGATION_TIMEOUT.as_millis() as u64,
        };

        self.client
            .function(PAGE_SCRIPT, &context)
            .await
            .map_err(|e| match e {
                BrowserlessError::Timeout(_) => ScrapeError::Timeout(self.timeout.as_secs()),
                other => ScrapeError::Failed(other.to_string()),
            })
    }
}

#[async_trait]
impl ContentScraper for InstagramScraper {
    async fn scrape(
        &self,
        classification: &UrlClassification,
    ) -> Result<ContentMetadata, ScrapeError> {
        let url = classification.url.as_str();
        info!(url, content_type = classification.content_type.as_str(), "Instagram scrape started");

        let _permit = self
            .sessions
            .acquire()
            .await
            .map_err(|e| ScrapeError::Failed(format!("browser sessions closed: {e}")))?;

        let page = tokio::time::timeout(self.timeout, self.run_page_script(url))
            .await
            .map_err(|_| ScrapeError::Timeout(self.timeout.as_secs()))??;

        if let Some(status) = page.status.filter(|s| *s >= 400) {
            warn!(url, status, "Instagram responded with an error status");
            return Err(ScrapeError::Failed(format!("Instagram responded with {status}")));
        }

        let parsed = OgDescription::parse(page.description.as_deref().unwrap_or(""));
        info!(
            url,
            author = parsed.author.as_deref().unwrap_or("-"),
            likes = parsed.likes_count,
            comments = parsed.comments_count,
            images = page.image_urls.len(),
            "Instagram scrape finished"
        );

        let mut meta = ContentMetadata::new(classification);
        meta.caption = parsed.caption;
        meta.author = parsed.author;
        meta.likes_count = parsed.likes_count;
        meta.comments_count = parsed.comments_count;
        meta.posted_at = parsed.posted_at;
        meta.hashtags = parsed.hashtags;
        meta.og_image = page.image;
        meta.image_urls = page.image_urls;
        meta.author_profile_image_url = page.profile_image_url;
        Ok(meta)
    }

    fn name(&self) -> &str {
        "instagram"
    }
}

// --- og:description parsing ---

static RE_LIKES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d,]+)\s*likes?").expect("valid regex"));
static RE_COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d,]+)\s*comments?").expect("valid regex"));
static RE_AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\s*([\w.]+)\s+on\s+").expect("valid regex"));
static RE_POSTED_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"on\s+([\w\s,]+?):").expect("valid regex"));
static RE_CAPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s):\s*["']?(.+)"#).expect("valid regex"));
static RE_HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w+").expect("valid regex"));

/// Fields packed into Instagram's `og:description`, e.g.
/// `7,434 likes, 63 comments - jamsilism on September 24, 2025: "caption"`.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct OgDescription {
    pub author: Option<String>,
    pub likes_count: Option<i64>,
    pub comments_count: Option<i64>,
    pub posted_at: Option<String>,
    pub caption: Option<String>,
    pub hashtags: Vec<String>,
}

impl OgDescription {
    pub fn parse(description: &str) -> Self {
        if description.trim().is_empty() {
            return Self::default();
        }

        let first = |re: &Regex| {
            re.captures(description)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };
        let count = |re: &Regex| first(re).and_then(|s| s.replace(',', "").parse::<i64>().ok());

        // No "...: caption" part means the whole description is the caption.
        let caption = match first(&RE_CAPTION) {
            Some(c) => c.trim_end_matches(['"', '\'']).to_string(),
            None => description.to_string(),
        };

        Self {
            author: first(&RE_AUTHOR),
            likes_count: count(&RE_LIKES),
            comments_count: count(&RE_COMMENTS),
            posted_at: first(&RE_POSTED_AT).map(|s| s.trim().to_string()),
            caption: Some(caption),
            hashtags: RE_HASHTAG
                .find_iter(description)
                .map(|m| m.as_str().to_string())
                .collect(),
        }
    }
}
