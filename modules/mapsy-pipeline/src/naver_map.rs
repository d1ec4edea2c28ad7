use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use browserless_client::{BrowserlessClient, BrowserlessError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use mapsy_common::{PlaceDetail, ResolveError};

use crate::resolver::PlaceSearcher;
use crate::sessions::BrowserSessions;

const SEARCH_BASE: &str = "https://map.naver.com/p/search/";
const ELEMENT_WAIT: Duration = Duration::from_secs(10);
const PAGE_LOAD_WAIT: Duration = Duration::from_secs(3);
const MAX_IMAGE_COUNT: usize = 10;

/// Search Naver Map, open the first hit and read its detail panel. Both the
/// result list and the detail panel live in iframes.
const PAGE_SCRIPT: &str = r##"
export default async function ({ page, context }) {
  const sleep = (ms) => new Promise((r) => setTimeout(r, ms));
  const frameOf = async (selector) => {
    const handle = await page.waitForSelector(selector, { timeout: context.elementWaitMs });
    return handle.contentFrame();
  };

  await page.setViewport({ width: 1920, height: 1080 });
  await page.goto(context.searchUrl, { waitUntil: "networkidle2", timeout: context.navTimeoutMs });

  let search;
  try {
    search = await frameOf("#searchIframe");
  } catch (e) {
    search = null;
  }
  if (search) {
    const selectors = ["li.VLTHu a.place_bluelink", 'ul > li a[href="#"]', 'span.YwYLL, span[class*="name"]'];
    let clicked = false;
    for (const sel of selectors) {
      try {
        const el = await search.waitForSelector(sel, { timeout: context.elementWaitMs });
        await el.click();
        clicked = true;
        break;
      } catch (e) {}
    }
    if (!clicked) return { data: { found: false }, type: "application/json" };
    await sleep(context.pageLoadWaitMs);
  }

  let entry;
  try {
    entry = await frameOf("#entryIframe");
    await entry.waitForSelector("span.GHAhO", { timeout: context.elementWaitMs });
  } catch (e) {
    return { data: { found: false }, type: "application/json" };
  }
  await sleep(2000);

  const info = await entry.evaluate((maxImages) => {
    const text = (...sels) => {
      for (const s of sels) {
        const el = document.querySelector(s);
        if (el) return el.textContent.trim();
      }
      return null;
    };
    const texts = (primary, fallback) => {
      let els = document.querySelectorAll(primary);
      if (els.length === 0 && fallback) els = document.querySelectorAll(fallback);
      return Array.from(els).map((el) => el.textContent.trim()).filter(Boolean);
    };

    const r = {};
    r.name = text("span.GHAhO", "#_title span:first-child", ".place_section_header span");
    r.category = text("span.lnJFt", "#_title span:nth-child(2)");
    const rating = document.querySelector(".PXMot.LXIwF") || document.querySelector(".dAsGb .PXMot:first-child");
    const m = rating ? rating.textContent.match(/([\d.]+)/) : null;
    r.rating = m ? m[1] : null;
    r.visitorReviewText = document.querySelector('a[href*="/review/visitor"]')?.textContent ?? null;
    r.blogReviewText = document.querySelector('a[href*="/review/ugc"]')?.textContent ?? null;
    r.description = text("div.XtBbS", ".dAsGb > div:last-child");
    r.address = text("span.LDgIH", ".O8qbU.tQY7D span", '[class*="address"]');
    r.roadAddress = text(".LDgIH");
    r.subwayInfo = text("div.nZapA");
    r.directionsText = text("span.zPfVt", ".place_section_content .zPfVt");
    r.businessStatus = text("div.A_cdD em", ".pSavy em");
    r.businessHours = text("span.U7pYf time", ".pSavy time");
    r.openHoursDetail = texts(".A_cdD .y6tNq");
    r.holidayInfo = text(".A_cdD .vV_z_", '[class*="holiday"]');
    r.phoneNumber = text("span.xlx7Q", ".nbXkr span");
    const home = document.querySelector('a.place_bluelink[href*="http"]') ||
      document.querySelector('a[class*="homepage"]') ||
      document.querySelector('.place_section_content a[href^="http"]:not([href*="naver"])');
    r.homepageUrl = home ? home.href : null;
    r.reservationAvailable = !!(document.querySelector('a[href*="booking.naver"]') ||
      document.querySelector('a[href*="reserve.naver"]') ||
      document.querySelector('button[aria-label*="예약"]'));
    r.amenitiesText = text("div.xPvPE", ".Uv6Eo div");
    r.keywords = texts(".chip_group a, .place_section_content .chip a", '.place_section_content a[class*="tag"]')
      .filter((t) => !t.includes("리뷰"));
    r.tvAppearances = texts("div.TMK4W .A_cdD", '.place_section_content [class*="broadcast"]');
    r.menuInfo = texts(".place_section_content .LNvHf", '.place_section_content [class*="menu"] .name');

    try {
      const apollo = window.__APOLLO_STATE__;
      const key = apollo && Object.keys(apollo).find((k) => k.startsWith("Place:"));
      if (key) {
        r.latitude = apollo[key]?.y ?? apollo[key]?.latitude ?? null;
        r.longitude = apollo[key]?.x ?? apollo[key]?.longitude ?? null;
      }
      if (r.latitude == null) {
        const geo = document.querySelector('meta[name="geo.position"]');
        if (geo) [r.latitude, r.longitude] = geo.content.split(";");
      }
    } catch (e) {}

    const img = document.querySelector("div.fNygA img") || document.querySelector("img.K0PDV") ||
      document.querySelector(".place_thumb img");
    r.imageUrl = img ? img.src : null;
    const seen = new Set();
    for (const el of document.querySelectorAll('img[src*="pstatic.net"]')) {
      if (seen.size >= maxImages) break;
      const src = el.src;
      if (src && !["icon", "logo", "accessor", "sprite"].some((w) => src.includes(w))) seen.add(src);
    }
    r.imageUrls = [...seen];
    return r;
  }, context.maxImages);

  return { data: { found: true, pageUrl: page.url(), ...info }, type: "application/json" };
}
"##;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchContext<'a> {
    search_url: &'a str,
    nav_timeout_ms: u64,
    element_wait_ms: u64,
    page_load_wait_ms: u64,
    max_images: usize,
}

/// What the page script reads off the detail panel, before any parsing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPlace {
    found: bool,
    page_url: Option<String>,
    name: Option<String>,
    category: Option<String>,
    rating: Option<String>,
    visitor_review_text: Option<String>,
    blog_review_text: Option<String>,
    description: Option<String>,
    address: Option<String>,
    road_address: Option<String>,
    subway_info: Option<String>,
    directions_text: Option<String>,
    business_status: Option<String>,
    business_hours: Option<String>,
    open_hours_detail: Vec<String>,
    holiday_info: Option<String>,
    phone_number: Option<String>,
    homepage_url: Option<String>,
    reservation_available: bool,
    amenities_text: Option<String>,
    keywords: Vec<String>,
    tv_appearances: Vec<String>,
    menu_info: Vec<String>,
    latitude: Option<serde_json::Value>,
    longitude: Option<serde_json::Value>,
    image_url: Option<String>,
    image_urls: Vec<String>,
}

// --- Searcher ---

pub struct NaverMapSearcher {
    client: BrowserlessClient,
    sessions: BrowserSessions,
    timeout: Duration,
}

impl NaverMapSearcher {
    pub fn new(client: BrowserlessClient, sessions: BrowserSessions, timeout: Duration) -> Self {
        info!(timeout_secs = timeout.as_secs(), "Using NaverMapSearcher (browserless)");
        Self {
            client,
            sessions,
            timeout,
        }
    }

    async fn run_page_script(&self, name: &str, search_url: &str) -> Result<RawPlace, ResolveError> {
        let context = SearchContext {
            search_url,
            nav_timeout_ms: self.timeout.as_millis() as u64,
            element_wait_ms: ELEMENT_WAIT.as_millis() as u64,
            page_load_wait_ms: PAGE_LOAD_WAIT.as_millis() as u64,
            max_images: MAX_IMAGE_COUNT,
        };

        self.client
            .function(PAGE_SCRIPT, &context)
            .await
            .map_err(|e| match e {
                BrowserlessError::Timeout(_) => ResolveError::Timeout(name.to_string()),
                other => ResolveError::Search(other.to_string()),
            })
    }
}

#[async_trait]
impl PlaceSearcher for NaverMapSearcher {
    async fn search_and_resolve(&self, name: &str) -> Result<PlaceDetail, ResolveError> {
        let search_url = search_url(name)?;
        info!(query = name, search_url = search_url.as_str(), "Naver map search");

        let _permit = self
            .sessions
            .acquire()
            .await
            .map_err(|e| ResolveError::Search(format!("browser sessions closed: {e}")))?;

        let raw = tokio::time::timeout(self.timeout, self.run_page_script(name, &search_url))
            .await
            .map_err(|_| ResolveError::Timeout(name.to_string()))??;

        if !raw.found {
            return Err(ResolveError::NotFound(name.to_string()));
        }

        Ok(into_place_detail(raw, name, &search_url))
    }
}

// --- Parsing ---

static RE_PLACE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/place/(\d+)").expect("valid regex"));
static RE_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\d,]+").expect("valid regex"));

/// `https://map.naver.com/p/search/<percent-encoded query>`
pub fn search_url(query: &str) -> Result<String, ResolveError> {
    let mut url = url::Url::parse(SEARCH_BASE)
        .map_err(|e| ResolveError::Search(format!("bad search base: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ResolveError::Search("search base cannot hold a path".into()))?
        .pop_if_empty()
        .push(query.trim());
    Ok(url.to_string())
}

pub fn extract_place_id(url: &str) -> Option<String> {
    RE_PLACE_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn parse_rating(text: Option<&str>) -> Option<f64> {
    text?.trim().parse().ok()
}

/// First run of digits in e.g. "방문자 리뷰 1,234".
pub fn parse_review_count(text: Option<&str>) -> Option<i64> {
    let m = RE_COUNT.find(text?)?;
    m.as_str().replace(',', "").parse().ok()
}

fn coordinate(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn into_place_detail(raw: RawPlace, query: &str, search_url: &str) -> PlaceDetail {
    let place_id = raw.page_url.as_deref().and_then(extract_place_id);
    let naver_map_url = place_id.as_ref().map(|id| format!("{search_url}/place/{id}"));

    let amenities = raw
        .amenities_text
        .as_deref()
        .map(|t| {
            t.split(',')
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect()
        })
        .unwrap_or_default();

    PlaceDetail {
        place_id: place_id.unwrap_or_else(|| "unknown".to_string()),
        name: raw
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| query.to_string()),
        latitude: coordinate(raw.latitude.as_ref()),
        longitude: coordinate(raw.longitude.as_ref()),
        road_address: raw.road_address.or_else(|| raw.address.clone()),
        address: raw.address,
        category: raw.category,
        description: raw.description,
        rating: parse_rating(raw.rating.as_deref()),
        visitor_review_count: parse_review_count(raw.visitor_review_text.as_deref()),
        blog_review_count: parse_review_count(raw.blog_review_text.as_deref()),
        business_status: raw.business_status,
        business_hours: raw.business_hours,
        open_hours_detail: raw.open_hours_detail,
        holiday_info: raw.holiday_info,
        phone_number: raw.phone_number,
        homepage_url: raw.homepage_url,
        naver_map_url,
        reservation_available: raw.reservation_available,
        subway_info: raw.subway_info,
        directions_text: raw.directions_text,
        amenities,
        keywords: raw.keywords,
        tv_appearances: raw.tv_appearances,
        menu_info: raw.menu_info,
        image_url: raw.image_url,
        image_urls: raw.image_urls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_script_keeps_iframe_selectors() {
        let script = PAGE_SCRIPT.trim();
        assert!(script.starts_with("export default async function"));
        assert!(script.contains(r##"frameOf("#searchIframe")"##));
        assert!(script.contains(r##"frameOf("#entryIframe")"##));
        assert!(script.contains(r##"a[href="#"]"##));
        assert!(script.ends_with('}'));
    }

    #[test]
    fn search_url_encodes_query() {
        assert_eq!(
            search_url("블루보틀 성수").unwrap(),
            "https://map.naver.com/p/search/%EB%B8%94%EB%A3%A8%EB%B3%B4%ED%8B%80%20%EC%84%B1%EC%88%98"
        );
        assert_eq!(
            search_url("a/b").unwrap(),
            "https://map.naver.com/p/search/a%2Fb"
        );
    }

    #[test]
    fn place_id_from_detail_url() {
        assert_eq!(
            extract_place_id("https://map.naver.com/p/search/x/place/11679241?c=15.00"),
            Some("11679241".into())
        );
        assert_eq!(extract_place_id("https://map.naver.com/p/search/x"), None);
    }

    #[test]
    fn rating_and_counts() {
        assert_eq!(parse_rating(Some(" 4.52 ")), Some(4.52));
        assert_eq!(parse_rating(Some("별점")), None);
        assert_eq!(parse_rating(None), None);
        assert_eq!(parse_review_count(Some("방문자 리뷰 1,234")), Some(1234));
        assert_eq!(parse_review_count(Some("블로그 리뷰")), None);
    }

    #[test]
    fn raw_place_maps_to_detail() {
        let raw: RawPlace = serde_json::from_value(serde_json::json!({
            "found": true,
            "pageUrl": "https://map.naver.com/p/search/x/place/11679241",
            "name": "늘푸른목장 잠실본점",
            "rating": "4.4",
            "visitorReviewText": "방문자 리뷰 3,210",
            "address": "서울 송파구 백제고분로9길 34",
            "amenitiesText": "단체 이용 가능, 주차, ",
            "latitude": "37.5068",
            "longitude": 127.0812
        }))
        .unwrap();

        let url = "https://map.naver.com/p/search/x";
        let place = into_place_detail(raw, "늘푸른목장", url);
        assert_eq!(place.place_id, "11679241");
        assert_eq!(place.name, "늘푸른목장 잠실본점");
        assert_eq!(place.rating, Some(4.4));
        assert_eq!(place.visitor_review_count, Some(3210));
        assert_eq!(place.road_address, place.address);
        assert_eq!(place.amenities, vec!["단체 이용 가능", "주차"]);
        assert_eq!(place.latitude, Some(37.5068));
        assert_eq!(place.longitude, Some(127.0812));
        assert_eq!(
            place.naver_map_url.as_deref(),
            Some("https://map.naver.com/p/search/x/place/11679241")
        );
    }

    #[test]
    fn sparse_place_falls_back_to_query() {
        let raw = RawPlace {
            found: true,
            ..Default::default()
        };
        let place = into_place_detail(raw, "스시호", "https://map.naver.com/p/search/q");
        assert_eq!(place.name, "스시호");
        assert_eq!(place.place_id, "unknown");
        assert!(place.naver_map_url.is_none());
        assert!(!place.has_coordinates());
    }
}
