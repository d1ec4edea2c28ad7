use url::Url;

use mapsy_common::{ClassifyError, Platform, UrlClassification};

/// Map a content URL to its platform and content type. Pure, no network.
///
/// | host            | path                                  | type     |
/// |-----------------|---------------------------------------|----------|
/// | instagram.com   | `p/<code>`                            | `post`   |
/// | instagram.com   | `reel/<code>`, `reels/<code>`         | `reel`   |
/// | instagram.com   | `tv/<code>`                           | `igtv`   |
/// | youtube.com     | `shorts/<id>`                         | `shorts` |
/// | youtube.com     | `watch?v=`, `live/<id>`, `embed/<id>` | `video`  |
/// | youtu.be        | `<id>`                                | `video`  |
pub fn classify_url(raw: &str) -> Result<UrlClassification, ClassifyError> {
    let raw = raw.trim();
    let parsed = Url::parse(raw).map_err(|e| ClassifyError::InvalidUrl(format!("{raw}: {e}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ClassifyError::InvalidUrl(format!(
            "only http/https URLs are accepted, got {}",
            parsed.scheme()
        )));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ClassifyError::InvalidUrl(format!("{raw}: missing host")))?
        .to_ascii_lowercase();

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let (platform, content_type) = if host_matches(&host, "instagram.com") {
        (Platform::Instagram, instagram_type(&segments))
    } else if host == "youtu.be" {
        (Platform::Youtube, segments.first().map(|_| "video"))
    } else if host_matches(&host, "youtube.com") {
        (Platform::Youtube, youtube_type(&parsed, &segments))
    } else {
        return Err(ClassifyError::UnsupportedPlatform(host));
    };

    let content_type = content_type.ok_or_else(|| ClassifyError::UnsupportedContentShape {
        platform,
        url: raw.to_string(),
    })?;

    Ok(UrlClassification {
        platform,
        content_type: content_type.to_string(),
        url: raw.to_string(),
    })
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

fn instagram_type(segments: &[&str]) -> Option<&'static str> {
    match segments {
        ["p", _code, ..] => Some("post"),
        ["reel" | "reels", _code, ..] => Some("reel"),
        ["tv", _code, ..] => Some("igtv"),
        _ => None,
    }
}

fn youtube_type(parsed: &Url, segments: &[&str]) -> Option<&'static str> {
    match segments {
        ["shorts", _id, ..] => Some("shorts"),
        ["live" | "embed", _id, ..] => Some("video"),
        ["watch"] => parsed
            .query_pairs()
            .any(|(k, v)| k == "v" && !v.is_empty())
            .then_some("video"),
        _ => None,
    }
}
