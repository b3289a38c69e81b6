//! Pure helpers shared by the network rollup and the report assembler:
//! URL → registrable host, and URL + hints → coarse resource category.

use serde::{Deserialize, Serialize};
use url::{Host, Url};

/// Multi-part public suffixes we reduce against. A full public-suffix
/// list is overkill for rollup keys; this covers the common two-label
/// registries.
const MULTI_PART_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "me.uk", "com.au", "net.au", "org.au", "co.jp", "ne.jp",
    "or.jp", "co.kr", "co.in", "co.nz", "co.za", "com.br", "com.cn", "com.hk", "com.mx", "com.sg",
    "com.tw", "com.tr",
];

/// Reduce a URL to the registrable host used as a rollup key.
///
/// IP literals pass through untouched. A leading `www.` is stripped
/// before reduction. Returns `None` for unparseable input or URLs
/// without a host (`data:`, `about:`, ...).
pub fn registrable_host(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    match url.host()? {
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
        Host::Domain(domain) => {
            let host = domain.strip_prefix("www.").unwrap_or(domain);
            Some(reduce_domain(host))
        }
    }
}

/// Scheme + registrable host, used as the history key for one page.
pub fn origin_key(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = registrable_host(raw)?;
    Some(format!("{}://{}", url.scheme(), host))
}

fn reduce_domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host.to_string();
    }
    let tail2 = labels[labels.len() - 2..].join(".");
    let keep = if MULTI_PART_SUFFIXES.contains(&tail2.as_str()) {
        3
    } else {
        2
    };
    if labels.len() <= keep {
        host.to_string()
    } else {
        labels[labels.len() - keep..].join(".")
    }
}

/// Coarse resource category used for per-type rollups.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Document,
    Stylesheet,
    Script,
    Image,
    Font,
    Media,
    Fetch,
    WebSocket,
    Other,
}

impl ResourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Document => "document",
            ResourceCategory::Stylesheet => "stylesheet",
            ResourceCategory::Script => "script",
            ResourceCategory::Image => "image",
            ResourceCategory::Font => "font",
            ResourceCategory::Media => "media",
            ResourceCategory::Fetch => "fetch",
            ResourceCategory::WebSocket => "websocket",
            ResourceCategory::Other => "other",
        }
    }
}

/// Resolve a category from, in precedence order: the event source's type
/// hint, the response MIME type, and finally the URL path extension.
pub fn classify(hint: Option<&str>, mime: Option<&str>, raw_url: &str) -> ResourceCategory {
    if let Some(category) = hint.and_then(from_hint) {
        return category;
    }
    if let Some(category) = mime.and_then(from_mime) {
        return category;
    }
    from_extension(raw_url).unwrap_or(ResourceCategory::Other)
}

fn from_hint(hint: &str) -> Option<ResourceCategory> {
    match hint.to_ascii_lowercase().as_str() {
        "document" | "main_frame" | "sub_frame" => Some(ResourceCategory::Document),
        "stylesheet" | "css" => Some(ResourceCategory::Stylesheet),
        "script" => Some(ResourceCategory::Script),
        "image" | "imageset" => Some(ResourceCategory::Image),
        "font" => Some(ResourceCategory::Font),
        "media" | "audio" | "video" => Some(ResourceCategory::Media),
        "fetch" | "xhr" | "xmlhttprequest" | "ping" | "beacon" | "eventsource" => {
            Some(ResourceCategory::Fetch)
        }
        "websocket" => Some(ResourceCategory::WebSocket),
        _ => None,
    }
}

fn from_mime(mime: &str) -> Option<ResourceCategory> {
    let mime = mime
        .split(';')
        .next()
        .unwrap_or(mime)
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "text/html" | "application/xhtml+xml" => return Some(ResourceCategory::Document),
        "text/css" => return Some(ResourceCategory::Stylesheet),
        "text/javascript" | "application/javascript" | "application/x-javascript" => {
            return Some(ResourceCategory::Script)
        }
        "application/json" => return Some(ResourceCategory::Fetch),
        "image/svg+xml" => return Some(ResourceCategory::Image),
        _ => {}
    }
    let top = mime.split('/').next().unwrap_or("");
    match top {
        "image" => Some(ResourceCategory::Image),
        "font" => Some(ResourceCategory::Font),
        "audio" | "video" => Some(ResourceCategory::Media),
        _ => None,
    }
}

fn from_extension(raw_url: &str) -> Option<ResourceCategory> {
    let url = Url::parse(raw_url).ok()?;
    let path = url.path();
    let ext = path.rsplit('.').next()?.to_ascii_lowercase();
    if path.matches('.').count() == 0 {
        return None;
    }
    match ext.as_str() {
        "html" | "htm" => Some(ResourceCategory::Document),
        "css" => Some(ResourceCategory::Stylesheet),
        "js" | "mjs" => Some(ResourceCategory::Script),
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "svg" | "ico" => {
            Some(ResourceCategory::Image)
        }
        "woff" | "woff2" | "ttf" | "otf" | "eot" => Some(ResourceCategory::Font),
        "mp3" | "mp4" | "webm" | "ogg" | "wav" | "m3u8" => Some(ResourceCategory::Media),
        "json" => Some(ResourceCategory::Fetch),
        _ => None,
    }
}
