use crate::fetch::Fetcher;
use crate::settings::{RelativeRedirects, Settings};

use log::{info, warn};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[http-equiv]").expect("hardcoded selector is valid"));

static REFRESH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:url=+)(?:(?P<url>http.+)|(?P<rel>.+))")
        .expect("hardcoded regex pattern is valid")
});

/// Where a `<meta http-equiv="refresh">` tag points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTarget {
    Absolute(String),
    Relative(String),
    /// The tag was there but its content carried no `url=`.
    Unmatched(String),
}

pub fn meta_refresh_target(html: &str) -> Option<RefreshTarget> {
    let doc = Html::parse_document(html);
    let meta = doc.select(&META_SELECTOR).find(|el| {
        el.value()
            .attr("http-equiv")
            .is_some_and(|v| v.eq_ignore_ascii_case("refresh"))
    })?;
    let content = meta.value().attr("content").unwrap_or_default();

    let target = match REFRESH_REGEX.captures(content) {
        Some(caps) => match (caps.name("url"), caps.name("rel")) {
            (Some(url), _) => RefreshTarget::Absolute(url.as_str().into()),
            (None, Some(rel)) => RefreshTarget::Relative(rel.as_str().into()),
            (None, None) => RefreshTarget::Unmatched(content.into()),
        },
        None => RefreshTarget::Unmatched(content.into()),
    };
    Some(target)
}

/// Follows meta-refresh and bare 301 responses until a page settles.
pub struct Resolver<'a> {
    fetcher: &'a Fetcher,
    max_hops: usize,
    relative: RelativeRedirects,
}

impl<'a> Resolver<'a> {
    pub fn new(fetcher: &'a Fetcher, settings: &Settings) -> Self {
        Self {
            fetcher,
            max_hops: settings.max_redirect_hops,
            relative: settings.relative_redirects,
        }
    }

    /// Final URL of a 200 page reached from `url`, or `None` if the chain
    /// fails, dead-ends or runs past the hop limit.
    pub async fn resolve(&self, url: &str) -> Option<String> {
        let mut current = url.to_string();

        for _ in 0..=self.max_hops {
            let page = match self.fetcher.get(&current).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Request for {current} returned error: {e}");
                    return None;
                }
            };

            match meta_refresh_target(&page.body) {
                Some(RefreshTarget::Absolute(next)) => {
                    info!("Absolute redirect: {next}");
                    current = next;
                }
                Some(RefreshTarget::Relative(rel)) => {
                    current = self.relative_target(&page.url, &rel)?;
                    info!("Relative redirect: {current}");
                }
                Some(RefreshTarget::Unmatched(content)) => {
                    warn!("No match in {content}");
                    return None;
                }
                // Retry the same URL; the session may settle on a non-301.
                None if page.status == 301 => {}
                None if page.status == 200 => return Some(page.url),
                None => return None,
            }
        }

        warn!("Gave up on {url} after {} redirects", self.max_hops);
        None
    }

    fn relative_target(&self, base: &str, rel: &str) -> Option<String> {
        match self.relative {
            RelativeRedirects::Append => Some(format!("{base}{rel}")),
            RelativeRedirects::Join => match Url::parse(base).and_then(|b| b.join(rel)) {
                Ok(joined) => Some(joined.to_string()),
                Err(e) => {
                    warn!("Cannot join {rel} onto {base}: {e}");
                    None
                }
            },
        }
    }
}
