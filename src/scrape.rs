use crate::fetch::Fetcher;
use crate::redirect::Resolver;
use crate::settings::Settings;
use crate::structs::*;

use log::{info, warn};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Leading text node of an element, if its first child is one.
fn leading_text<'a>(el: &ElementRef<'a>) -> Option<&'a str> {
    el.first_child()
        .and_then(|node| node.value().as_text())
        .map(|text| &**text)
}

/// Title of a catalog page: whatever follows the last ": " in its first `h1`.
pub fn course_title(html: &str) -> Result<String> {
    let doc = Html::parse_document(html);
    let h1_sel = Selector::parse("h1")?;
    let h1 = doc.select(&h1_sel).next().ok_or("no h1")?;
    let text = leading_text(&h1).ok_or("h1 has no leading text")?;

    let title_re = Regex::new(r".+: (?P<course>.+)")?;
    let caps = title_re.captures(text).ok_or("h1 title parse")?;
    Ok(caps["course"].into())
}

pub async fn discover(fetcher: &Fetcher, settings: &Settings) -> Vec<Course> {
    let mut courses = Vec::new();
    for number in settings.course_range_start..settings.course_range_end {
        courses.push(discover_course(fetcher, settings, number).await);
    }
    courses
}

/// Walks the lettered catalog pages of one course until the first miss.
pub async fn discover_course(fetcher: &Fetcher, settings: &Settings, number: u32) -> Course {
    let mut title = String::new();
    let mut catalog_urls = Vec::new();

    for letter in 'a'..='z' {
        let url = settings.catalog_url(number, letter);
        info!("Trying url {url}");

        let page = match fetcher.get(&url).await {
            Ok(page) if page.is_ok() => page,
            Ok(page) => {
                info!("Failed ({}) {url}", page.status);
                break;
            }
            Err(e) => {
                warn!("Request for {url} returned error: {e}");
                break;
            }
        };

        match course_title(&page.body) {
            Ok(found) => {
                info!("Succeeded: {found}");
                title = found;
                catalog_urls.push(url);
            }
            Err(e) => warn!("Skipping catalog page {url}: {e}"),
        }
    }

    Course {
        course: title,
        number,
        course_url: settings.catalog_url(number, 'a'),
        catalog_urls,
    }
}

/// Headings on a catalog page that start with a subject number like `6.172`.
pub fn extract_linklets(html: &str) -> Result<Vec<Linklet>> {
    let doc = Html::parse_document(html);
    let h3_sel = Selector::parse("h3")?;
    let path_re = Regex::new(r"\d+\.\d+")?;

    let linklets = doc
        .select(&h3_sel)
        .filter_map(|h3| leading_text(&h3))
        .filter_map(|text| {
            let path = path_re.find(text)?;
            Some(Linklet {
                href: path.as_str().into(),
                content: text.trim_end().into(),
            })
        })
        .collect();

    Ok(linklets)
}

/// Keeps the linklets whose `{base_url}/{href}` resolves, with the resolved URL.
pub async fn validate(resolver: &Resolver<'_>, base_url: &str, linklets: Vec<Linklet>) -> Vec<Link> {
    let mut links = Vec::new();
    for linklet in linklets {
        let test_url = format!("{base_url}/{}", linklet.href);
        info!("Trying {test_url}");
        match resolver.resolve(&test_url).await {
            Some(good_url) => {
                info!("Good url: {good_url}");
                links.push(linklet.resolved(good_url));
            }
            None => info!("Invalid: {test_url}"),
        }
    }
    links
}

/// Every valid subpage across a course's catalog pages, in catalog order.
pub async fn course_links(fetcher: &Fetcher, settings: &Settings, course: &Course) -> Vec<Link> {
    let resolver = Resolver::new(fetcher, settings);
    let mut links = Vec::new();

    for src_url in &course.catalog_urls {
        let page = match fetcher.get(src_url).await {
            Ok(page) if page.is_ok() => page,
            Ok(page) => {
                warn!("Skipping catalog page {src_url}: status {}", page.status);
                continue;
            }
            Err(e) => {
                warn!("Request for {src_url} returned error: {e}");
                continue;
            }
        };
        let linklets = match extract_linklets(&page.body) {
            Ok(linklets) => linklets,
            Err(e) => {
                warn!("Skipping catalog page {src_url}: {e}");
                continue;
            }
        };
        links.extend(validate(&resolver, &settings.subpage_base_url, linklets).await);
    }

    links
}
