use crate::cache::JsonCache;
use crate::fetch::Fetcher;
use crate::render::{write_page, Renderer};
use crate::scrape;
use crate::settings::Settings;
use crate::structs::*;

use log::{debug, info};
use std::error::Error;
use std::path::PathBuf;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Crawls (or loads from cache) every course and writes the site.
/// Returns the path of the index page.
pub async fn run(settings: &Settings) -> Result<PathBuf> {
    let fetcher = Fetcher::new(settings)?;
    let fetcher = &fetcher;
    let cache = JsonCache::new(&settings.cache_dir, settings.force_refresh);
    let renderer = Renderer::load(settings);

    let courses: Vec<Course> = cache
        .load_or_build(&settings.course_cache_file, || {
            scrape::discover(fetcher, settings)
        })
        .await?
        .into_iter()
        .filter(Course::has_title)
        .collect();

    info!("Generating index page");
    let index_path = settings.index_path();
    write_page(&index_path, &renderer.index_page(&courses)?)?;

    for course in &courses {
        let links = cache
            .load_or_build(&settings.link_cache_file(course.number), || async move {
                let links = scrape::course_links(fetcher, settings, course).await;
                info!("Saving {} links for course {}", links.len(), course.number);
                for link in &links {
                    debug!("\t{}\t<{}>", link.content, link.href);
                }
                links
            })
            .await?;

        info!("Generating course page {}", course.number);
        write_page(
            &settings.page_path(course.number),
            &renderer.course_page(course, &links)?,
        )?;
    }

    Ok(index_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Course 6 has one catalog page with one live subject; course 7 has none.
    async fn catalog_server() -> (mockito::ServerGuard, Vec<mockito::Mock>) {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        let catalog = server
            .mock("GET", "/m6a.html")
            .with_status(200)
            .with_body(
                "<h1>Course 6: Electrical Engineering and Computer Science</h1>\
                 <h3>6.172 Performance Engineering</h3>\
                 <h3>Introduction</h3>\
                 <h3>6.999 Retired Subject</h3>",
            )
            .expect(2)
            .create_async()
            .await;
        mocks.push(catalog);
        let mock = server
            .mock("GET", "/m6b.html")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;
        mocks.push(mock);
        let mock = server
            .mock("GET", "/m7a.html")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;
        mocks.push(mock);
        let mock = server
            .mock("GET", "/6.172")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        mocks.push(mock);
        let mock = server
            .mock("GET", "/6.999")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;
        mocks.push(mock);
        (server, mocks)
    }

    fn site_settings(server: &mockito::ServerGuard, dir: &std::path::Path) -> Settings {
        Settings {
            catalog_url_template: format!("{}/m{{i}}{{j}}.html", server.url()),
            subpage_base_url: server.url(),
            course_range_start: 6,
            course_range_end: 8,
            template_file: concat!(env!("CARGO_MANIFEST_DIR"), "/template.html").into(),
            output_dir: dir.join("site"),
            cache_dir: dir.join("cache"),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn second_run_is_served_from_cache() {
        let (server, mocks) = catalog_server().await;
        let dir = tempfile::tempdir().unwrap();
        let settings = site_settings(&server, dir.path());

        let index = run(&settings).await.unwrap();
        let courses_json = fs::read(dir.path().join("cache/courses.json")).unwrap();
        let links_json = fs::read(dir.path().join("cache/links6.json")).unwrap();
        let index_html = fs::read_to_string(&index).unwrap();
        let page_html = fs::read_to_string(settings.page_path(6)).unwrap();

        run(&settings).await.unwrap();
        assert_eq!(fs::read(dir.path().join("cache/courses.json")).unwrap(), courses_json);
        assert_eq!(fs::read(dir.path().join("cache/links6.json")).unwrap(), links_json);
        assert_eq!(fs::read_to_string(&index).unwrap(), index_html);
        assert_eq!(fs::read_to_string(settings.page_path(6)).unwrap(), page_html);

        // Each URL was crawled by the first run only.
        for mock in &mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn untitled_courses_get_no_page() {
        let (server, _mocks) = catalog_server().await;
        let dir = tempfile::tempdir().unwrap();
        let settings = site_settings(&server, dir.path());

        let index = run(&settings).await.unwrap();

        let cached: Vec<Course> = JsonCache::new(&settings.cache_dir, false)
            .load(&settings.course_cache_file)
            .unwrap()
            .unwrap();
        assert_eq!(cached.len(), 2);
        assert!(!cached[1].has_title());

        let index_html = fs::read_to_string(index).unwrap();
        assert!(index_html.contains("course 6"));
        assert!(!index_html.contains("course 7"));
        assert!(!settings.page_path(7).exists());

        let page_html = fs::read_to_string(settings.page_path(6)).unwrap();
        assert!(page_html.contains(&format!("{}/6.172", server.url())));
        assert!(!page_html.contains("6.999"));
    }
}
