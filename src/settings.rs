use config::{Config, Environment, File};
use serde::Deserialize;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.1; Win64; x64; rv:60.0) Gecko/20100101 Firefox/60.0";

/// How a relative meta-refresh target is combined with the page it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelativeRedirects {
    /// Plain string concatenation onto the response URL.
    Append,
    /// RFC 3986 reference resolution against the response URL.
    Join,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub index_url: String,
    /// `{i}` is the course number, `{j}` the catalog letter.
    pub catalog_url_template: String,
    pub subpage_base_url: String,
    pub course_range_start: u32,
    pub course_range_end: u32,

    pub template_file: PathBuf,
    pub output_dir: PathBuf,
    pub index_file: String,
    pub page_file_pattern: String,

    pub cache_dir: PathBuf,
    pub course_cache_file: String,
    pub link_cache_pattern: String,

    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_redirect_hops: usize,
    pub relative_redirects: RelativeRedirects,
    /// 0 disables pacing.
    pub requests_per_second: u32,

    pub force_refresh: bool,
    pub open_browser: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_url: "http://student.mit.edu/catalog/index.cgi".into(),
            catalog_url_template: "http://student.mit.edu/catalog/m{i}{j}.html".into(),
            subpage_base_url: "http://web.mit.edu".into(),
            course_range_start: 0,
            course_range_end: 30,
            template_file: "template.html".into(),
            output_dir: ".".into(),
            index_file: "index.html".into(),
            page_file_pattern: "links{}.html".into(),
            cache_dir: ".".into(),
            course_cache_file: "courses.json".into(),
            link_cache_pattern: "links{}.json".into(),
            user_agent: USER_AGENT.into(),
            timeout_secs: 5,
            max_redirect_hops: 20,
            relative_redirects: RelativeRedirects::Append,
            requests_per_second: 0,
            force_refresh: false,
            open_browser: true,
        }
    }
}

impl Settings {
    /// Defaults, then `coursemap.toml` if present, then `CM_*` variables.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name("coursemap").required(false))
            .add_source(Environment::with_prefix("CM").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn catalog_url(&self, number: u32, letter: char) -> String {
        self.catalog_url_template
            .replace("{i}", &number.to_string())
            .replace("{j}", &letter.to_string())
    }

    pub fn page_file(&self, number: u32) -> String {
        self.page_file_pattern.replace("{}", &number.to_string())
    }

    pub fn link_cache_file(&self, number: u32) -> String {
        self.link_cache_pattern.replace("{}", &number.to_string())
    }

    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(&self.index_file)
    }

    pub fn page_path(&self, number: u32) -> PathBuf {
        self.output_dir.join(self.page_file(number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_url_fills_both_placeholders() {
        let settings = Settings::default();
        assert_eq!(
            settings.catalog_url(6, 'b'),
            "http://student.mit.edu/catalog/m6b.html"
        );
    }

    #[test]
    fn per_course_file_names() {
        let settings = Settings {
            output_dir: "out".into(),
            ..Settings::default()
        };
        assert_eq!(settings.page_file(18), "links18.html");
        assert_eq!(settings.link_cache_file(18), "links18.json");
        assert_eq!(settings.page_path(2), PathBuf::from("out/links2.html"));
        assert_eq!(settings.index_path(), PathBuf::from("out/index.html"));
    }
}
