use crate::settings::Settings;
use crate::structs::{Course, Link};

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use log::{info, warn};
use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use regex::Regex;
use std::error::Error;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

const BUILTIN_TEMPLATE: &str = include_str!("../template.html");
const INDEX_TITLE: &str = "MIT Course Websites";

static LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\d\.,\s\[\]A-Z]+) (.+)").expect("hardcoded regex pattern is valid")
});

/// Splits a heading like `6.172 Performance Engineering` into its subject
/// number and name. Labels that don't split render entirely as the number.
pub fn split_label(content: &str) -> (String, String) {
    let Some((number, name)) = LABEL_REGEX
        .captures(content)
        .and_then(|caps| Some((caps.get(1)?, caps.get(2)?)))
    else {
        return (content.into(), String::new());
    };
    let mut parts = [
        &content[..number.start()],
        number.as_str(),
        name.as_str(),
        &content[name.end()..],
    ]
    .into_iter()
    .filter(|part| !part.is_empty());

    let number = parts.next().unwrap_or_default().to_string();
    let name = parts.next().unwrap_or_default().to_string();
    (number, name)
}

pub struct Renderer<'a> {
    template: String,
    settings: &'a Settings,
}

impl<'a> Renderer<'a> {
    /// Reads the configured template, falling back to the built-in one.
    pub fn load(settings: &'a Settings) -> Self {
        let template = match fs::read_to_string(&settings.template_file) {
            Ok(template) => template,
            Err(e) => {
                warn!(
                    "Template {} unreadable ({e}), using built-in template",
                    settings.template_file.display()
                );
                BUILTIN_TEMPLATE.into()
            }
        };
        Self::with_template(template, settings)
    }

    pub fn with_template(template: String, settings: &'a Settings) -> Self {
        Self { template, settings }
    }

    pub fn index_page(&self, courses: &[Course]) -> Result<String> {
        let index_url = attr(&self.settings.index_url);

        let mut header = String::new();
        writeln!(header, "    <h1>{INDEX_TITLE}</h1>")?;
        writeln!(header, "    <p>")?;
        writeln!(header, "      <a href=\"{index_url}\" target=\"_blank\">MIT Subject Listing ➜</a>")?;
        writeln!(header, "    </p>")?;

        let mut main = String::new();
        writeln!(main, "    <ul>")?;
        for course in courses {
            writeln!(main, "      <li>")?;
            writeln!(
                main,
                "        <a href=\"{}\">",
                attr(&self.settings.page_file(course.number))
            )?;
            writeln!(main, "          <span class=\"cnum\">course {}</span>", course.number)?;
            writeln!(main, "          <span>{}</span>", text(&course.course))?;
            writeln!(main, "        </a>")?;
            writeln!(main, "      </li>")?;
        }
        writeln!(main, "    </ul>")?;

        self.fill(INDEX_TITLE, &header, &main)
    }

    pub fn course_page(&self, course: &Course, links: &[Link]) -> Result<String> {
        let title = text(&course.course);
        let index_url = attr(&self.settings.index_url);

        let mut header = String::new();
        writeln!(header, "    <h1>{title}</h1>")?;
        writeln!(header, "    <p>")?;
        writeln!(
            header,
            "      <a href=\"{}\">⬉ Course Index</a>",
            attr(&self.settings.index_file)
        )?;
        writeln!(header, "    </p>")?;
        writeln!(header, "    <p>")?;
        writeln!(
            header,
            "      <a href=\"{}\" target=\"_blank\">MIT {title} Course Catalog ➜</a>",
            attr(&course.course_url)
        )?;
        writeln!(header, "    </p>")?;
        writeln!(header, "    <p>")?;
        writeln!(header, "      via")?;
        writeln!(header, "      <a href=\"{index_url}\" target=\"_blank\">MIT Subject Listing ➜</a>")?;
        writeln!(header, "    </p>")?;

        let mut main = String::new();
        writeln!(main, "    <ul>")?;
        for link in links {
            let (number, name) = split_label(&link.content);
            writeln!(main, "      <li>")?;
            writeln!(
                main,
                "        <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">",
                attr(&link.href)
            )?;
            writeln!(main, "          <span class=\"clnum\">{}</span>", text(&number))?;
            writeln!(main, "          <span>{}</span>", text(&name))?;
            writeln!(main, "        </a>")?;
            writeln!(main, "      </li>")?;
        }
        writeln!(main, "    </ul>")?;

        self.fill(&course.course, &header, &main)
    }

    fn fill(&self, title: &str, header: &str, main: &str) -> Result<String> {
        let mut saw_header = false;
        let mut saw_main = false;

        let html = rewrite_str(
            &self.template,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!("head > title", |el| {
                        el.set_inner_content(title, ContentType::Text);
                        Ok(())
                    }),
                    element!("body header", |el| {
                        saw_header = true;
                        el.append(header, ContentType::Html);
                        Ok(())
                    }),
                    element!("body main", |el| {
                        saw_main = true;
                        el.append(main, ContentType::Html);
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::new()
            },
        )?;

        if !saw_header {
            Err("template has no <header> element")?
        }
        if !saw_main {
            Err("template has no <main> element")?
        }
        Ok(html)
    }
}

pub fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, html)?;
    info!("Wrote {}", path.display());
    Ok(())
}
