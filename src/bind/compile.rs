//! Flattening the document tree into a single Markdown document.

use std::fs;
use std::io;

use crate::config::Config;
use crate::error::Result;
use crate::models::{Chapter, Part};
use crate::novel::Novel;

/// Headings deeper than this are clamped.
const MAX_HEADING_LEVEL: usize = 6;

/// Render the whole novel: a title block, then every part depth first with its child
/// parts before its own chapters, then chapters outside any part. Without parts, the
/// chapters are emitted in order.
pub fn compile(novel: &Novel, config: &Config) -> Result<String> {
    let compiler = Compiler {
        novel,
        chapter_heading: config.get_str("chapter.heading")?,
        part_heading: config.get_str("part.heading")?,
    };

    let mut out = format!("# {}\n\n", novel.title());
    if let Some(author) = novel.author() {
        out.push_str(&format!("by {}\n\n", author));
    }

    let top = novel.children(None);
    if top.is_empty() {
        for chapter in novel.chapters() {
            compiler.chapter(&mut out, chapter, 2)?;
        }
    } else {
        for part in top {
            compiler.part(&mut out, part, 2)?;
        }
        for chapter in novel.orphan_chapters() {
            compiler.chapter(&mut out, chapter, 2)?;
        }
    }
    Ok(out)
}

struct Compiler<'a> {
    novel: &'a Novel,
    chapter_heading: &'a str,
    part_heading: &'a str,
}

impl Compiler<'_> {
    fn part(&self, out: &mut String, part: &Part, level: usize) -> Result<()> {
        let heading = format_heading(
            self.part_heading,
            self.novel.part_number(part),
            part.title.as_deref(),
            &self.novel.part_tag(part),
        );
        push_heading(out, level, &heading);

        for child in self.novel.children(Some(part.id)) {
            self.part(out, child, level + 1)?;
        }
        for chapter in self.novel.part_chapters(part.id) {
            self.chapter(out, chapter, level + 1)?;
        }
        Ok(())
    }

    fn chapter(&self, out: &mut String, chapter: &Chapter, level: usize) -> Result<()> {
        let heading = format_heading(
            self.chapter_heading,
            chapter.number,
            chapter.title.as_deref(),
            &chapter.tag(),
        );
        push_heading(out, level, &heading);

        let file = self.novel.env().resolve(&chapter.path);
        let text = match fs::read(&file) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("Chapter file {} is missing; binding it empty", file.display());
                String::new()
            }
            Err(e) => return Err(e.into()),
        };
        out.push_str(&text);
        if !text.is_empty() && !text.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
        Ok(())
    }
}

fn push_heading(out: &mut String, level: usize, heading: &str) {
    out.push_str(&"#".repeat(level.min(MAX_HEADING_LEVEL)));
    out.push(' ');
    out.push_str(heading);
    out.push_str("\n\n");
}

/// Fill `{number}`, `{title}` and `{tag}` in a heading template. Without a title the
/// separator left dangling after the number is dropped.
pub fn format_heading(template: &str, number: u32, title: Option<&str>, tag: &str) -> String {
    let title = title.unwrap_or_default();
    let heading = template
        .replace("{number}", &number.to_string())
        .replace("{tag}", tag)
        .replace("{title}", title);
    if title.is_empty() {
        heading
            .trim_end_matches(|c: char| c == ':' || c == '-' || c.is_whitespace())
            .to_string()
    } else {
        heading
    }
}
