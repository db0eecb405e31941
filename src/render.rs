//! Listing views and the ASCII outline of a novel.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::models::{Chapter, Draft, Part, Plotline, Version};
use crate::novel::Novel;

const PART: char = '§';
const CHAPTER: char = '¶';

// ============================================================
// Summaries
// ============================================================

#[derive(Debug, Clone, Serialize)]
pub struct NovelSummary {
    pub title: String,
    pub author: Option<String>,
    pub root: PathBuf,
    pub plotlines: usize,
    pub parts: usize,
    pub chapters: usize,
    pub versions: usize,
    pub drafts: usize,
    pub words: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotlineSummary {
    pub tag: String,
    pub comment: Option<String>,
    pub chapters: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartSummary {
    pub tag: String,
    pub number: u32,
    pub title: Option<String>,
    pub parent: Option<String>,
    pub depth: usize,
    pub chapters: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterSummary {
    pub tag: String,
    pub number: u32,
    pub title: Option<String>,
    pub plotline: Option<String>,
    pub part: Option<String>,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<usize>,
}

/// A version or draft with its number.
#[derive(Debug, Clone, Serialize)]
pub struct VersionSummary {
    pub number: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub path: PathBuf,
    pub vcs_hash: String,
    pub comment: Option<String>,
    pub timestamp: DateTime<FixedOffset>,
}

pub fn summarize_novel(novel: &Novel) -> NovelSummary {
    NovelSummary {
        title: novel.title().to_string(),
        author: novel.author().map(str::to_string),
        root: novel.env().root.clone(),
        plotlines: novel.plotlines().len(),
        parts: novel.parts_preorder().len(),
        chapters: novel.chapters().len(),
        versions: novel.versions().len(),
        drafts: novel.drafts().len(),
        words: novel.word_count(),
    }
}

pub fn summarize_plotline(novel: &Novel, plotline: &Plotline) -> PlotlineSummary {
    PlotlineSummary {
        tag: plotline.tag.clone(),
        comment: plotline.comment.clone(),
        chapters: novel
            .plotline_chapters(plotline.id)
            .into_iter()
            .map(Chapter::tag)
            .collect(),
    }
}

pub fn summarize_part(novel: &Novel, part: &Part) -> PartSummary {
    PartSummary {
        tag: novel.part_tag(part),
        number: novel.part_number(part),
        title: part.title.clone(),
        parent: part
            .parent_id
            .and_then(|id| novel.part(id))
            .map(|parent| novel.part_tag(parent)),
        depth: novel.part_depth(part),
        chapters: novel
            .part_chapters(part.id)
            .into_iter()
            .map(Chapter::tag)
            .collect(),
    }
}

pub fn summarize_chapter(novel: &Novel, chapter: &Chapter, word_counts: bool) -> ChapterSummary {
    ChapterSummary {
        tag: chapter.tag(),
        number: chapter.number,
        title: chapter.title.clone(),
        plotline: chapter
            .plotline_id
            .and_then(|id| novel.plotline(id))
            .map(|p| p.tag.clone()),
        part: chapter
            .part_id
            .and_then(|id| novel.part(id))
            .map(|p| novel.part_tag(p)),
        path: chapter.path.clone(),
        words: word_counts.then(|| novel.chapter_word_count(chapter)),
    }
}

pub fn summarize_version(number: usize, version: &Version) -> VersionSummary {
    VersionSummary {
        number,
        stage: None,
        path: version.path.clone(),
        vcs_hash: version.vcs_hash.clone(),
        comment: version.comment.clone(),
        timestamp: version.timestamp,
    }
}

pub fn summarize_draft(number: usize, draft: &Draft) -> VersionSummary {
    VersionSummary {
        stage: Some(draft.stage.clone()),
        ..summarize_version(number, &draft.version)
    }
}

impl fmt::Display for NovelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if let Some(author) = &self.author {
            writeln!(f, "by {}", author)?;
        }
        writeln!(f, "root:      {}", self.root.display())?;
        writeln!(f, "plotlines: {}", self.plotlines)?;
        writeln!(f, "parts:     {}", self.parts)?;
        writeln!(f, "chapters:  {}", self.chapters)?;
        writeln!(f, "versions:  {}", self.versions)?;
        writeln!(f, "drafts:    {}", self.drafts)?;
        write!(f, "words:     {}", self.words)
    }
}

impl fmt::Display for PlotlineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} chapters)", self.tag, self.chapters.len())?;
        if let Some(comment) = &self.comment {
            write!(f, ": {}", comment)?;
        }
        Ok(())
    }
}

impl fmt::Display for PartSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} ({} chapters)",
            "  ".repeat(self.depth),
            self.tag,
            self.chapters.len()
        )
    }
}

impl fmt::Display for ChapterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        if let Some(plotline) = &self.plotline {
            write!(f, " [{}]", plotline)?;
        }
        if let Some(part) = &self.part {
            write!(f, " in {}", part)?;
        }
        if let Some(words) = self.words {
            write!(f, " ({} words)", words)?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number)?;
        if let Some(stage) = &self.stage {
            write!(f, " {}", stage)?;
        }
        write!(
            f,
            " {} {} {}",
            self.timestamp.format(crate::models::TIMESTAMP_FORMAT),
            short_hash(&self.vcs_hash),
            self.path.display()
        )?;
        if let Some(comment) = &self.comment {
            write!(f, ": {}", comment)?;
        }
        Ok(())
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

// ============================================================
// Outline
// ============================================================

/// A node of the rendered outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub label: String,
    pub symbol: char,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    fn leaf(label: String, symbol: char) -> Self {
        Self {
            label,
            symbol,
            children: Vec::new(),
        }
    }
}

/// Build the outline of `novel`: the title at the root, parts with their sub-parts and
/// chapters below it, then the chapters outside any part.
pub fn outline(novel: &Novel, word_counts: bool) -> OutlineNode {
    fn chapter_node(novel: &Novel, chapter: &Chapter, word_counts: bool) -> OutlineNode {
        OutlineNode::leaf(
            summarize_chapter(novel, chapter, word_counts).to_string(),
            CHAPTER,
        )
    }

    fn part_node(novel: &Novel, part: &Part, word_counts: bool) -> OutlineNode {
        let mut children: Vec<OutlineNode> = novel
            .children(Some(part.id))
            .into_iter()
            .map(|child| part_node(novel, child, word_counts))
            .collect();
        children.extend(
            novel
                .part_chapters(part.id)
                .into_iter()
                .map(|chapter| chapter_node(novel, chapter, word_counts)),
        );
        OutlineNode {
            label: novel.part_tag(part),
            symbol: PART,
            children,
        }
    }

    let mut children: Vec<OutlineNode> = novel
        .children(None)
        .into_iter()
        .map(|part| part_node(novel, part, word_counts))
        .collect();
    children.extend(
        novel
            .orphan_chapters()
            .into_iter()
            .map(|chapter| chapter_node(novel, chapter, word_counts)),
    );

    let mut root = OutlineNode::leaf(novel.title().to_string(), PART);
    root.children = children;
    root
}

/// Render an outline as ASCII art.
///
/// Example output:
/// ```text
/// The Long Road
/// ├── § 1__departure
/// │   ├── § 1__departure.1__the_harbour
/// │   └── ¶ 1__first_light [main] (812 words)
/// └── ¶ 2 [main] (0 words)
/// ```
pub fn render_outline(root: &OutlineNode) -> String {
    let mut output = format!("{}\n", root.label);
    render_children(&mut output, &root.children, "");
    output
}

/// Each child gets a branch line under `prefix`; its own children continue the rail
/// unless it is the last one.
fn render_children(output: &mut String, children: &[OutlineNode], prefix: &str) {
    let mut rest = children.iter().peekable();
    while let Some(node) = rest.next() {
        let last = rest.peek().is_none();
        let (branch, rail) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
        output.push_str(&format!("{prefix}{branch}{} {}\n", node.symbol, node.label));
        render_children(output, &node.children, &format!("{prefix}{rail}"));
    }
}
