use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use makenovel::config::{ConfigEntry, ValueType};
use makenovel::editor::open_in_editor;
use makenovel::models::*;
use makenovel::prompt::StdinConfirm;
use makenovel::render::{self, outline, render_outline};
use makenovel::vcs::GitVcs;
use makenovel::{Binder, Config, Novel, NovelEnvironment, NovelError};

#[derive(Parser)]
#[command(name = "makenovel")]
#[command(about = "Keep a novel as plotlines, parts and chapters, and bind it into versions")]
struct Cli {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "project", global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List entities of one kind
    List {
        #[arg(value_enum)]
        what: ListTarget,
    },
    /// Show one entity, or the novel itself
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },
    /// Add a plotline, part or chapter
    Add {
        #[command(subcommand)]
        what: AddTarget,
    },
    /// Retitle, rename or move a plotline, part or chapter
    Update {
        #[command(subcommand)]
        what: UpdateTarget,
    },
    /// Delete an entity
    Delete {
        #[arg(value_enum)]
        kind: DeleteKind,
        tag: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Open a chapter in the configured editor
    Edit { tag: String },
    /// Compile the novel into one document and record it as a version
    Bind {
        #[arg(short, long)]
        comment: Option<String>,
        /// Record a draft with this stage label instead of a version
        #[arg(short, long)]
        stage: Option<String>,
    },
    /// Show config values, or set one
    Config {
        key: Option<String>,
        value: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListTarget {
    Plotlines,
    Parts,
    Chapters,
    Versions,
    Drafts,
    /// The part tree with its chapters
    Outline,
}

#[derive(Subcommand)]
enum ShowTarget {
    Novel,
    Plotline { tag: String },
    Part { tag: String },
    Chapter { tag: String },
    Version { tag: String },
    Draft { tag: String },
}

#[derive(Subcommand)]
enum AddTarget {
    Plotline {
        tag: String,
        #[arg(short, long)]
        comment: Option<String>,
    },
    Part {
        #[arg(short, long)]
        title: Option<String>,
        #[arg(long)]
        before: Option<String>,
        #[arg(long)]
        after: Option<String>,
        /// Add as the last child of this part
        #[arg(long)]
        parent: Option<String>,
    },
    Chapter {
        plotline: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        part: Option<String>,
        #[arg(long)]
        before: Option<String>,
        #[arg(long)]
        after: Option<String>,
    },
}

#[derive(Subcommand)]
enum UpdateTarget {
    Plotline {
        tag: String,
        /// Rename the plotline
        #[arg(long = "tag")]
        new_tag: Option<String>,
        #[arg(short, long)]
        comment: Option<String>,
    },
    Part {
        tag: String,
        /// New title; an empty title clears it
        #[arg(short, long)]
        title: Option<String>,
        #[arg(long)]
        before: Option<String>,
        #[arg(long)]
        after: Option<String>,
        #[arg(long)]
        parent: Option<String>,
    },
    Chapter {
        tag: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(long)]
        plotline: Option<String>,
        /// Move into this part; an empty tag takes the chapter out of its part
        #[arg(short, long)]
        part: Option<String>,
        #[arg(long)]
        before: Option<String>,
        #[arg(long)]
        after: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DeleteKind {
    Plotline,
    Part,
    Chapter,
    Version,
    Draft,
}

/// Initialize tracing on stderr so stdout carries only command output
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "makenovel=warn".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let start = match &cli.project {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let env = NovelEnvironment::discover(&start)?;
    let config_path = env.config_path();
    let mut config = Config::load(config_path.as_deref())?;

    let mut novel = Novel::load(env, &config)?;
    let out = Output { json: cli.json };
    run(&out, cli.command, &mut novel, &mut config, config_path)?;
    novel.save()?;
    Ok(())
}

struct Output {
    json: bool,
}

impl Output {
    /// Print one value, as JSON or with its `Display`.
    fn one<T: Serialize + std::fmt::Display>(&self, value: &T) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", value);
        }
        Ok(())
    }

    /// Print a list, as a JSON array or one line per item.
    fn many<T: Serialize + std::fmt::Display>(&self, values: &[T]) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(values)?);
        } else {
            for value in values {
                println!("{}", value);
            }
        }
        Ok(())
    }
}

fn run(
    out: &Output,
    command: Commands,
    novel: &mut Novel,
    config: &mut Config,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let word_counts = config.get_bool("list.word_counts")?;

    match command {
        Commands::List { what } => match what {
            ListTarget::Plotlines => out.many(
                &novel
                    .plotlines()
                    .iter()
                    .map(|p| render::summarize_plotline(novel, p))
                    .collect::<Vec<_>>(),
            )?,
            ListTarget::Parts => out.many(
                &novel
                    .parts_preorder()
                    .into_iter()
                    .map(|p| render::summarize_part(novel, p))
                    .collect::<Vec<_>>(),
            )?,
            ListTarget::Chapters => out.many(
                &novel
                    .chapters()
                    .iter()
                    .map(|c| render::summarize_chapter(novel, c, word_counts))
                    .collect::<Vec<_>>(),
            )?,
            ListTarget::Versions => out.many(
                &novel
                    .versions()
                    .iter()
                    .enumerate()
                    .map(|(i, v)| render::summarize_version(i + 1, v))
                    .collect::<Vec<_>>(),
            )?,
            ListTarget::Drafts => out.many(
                &novel
                    .drafts()
                    .iter()
                    .enumerate()
                    .map(|(i, d)| render::summarize_draft(i + 1, d))
                    .collect::<Vec<_>>(),
            )?,
            ListTarget::Outline => print!("{}", render_outline(&outline(novel, word_counts))),
        },

        Commands::Show { what } => match what {
            ShowTarget::Novel => out.one(&render::summarize_novel(novel))?,
            ShowTarget::Plotline { tag } => {
                let plotline = novel
                    .find_plotline(&tag)
                    .ok_or_else(|| NovelError::not_found(EntityKind::Plotline, &tag))?;
                out.one(&render::summarize_plotline(novel, plotline))?
            }
            ShowTarget::Part { tag } => {
                let part = novel
                    .find_part(&tag)
                    .ok_or_else(|| NovelError::not_found(EntityKind::Part, &tag))?;
                out.one(&render::summarize_part(novel, part))?
            }
            ShowTarget::Chapter { tag } => {
                let chapter = novel
                    .find_chapter(&tag)
                    .ok_or_else(|| NovelError::not_found(EntityKind::Chapter, &tag))?;
                out.one(&render::summarize_chapter(novel, chapter, true))?
            }
            ShowTarget::Version { tag } => {
                let version = novel
                    .find_version(&tag)
                    .ok_or_else(|| NovelError::not_found(EntityKind::Version, &tag))?;
                let number = tag.parse().context("version tags are numbers")?;
                out.one(&render::summarize_version(number, version))?
            }
            ShowTarget::Draft { tag } => {
                let draft = novel
                    .find_draft(&tag)
                    .ok_or_else(|| NovelError::not_found(EntityKind::Draft, &tag))?;
                let number = tag.parse().context("draft tags are numbers")?;
                out.one(&render::summarize_draft(number, draft))?
            }
        },

        Commands::Add { what } => match what {
            AddTarget::Plotline { tag, comment } => {
                let plotline = novel.add_plotline(&tag, comment)?.clone();
                out.one(&render::summarize_plotline(novel, &plotline))?
            }
            AddTarget::Part {
                title,
                before,
                after,
                parent,
            } => {
                let placement = Placement::from_flags(before, after, parent)?;
                let part = novel.add_part(AddPartInput { title, placement })?.clone();
                out.one(&render::summarize_part(novel, &part))?
            }
            AddTarget::Chapter {
                plotline,
                title,
                part,
                before,
                after,
            } => {
                let input = AddChapterInput {
                    plotline_tag: plotline,
                    title,
                    part_tag: part,
                    position: ChapterPosition::from_flags(before, after)?,
                };
                let chapter = novel.add_chapter(input)?.clone();
                out.one(&render::summarize_chapter(novel, &chapter, false))?
            }
        },

        Commands::Update { what } => match what {
            UpdateTarget::Plotline {
                tag,
                new_tag,
                comment,
            } => {
                let input = UpdatePlotlineInput {
                    tag: new_tag,
                    comment,
                };
                let plotline = novel.update_plotline(&tag, input)?.clone();
                out.one(&render::summarize_plotline(novel, &plotline))?
            }
            UpdateTarget::Part {
                tag,
                title,
                before,
                after,
                parent,
            } => {
                let placement = Placement::from_flags(before, after, parent)?;
                let part = novel
                    .update_part(&tag, UpdatePartInput { title, placement })?
                    .clone();
                out.one(&render::summarize_part(novel, &part))?
            }
            UpdateTarget::Chapter {
                tag,
                title,
                plotline,
                part,
                before,
                after,
            } => {
                let input = UpdateChapterInput {
                    title,
                    plotline_tag: plotline,
                    part_tag: part,
                    position: ChapterPosition::from_flags(before, after)?,
                };
                let chapter = novel.update_chapter(&tag, input)?.clone();
                out.one(&render::summarize_chapter(novel, &chapter, false))?
            }
        },

        Commands::Delete { kind, tag, force } => {
            let force = force || !config.get_bool("delete.confirm")?;
            let mut confirm = StdinConfirm;
            let deleted = match kind {
                DeleteKind::Plotline => novel.delete_plotline(&tag, force, &mut confirm)?,
                DeleteKind::Part => novel.delete_part(&tag, force, &mut confirm)?,
                DeleteKind::Chapter => novel.delete_chapter(&tag, force, &mut confirm)?,
                DeleteKind::Version => novel.delete_version(&tag, force, &mut confirm)?,
                DeleteKind::Draft => novel.delete_draft(&tag, force, &mut confirm)?,
            };
            if !deleted {
                eprintln!("Nothing deleted");
            }
        }

        Commands::Edit { tag } => {
            let chapter = novel
                .find_chapter(&tag)
                .ok_or_else(|| NovelError::not_found(EntityKind::Chapter, &tag))?;
            let path = novel.env().resolve(&chapter.path);
            open_in_editor(config.get_str("editor")?, &path)?;
        }

        Commands::Bind { comment, stage } => {
            let vcs = GitVcs::new(config.get_str("vcs.program")?, novel.env().root.clone());
            let bound = Binder::new(novel, &*config, &vcs).bind(comment, stage)?;
            if out.json {
                println!("{}", serde_json::to_string_pretty(&bound)?);
            } else {
                let summary = match &bound {
                    Bound::Version { number, version } => {
                        render::summarize_version(*number, version)
                    }
                    Bound::Draft { number, draft } => render::summarize_draft(*number, draft),
                };
                println!("{}", summary);
            }
        }

        Commands::Config { key, value } => run_config(out, config, config_path, key, value)?,
    }
    Ok(())
}

#[derive(Serialize)]
struct ConfigLine {
    key: &'static str,
    value: String,
    kind: ValueType,
    doc: &'static str,
}

impl std::fmt::Display for ConfigLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

fn run_config(
    out: &Output,
    config: &mut Config,
    path: Option<PathBuf>,
    key: Option<String>,
    value: Option<String>,
) -> anyhow::Result<()> {
    let line = |entry: &ConfigEntry| ConfigLine {
        key: entry.schema.key,
        value: entry.value().to_string(),
        kind: entry.schema.kind,
        doc: entry.schema.doc,
    };

    match (key, value) {
        (None, _) => out.many(&config.entries().iter().map(line).collect::<Vec<_>>()),
        (Some(key), None) => out.one(&line(config.entry(&key)?)),
        (Some(key), Some(value)) => {
            let path = path.context("no config file location: set `config` in .novel/novel")?;
            config.set(&key, &value)?;
            config.save(&path)?;
            tracing::info!("Set {}={} in {}", key, value, path.display());
            out.one(&line(config.entry(&key)?))
        }
    }
}
