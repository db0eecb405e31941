#![allow(dead_code)]

use std::fs;
use std::path::Path;

use makenovel::env::DATA_DIR;
use makenovel::{Config, Novel, NovelEnvironment};
use tempfile::TempDir;

/// A fresh project directory with a `.novel/novel` settings file and a project-local
/// config file.
pub fn scaffold(title: &str, author: Option<&str>) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::create_dir_all(dir.path().join(DATA_DIR)).expect("Failed to create data dir");

    let mut settings = format!("title={}\nconfig=makenovel.cfg\n", title);
    if let Some(author) = author {
        settings.push_str(&format!("author={}\n", author));
    }
    fs::write(dir.path().join(DATA_DIR).join("novel"), settings)
        .expect("Failed to write settings");
    dir
}

pub fn open(root: &Path) -> (Novel, Config) {
    let env = NovelEnvironment::load(root).expect("Failed to load environment");
    let config = Config::load(env.config_path().as_deref()).expect("Failed to load config");
    let novel = Novel::load(env, &config).expect("Failed to load novel");
    (novel, config)
}

pub fn data_file(root: &Path, name: &str) -> std::path::PathBuf {
    root.join(DATA_DIR).join(name)
}
