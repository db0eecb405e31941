use std::fs;
use std::path::Path;

use makenovel::config::{ConfigValue, ValueType, REFERENCE};
use makenovel::{Config, NovelError};
use speculate2::speculate;

speculate! {
    before {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("makenovel.cfg");
    }

    describe "load" {
        it "uses the reference defaults without a user file" {
            let config = Config::load(None).expect("Failed to load");

            assert_eq!(config.get_str("chapter.extension").expect("Missing key"), "md");
            assert_eq!(config.get_path("bind.directory").expect("Missing key"), Path::new("versions"));
            assert!(config.get_bool("delete.confirm").expect("Missing key"));
            assert!(!config.report().changed());
        }

        it "creates a missing file with every reference key" {
            let config = Config::load(Some(&path)).expect("Failed to load");

            assert_eq!(config.report().added.len(), REFERENCE.len());
            assert!(config.report().backup.is_none());
            let written = fs::read_to_string(&path).expect("Failed to read");
            for key in REFERENCE {
                assert!(written.contains(&format!("{}={}", key.key, key.default)), "{} missing", key.key);
            }
        }

        it "merges a user file and keeps a backup" {
            let original = "editor=nano\nbogus.key=1\ndelete.confirm=maybe\n";
            fs::write(&path, original).expect("Failed to write");

            let config = Config::load(Some(&path)).expect("Failed to load");

            let report = config.report();
            assert_eq!(report.dropped, vec!["bogus.key".to_string()]);
            assert_eq!(report.reset, vec!["delete.confirm".to_string()]);
            assert_eq!(report.added.len(), REFERENCE.len() - 2);
            assert_eq!(report.backup.as_deref(), Some(dir.path().join("makenovel.cfg.1.old").as_path()));

            assert_eq!(config.get_str("editor").expect("Missing key"), "nano");
            assert!(config.get_bool("delete.confirm").expect("Missing key"));

            let backup = fs::read_to_string(dir.path().join("makenovel.cfg.1.old")).expect("Failed to read");
            assert_eq!(backup, original);
            let merged = fs::read_to_string(&path).expect("Failed to read");
            assert!(merged.contains("editor=nano"));
            assert!(!merged.contains("bogus.key"));
        }

        it "leaves a complete file alone" {
            Config::load(Some(&path)).expect("Failed to load");
            let first = fs::read_to_string(&path).expect("Failed to read");

            let config = Config::load(Some(&path)).expect("Failed to load");

            assert!(!config.report().changed());
            assert_eq!(fs::read_to_string(&path).expect("Failed to read"), first);
            assert!(!dir.path().join("makenovel.cfg.1.old").exists());
        }

        it "numbers backups past existing ones" {
            fs::write(dir.path().join("makenovel.cfg.1.old"), "").expect("Failed to write");
            fs::write(&path, "unknown=1\n").expect("Failed to write");

            let config = Config::load(Some(&path)).expect("Failed to load");

            assert_eq!(config.report().backup.as_deref(), Some(dir.path().join("makenovel.cfg.2.old").as_path()));
        }
    }

    describe "get" {
        it "fails for a key outside the schema" {
            let config = Config::default();
            assert!(matches!(config.get("no.such.key"), Err(NovelError::UnknownKey(_))));
        }

        it "fails for an accessor of the wrong type" {
            let config = Config::default();
            assert!(matches!(
                config.get_bool("editor"),
                Err(NovelError::InvalidValue { expected: ValueType::Bool, .. })
            ));
        }
    }

    describe "set" {
        it "coerces and persists a value" {
            let mut config = Config::load(Some(&path)).expect("Failed to load");
            config.set("list.word_counts", "off").expect("Failed to set");
            config.save(&path).expect("Failed to save");

            let reloaded = Config::load(Some(&path)).expect("Failed to load");
            assert_eq!(reloaded.get("list.word_counts").expect("Missing key"), &ConfigValue::Bool(false));
        }

        it "rejects a value of the wrong type" {
            let mut config = Config::default();
            let result = config.set("delete.confirm", "perhaps");
            assert!(matches!(result, Err(NovelError::InvalidValue { .. })));
            assert!(config.get_bool("delete.confirm").expect("Missing key"));
        }

        it "rejects an unknown key" {
            let mut config = Config::default();
            assert!(matches!(config.set("colour", "blue"), Err(NovelError::UnknownKey(_))));
        }
    }
}
