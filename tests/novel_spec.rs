mod common;

use std::fs;

use makenovel::models::*;
use makenovel::prompt::FixedAnswer;
use makenovel::NovelError;
use speculate2::speculate;

fn part_input(title: Option<&str>, placement: Placement) -> AddPartInput {
    AddPartInput {
        title: title.map(str::to_string),
        placement,
    }
}

fn chapter_input(plotline: &str, title: Option<&str>, part: Option<&str>) -> AddChapterInput {
    AddChapterInput {
        plotline_tag: plotline.to_string(),
        title: title.map(str::to_string),
        part_tag: part.map(str::to_string),
        position: ChapterPosition::Unchanged,
    }
}

fn part_tags(novel: &makenovel::Novel) -> Vec<String> {
    novel
        .parts_preorder()
        .into_iter()
        .map(|p| novel.part_tag(p))
        .collect()
}

fn chapter_tags(novel: &makenovel::Novel) -> Vec<String> {
    novel.chapters().iter().map(Chapter::tag).collect()
}

speculate! {
    before {
        let dir = common::scaffold("The Long Road", Some("Jo Writer"));
        let (mut novel, _config) = common::open(dir.path());
    }

    describe "parts" {
        describe "add_part" {
            it "numbers top-level parts by position" {
                novel.add_part(part_input(Some("Part One"), Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(None, Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(Some("Three!"), Placement::Unchanged)).expect("Failed to add");

                assert_eq!(part_tags(&novel), vec!["1__part_one", "2", "3__three"]);
            }

            it "renumbers siblings when inserting before an anchor" {
                novel.add_part(part_input(Some("A"), Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(Some("B"), Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(Some("C"), Placement::Before("1__a".into()))).expect("Failed to add");

                assert_eq!(part_tags(&novel), vec!["1__c", "2__a", "3__b"]);
            }

            it "inserts after an anchor" {
                novel.add_part(part_input(Some("A"), Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(Some("B"), Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(Some("C"), Placement::After("1__a".into()))).expect("Failed to add");

                assert_eq!(part_tags(&novel), vec!["1__a", "2__c", "3__b"]);
            }

            it "nests a part under a parent with a qualified tag" {
                novel.add_part(part_input(Some("Book"), Placement::Unchanged)).expect("Failed to add");
                let act = novel
                    .add_part(part_input(Some("Act"), Placement::Under("1__book".into())))
                    .expect("Failed to add")
                    .clone();

                assert_eq!(novel.part_tag(&act), "1__book.1__act");
                assert_eq!(novel.part_number(&act), 1);
                assert_eq!(novel.part_depth(&act), 1);
                assert_eq!(novel.children(None).len(), 1);
            }

            it "fails for an unknown anchor" {
                let result = novel.add_part(part_input(None, Placement::After("7".into())));
                assert!(matches!(result, Err(NovelError::NotFound { kind: EntityKind::Part, .. })));
            }

            it "rejects more than one placement flag" {
                let result = Placement::from_flags(Some("1".into()), None, Some("2".into()));
                assert!(matches!(result, Err(NovelError::ConflictingPlacement)));
            }

            it "adds nothing when before and parent are both given" {
                novel.add_part(part_input(Some("A"), Placement::Unchanged)).expect("Failed to add");

                let result = Placement::from_flags(Some("1__a".into()), None, Some("1__a".into()))
                    .and_then(|placement| novel.add_part(part_input(Some("B"), placement)).map(|_| ()));

                assert!(matches!(result, Err(NovelError::ConflictingPlacement)));
                assert_eq!(part_tags(&novel), vec!["1__a"]);
            }
        }

        describe "update_part" {
            it "retitles a part and keeps its chapters" {
                novel.add_part(part_input(None, Placement::Unchanged)).expect("Failed to add");
                novel.add_plotline("main", None).expect("Failed to add plotline");
                novel.add_chapter(chapter_input("main", Some("Opening"), Some("1"))).expect("Failed to add chapter");

                let part = novel
                    .update_part("1", UpdatePartInput { title: Some("Part One".into()), ..Default::default() })
                    .expect("Failed to update")
                    .clone();

                assert_eq!(novel.part_tag(&part), "1__part_one");
                let chapters = novel.part_chapters(part.id);
                assert_eq!(chapters.len(), 1);
                assert_eq!(chapters[0].tag(), "1__opening");
            }

            it "clears a title with an empty string" {
                novel.add_part(part_input(Some("Named"), Placement::Unchanged)).expect("Failed to add");
                novel
                    .update_part("1__named", UpdatePartInput { title: Some(String::new()), ..Default::default() })
                    .expect("Failed to update");

                assert_eq!(part_tags(&novel), vec!["1"]);
            }

            it "moves a part under another and renumbers both levels" {
                novel.add_part(part_input(Some("A"), Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(Some("B"), Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(Some("C"), Placement::Unchanged)).expect("Failed to add");

                novel
                    .update_part("3__c", UpdatePartInput { placement: Placement::Under("1__a".into()), ..Default::default() })
                    .expect("Failed to move");

                assert_eq!(part_tags(&novel), vec!["1__a", "1__a.1__c", "2__b"]);
            }

            it "rejects moving a part under its own descendant" {
                novel.add_part(part_input(Some("A"), Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(Some("B"), Placement::Under("1__a".into()))).expect("Failed to add");

                let result = novel.update_part(
                    "1__a",
                    UpdatePartInput { placement: Placement::Under("1__a.1__b".into()), ..Default::default() },
                );
                assert!(matches!(result, Err(NovelError::CyclicParent { .. })));
                assert_eq!(part_tags(&novel), vec!["1__a", "1__a.1__b"]);
            }

            it "rejects placing a part beside its own descendant" {
                novel.add_part(part_input(Some("A"), Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(Some("B"), Placement::Under("1__a".into()))).expect("Failed to add");
                novel.add_part(part_input(Some("C"), Placement::Under("1__a".into()))).expect("Failed to add");
                novel.add_part(part_input(Some("D"), Placement::Under("1__a.1__b".into()))).expect("Failed to add");

                let before = novel.update_part(
                    "1__a",
                    UpdatePartInput { placement: Placement::Before("1__a.2__c".into()), ..Default::default() },
                ).map(|_| ());
                let after = novel.update_part(
                    "1__a",
                    UpdatePartInput { placement: Placement::After("1__a.1__b.1__d".into()), ..Default::default() },
                ).map(|_| ());

                assert!(matches!(before, Err(NovelError::CyclicParent { .. })));
                assert!(matches!(after, Err(NovelError::CyclicParent { .. })));
                assert_eq!(part_tags(&novel), vec!["1__a", "1__a.1__b", "1__a.1__b.1__d", "1__a.2__c"]);
            }

            it "moves a part beside a part at another level" {
                novel.add_part(part_input(Some("A"), Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(Some("B"), Placement::Under("1__a".into()))).expect("Failed to add");
                novel.add_part(part_input(Some("C"), Placement::Unchanged)).expect("Failed to add");

                novel
                    .update_part("2__c", UpdatePartInput { placement: Placement::After("1__a.1__b".into()), ..Default::default() })
                    .expect("Failed to move");

                assert_eq!(part_tags(&novel), vec!["1__a", "1__a.1__b", "1__a.2__c"]);
            }

            it "keeps every part reachable from its parent" {
                novel.add_part(part_input(Some("A"), Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(Some("B"), Placement::Under("1__a".into()))).expect("Failed to add");
                novel.add_part(part_input(Some("C"), Placement::Under("1__a".into()))).expect("Failed to add");
                novel.add_part(part_input(Some("D"), Placement::Unchanged)).expect("Failed to add");
                novel
                    .update_part("1__a.2__c", UpdatePartInput { placement: Placement::Before("2__d".into()), ..Default::default() })
                    .expect("Failed to move");
                novel
                    .update_part("3__d", UpdatePartInput { placement: Placement::Under("2__c".into()), ..Default::default() })
                    .expect("Failed to move");

                let parts = novel.parts_preorder();
                assert_eq!(parts.len(), 4);
                for part in &parts {
                    if let Some(parent_id) = part.parent_id {
                        assert!(novel.part(parent_id).is_some());
                        assert!(novel.children(Some(parent_id)).iter().any(|c| c.id == part.id));
                    }
                    for child in novel.children(Some(part.id)) {
                        assert_eq!(child.parent_id, Some(part.id));
                    }
                }
                assert_eq!(part_tags(&novel), vec!["1__a", "1__a.1__b", "2__c", "2__c.1__d"]);
            }
        }

        describe "delete_part" {
            it "promotes children and orphans chapters" {
                novel.add_part(part_input(Some("A"), Placement::Unchanged)).expect("Failed to add");
                novel.add_part(part_input(Some("B"), Placement::Under("1__a".into()))).expect("Failed to add");
                novel.add_part(part_input(Some("Z"), Placement::Unchanged)).expect("Failed to add");
                novel.add_plotline("main", None).expect("Failed to add plotline");
                novel.add_chapter(chapter_input("main", None, Some("1__a"))).expect("Failed to add chapter");

                let deleted = novel
                    .delete_part("1__a", true, &mut FixedAnswer::new(false))
                    .expect("Failed to delete");

                assert!(deleted);
                assert_eq!(part_tags(&novel), vec!["1__b", "2__z"]);
                assert_eq!(novel.orphan_chapters().len(), 1);
            }

            it "keeps the part when the deletion is declined" {
                novel.add_part(part_input(Some("A"), Placement::Unchanged)).expect("Failed to add");
                let mut confirm = FixedAnswer::new(false);

                let deleted = novel.delete_part("1__a", false, &mut confirm).expect("Failed to delete");

                assert!(!deleted);
                assert_eq!(confirm.asked.len(), 1);
                assert_eq!(part_tags(&novel), vec!["1__a"]);
            }
        }
    }

    describe "chapters" {
        describe "add_chapter" {
            it "creates the chapter and its file inside a part" {
                novel.add_part(part_input(None, Placement::Unchanged)).expect("Failed to add");
                novel.add_plotline("main", None).expect("Failed to add plotline");

                let chapter = novel
                    .add_chapter(chapter_input("main", Some("First Test Chapter"), Some("1")))
                    .expect("Failed to add chapter")
                    .clone();

                assert_eq!(chapter.tag(), "1__first_test_chapter");
                assert_eq!(chapter.path, std::path::Path::new("main").join("1__first_test_chapter.md"));
                assert!(dir.path().join("main").join("1__first_test_chapter.md").is_file());

                let part = novel.find_part("1").expect("Part missing");
                assert_eq!(novel.part_chapters(part.id)[0].id, chapter.id);
            }

            it "fails for an unknown plotline" {
                let result = novel.add_chapter(chapter_input("nowhere", None, None));
                assert!(matches!(result, Err(NovelError::NotFound { kind: EntityKind::Plotline, .. })));
                assert!(novel.chapters().is_empty());
            }

            it "never reuses the number of a deleted chapter" {
                novel.add_plotline("main", None).expect("Failed to add plotline");
                novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");
                novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");
                novel.delete_chapter("1", true, &mut FixedAnswer::new(true)).expect("Failed to delete");
                novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");

                assert_eq!(chapter_tags(&novel), vec!["2", "3"]);
            }

            it "places a chapter before an anchor" {
                novel.add_plotline("main", None).expect("Failed to add plotline");
                novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");
                novel
                    .add_chapter(AddChapterInput {
                        position: ChapterPosition::Before("1".into()),
                        ..chapter_input("main", Some("Prologue"), None)
                    })
                    .expect("Failed to add");

                assert_eq!(chapter_tags(&novel), vec!["2__prologue", "1"]);
            }

            it "refuses a new number once the highest is taken" {
                fs::write(common::data_file(dir.path(), "plotlines.csv"), "main,\n").expect("Failed to write");
                fs::write(common::data_file(dir.path(), "chapters.csv"), "main/4294967295.md,main,,\n")
                    .expect("Failed to write");
                let (mut novel, _) = common::open(dir.path());

                let result = novel.add_chapter(chapter_input("main", None, None));

                assert!(matches!(result, Err(NovelError::ChapterNumbersExhausted(u32::MAX))));
                assert_eq!(novel.chapters().len(), 1);
            }
        }

        describe "update_chapter" {
            it "moves the file with its contents when the title changes" {
                novel.add_plotline("main", None).expect("Failed to add plotline");
                novel.add_chapter(chapter_input("main", Some("Draft"), None)).expect("Failed to add");
                fs::write(dir.path().join("main/1__draft.md"), "Call me Ishmael.").expect("Failed to write");

                let chapter = novel
                    .update_chapter("1__draft", UpdateChapterInput { title: Some("Loomings".into()), ..Default::default() })
                    .expect("Failed to update")
                    .clone();

                assert_eq!(chapter.tag(), "1__loomings");
                assert!(!dir.path().join("main/1__draft.md").exists());
                assert_eq!(
                    fs::read_to_string(dir.path().join("main/1__loomings.md")).expect("Failed to read"),
                    "Call me Ishmael."
                );
            }

            it "moves the file into another plotline directory" {
                novel.add_plotline("main", None).expect("Failed to add plotline");
                novel.add_plotline("side", None).expect("Failed to add plotline");
                novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");
                fs::write(dir.path().join("main/1.md"), "words").expect("Failed to write");

                novel
                    .update_chapter("1", UpdateChapterInput { plotline_tag: Some("side".into()), ..Default::default() })
                    .expect("Failed to update");

                assert_eq!(fs::read_to_string(dir.path().join("side/1.md")).expect("Failed to read"), "words");
            }

            it "takes a chapter out of its part with an empty part tag" {
                novel.add_part(part_input(None, Placement::Unchanged)).expect("Failed to add");
                novel.add_plotline("main", None).expect("Failed to add plotline");
                novel.add_chapter(chapter_input("main", None, Some("1"))).expect("Failed to add");

                let chapter = novel
                    .update_chapter("1", UpdateChapterInput { part_tag: Some(String::new()), ..Default::default() })
                    .expect("Failed to update")
                    .clone();

                assert!(chapter.part_id.is_none());
                assert_eq!(novel.orphan_chapters().len(), 1);
            }

            it "reorders chapters before and after an anchor" {
                novel.add_plotline("main", None).expect("Failed to add plotline");
                for _ in 0..3 {
                    novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");
                }

                novel
                    .update_chapter("3", UpdateChapterInput { position: ChapterPosition::Before("1".into()), ..Default::default() })
                    .expect("Failed to move");
                assert_eq!(chapter_tags(&novel), vec!["3", "1", "2"]);

                novel
                    .update_chapter("1", UpdateChapterInput { position: ChapterPosition::After("2".into()), ..Default::default() })
                    .expect("Failed to move");
                assert_eq!(chapter_tags(&novel), vec!["3", "2", "1"]);
                assert!(dir.path().join("main/1.md").is_file());
            }

            it "fails for an unknown anchor and keeps the order" {
                novel.add_plotline("main", None).expect("Failed to add plotline");
                novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");
                novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");

                let result = novel.update_chapter(
                    "2",
                    UpdateChapterInput { position: ChapterPosition::After("9".into()), ..Default::default() },
                );

                assert!(matches!(result, Err(NovelError::NotFound { kind: EntityKind::Chapter, .. })));
                assert_eq!(chapter_tags(&novel), vec!["1", "2"]);
            }
        }

        describe "delete_chapter" {
            it "keeps chapter and file when the deletion is declined" {
                novel.add_plotline("main", None).expect("Failed to add plotline");
                novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");
                let mut confirm = FixedAnswer::new(false);

                let deleted = novel.delete_chapter("1", false, &mut confirm).expect("Failed to delete");

                assert!(!deleted);
                assert_eq!(confirm.asked, vec!["Delete chapter 1?".to_string()]);
                assert!(novel.find_chapter("1").is_some());
                assert!(dir.path().join("main/1.md").exists());
            }

            it "removes chapter and file when confirmed" {
                novel.add_plotline("main", None).expect("Failed to add plotline");
                novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");

                let deleted = novel
                    .delete_chapter("1", false, &mut FixedAnswer::new(true))
                    .expect("Failed to delete");

                assert!(deleted);
                assert!(novel.chapters().is_empty());
                assert!(!dir.path().join("main/1.md").exists());
            }
        }

        describe "word_count" {
            it "counts whitespace-delimited words" {
                novel.add_plotline("main", None).expect("Failed to add plotline");
                novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");
                fs::write(dir.path().join("main/1.md"), "one two\n  three\n").expect("Failed to write");

                assert_eq!(novel.word_count(), 3);
            }

            it "counts a missing file as zero" {
                novel.add_plotline("main", None).expect("Failed to add plotline");
                novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");
                fs::remove_file(dir.path().join("main/1.md")).expect("Failed to remove");

                assert_eq!(novel.word_count(), 0);
            }
        }
    }

    describe "plotlines" {
        it "rejects a duplicate tag" {
            novel.add_plotline("main", None).expect("Failed to add plotline");
            let result = novel.add_plotline("main", Some("again".into()));
            assert!(matches!(result, Err(NovelError::DuplicateTag { .. })));
        }

        it "rejects a tag with a path separator" {
            let result = novel.add_plotline("a/b", None);
            assert!(matches!(result, Err(NovelError::InvalidTag { .. })));
        }

        it "rejects the data and bind directories as tags" {
            for tag in [".novel", "versions"] {
                let result = novel.add_plotline(tag, None);
                assert!(matches!(result, Err(NovelError::InvalidTag { .. })), "{} was accepted", tag);
            }

            novel.add_plotline("main", None).expect("Failed to add plotline");
            let result = novel.update_plotline("main", UpdatePlotlineInput { tag: Some("versions".into()), comment: None });
            assert!(matches!(result, Err(NovelError::InvalidTag { .. })));
            assert!(novel.find_plotline("main").is_some());
        }

        it "moves chapter files when renamed" {
            novel.add_plotline("main", None).expect("Failed to add plotline");
            novel.add_chapter(chapter_input("main", Some("Start"), None)).expect("Failed to add");
            fs::write(dir.path().join("main/1__start.md"), "text").expect("Failed to write");

            novel
                .update_plotline("main", UpdatePlotlineInput { tag: Some("hero".into()), comment: Some("The hero's road".into()) })
                .expect("Failed to rename");

            let plotline = novel.find_plotline("hero").expect("Plotline missing");
            assert_eq!(plotline.comment.as_deref(), Some("The hero's road"));
            assert_eq!(novel.chapters()[0].path, std::path::Path::new("hero").join("1__start.md"));
            assert_eq!(fs::read_to_string(dir.path().join("hero/1__start.md")).expect("Failed to read"), "text");
            assert!(!dir.path().join("main").exists());
        }

        it "keeps the old tag and files when a rename fails" {
            novel.add_plotline("main", None).expect("Failed to add plotline");
            novel.add_chapter(chapter_input("main", Some("Start"), None)).expect("Failed to add");
            novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");
            fs::write(dir.path().join("main/1__start.md"), "text").expect("Failed to write");
            fs::write(dir.path().join("hero"), "not a directory").expect("Failed to write");

            let result = novel.update_plotline("main", UpdatePlotlineInput { tag: Some("hero".into()), comment: Some("lost".into()) });

            assert!(matches!(result, Err(NovelError::Io(_))));
            let plotline = novel.find_plotline("main").expect("Plotline missing");
            assert!(plotline.comment.is_none());
            assert!(novel.find_plotline("hero").is_none());
            assert_eq!(novel.chapters()[0].path, std::path::Path::new("main").join("1__start.md"));
            assert_eq!(novel.chapters()[1].path, std::path::Path::new("main").join("2.md"));
            assert_eq!(fs::read_to_string(dir.path().join("main/1__start.md")).expect("Failed to read"), "text");
            assert!(dir.path().join("main/2.md").is_file());
        }

        it "leaves chapters and files in place when deleted" {
            novel.add_plotline("main", None).expect("Failed to add plotline");
            novel.add_chapter(chapter_input("main", None, None)).expect("Failed to add");

            let deleted = novel
                .delete_plotline("main", true, &mut FixedAnswer::new(false))
                .expect("Failed to delete");

            assert!(deleted);
            assert!(novel.plotlines().is_empty());
            assert!(novel.chapters()[0].plotline_id.is_none());
            assert!(dir.path().join("main/1.md").exists());
        }
    }
}
