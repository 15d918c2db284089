//! End-to-end checks: save a file, run the scripted toolchain, inspect what
//! reached the sink.

use std::path::Path;

use savecheck_config::Settings;
use savecheck_engine::{CheckError, CheckOutcome, Checker, STATUS_RUNNING};
use savecheck_types::{FileId, Level, Point, Region, Scope};

use crate::common::{
    OpenFiles, RecordingSink, ScriptedToolchain, SinkEvent, diagnostic, metadata, span,
};

fn lib_and_bin() -> serde_json::Value {
    metadata(&[
        ("lib", "p", "/p/src/lib.rs"),
        ("bin", "p", "/p/src/main.rs"),
    ])
}

fn checker(
    settings: Settings,
    toolchain: ScriptedToolchain,
    open: &[&str],
) -> Checker<ScriptedToolchain, OpenFiles, RecordingSink> {
    Checker::new(settings, toolchain, OpenFiles::new(open), RecordingSink::default())
}

#[tokio::test]
async fn save_annotates_error_with_label_and_note() {
    let toolchain = ScriptedToolchain::new()
        .with_metadata(lib_and_bin())
        .with_check(
            "--lib",
            vec![diagnostic(
                "error",
                "mismatched types",
                vec![span("src/lib.rs", 4, true, Some("expected `u32`, found `&str`"))],
                vec![diagnostic("note", "expected due to this", vec![], vec![])],
            )],
        );
    let checker = checker(Settings::default(), toolchain, &["/p/src/lib.rs"]);

    let outcome = checker.on_save(Path::new("/p/src/lib.rs")).await.unwrap();
    assert_eq!(
        outcome,
        CheckOutcome::Checked {
            invocations_run: 1,
            files: 1,
            found_for_triggering_file: true,
            malformed: 0,
        }
    );

    let lib = FileId::new("/p/src/lib.rs");
    assert_eq!(
        checker.sink().events,
        vec![
            SinkEvent::Status(STATUS_RUNNING.to_string()),
            SinkEvent::Clear,
            SinkEvent::Show(lib.clone()),
            SinkEvent::EraseStatus,
        ]
    );

    let sink = checker.sink();
    let group = &sink.drawn[&lib];
    let region = Region::new(Point::new(3, 4), Point::new(3, 8));
    assert_eq!(group.highlights(Scope::Error), &[region, region]);
    assert_eq!(group.highlights(Scope::Info), &[region]);

    let annotations = group.annotations();
    assert_eq!(annotations.len(), 3);
    assert!(!annotations[0].is_primary);
    assert!(annotations[1].is_primary);
    assert_eq!(annotations[1].message_html, "mismatched&nbsp;types");
    assert_eq!(annotations[2].level, Level::Note);
    assert_eq!(annotations[2].region, region);

    assert_eq!(checker.toolchain().checked_targets(), vec!["--lib"]);
    let calls = checker.toolchain().calls();
    assert!(calls.iter().all(|(dir, _)| dir == Path::new("/p/src")));
    assert_eq!(
        calls.last().unwrap().1,
        vec!["check", "--lib", "--message-format=json", "--profile", "test"]
    );
}

#[tokio::test]
async fn hide_warnings_drops_top_level_warnings_only() {
    let toolchain = ScriptedToolchain::new()
        .with_metadata(lib_and_bin())
        .with_check(
            "--lib",
            vec![
                diagnostic(
                    "warning",
                    "unused variable: `x`",
                    vec![span("src/lib.rs", 2, true, None)],
                    vec![],
                ),
                diagnostic(
                    "error",
                    "cannot find value `y` in this scope",
                    vec![span("src/lib.rs", 9, true, None)],
                    vec![diagnostic("help", "a local variable with a similar name exists", vec![], vec![])],
                ),
            ],
        );
    let settings = Settings {
        hide_warnings: true,
        ..Settings::default()
    };
    let checker = checker(settings, toolchain, &["/p/src/lib.rs"]);
    checker.on_save(Path::new("/p/src/lib.rs")).await.unwrap();

    let sink = checker.sink();
    let group = &sink.drawn[&FileId::new("/p/src/lib.rs")];
    let levels: Vec<Level> = group.annotations().iter().map(|a| a.level).collect();
    assert_eq!(levels, vec![Level::Error, Level::Help]);
    assert!(group.annotations().iter().all(|a| a.region.start.row == 8));
}

#[tokio::test]
async fn session_message_lands_at_end_of_target_file() {
    let toolchain = ScriptedToolchain::new()
        .with_metadata(metadata(&[("bin", "p", "/p/src/main.rs")]))
        .with_check(
            "--bin p",
            vec![
                diagnostic("error", "`main` function not found in crate `p`", vec![], vec![]),
                diagnostic("error", "aborting due to 1 previous error", vec![], vec![]),
            ],
        );
    let checker = checker(Settings::default(), toolchain, &["/p/src/main.rs"]);
    checker.on_save(Path::new("/p/src/main.rs")).await.unwrap();

    let sink = checker.sink();
    let group = &sink.drawn[&FileId::new("/p/src/main.rs")];
    assert_eq!(group.annotations().len(), 1);
    assert_eq!(
        group.annotations()[0].region,
        Region::empty_at(Point::new(30, 0))
    );
}

#[tokio::test]
async fn macro_errors_point_at_invocation() {
    let mut inner = span("<::core::macros::panic macros>", 3, true, Some("in this macro"));
    inner["expansion"] = serde_json::json!({
        "span": span("src/lib.rs", 12, false, None),
        "macro_decl_name": "panic!",
        "def_site_span": null
    });
    let toolchain = ScriptedToolchain::new()
        .with_metadata(lib_and_bin())
        .with_check(
            "--lib",
            vec![diagnostic("error", "format argument must be a string literal", vec![inner], vec![])],
        );
    let checker = checker(Settings::default(), toolchain, &["/p/src/lib.rs"]);
    checker.on_save(Path::new("/p/src/lib.rs")).await.unwrap();

    let sink = checker.sink();
    let group = &sink.drawn[&FileId::new("/p/src/lib.rs")];
    assert_eq!(group.annotations().len(), 1);
    let annotation = &group.annotations()[0];
    assert!(annotation.is_primary);
    assert_eq!(annotation.region.start, Point::new(11, 4));
}

#[tokio::test]
async fn diagnostics_for_closed_files_are_not_drawn() {
    let toolchain = ScriptedToolchain::new()
        .with_metadata(lib_and_bin())
        .with_check(
            "--lib",
            vec![diagnostic(
                "error",
                "unresolved import",
                vec![span("src/net.rs", 1, true, None)],
                vec![],
            )],
        );
    let checker = checker(Settings::default(), toolchain, &["/p/src/lib.rs"]);
    let outcome = checker.on_save(Path::new("/p/src/lib.rs")).await.unwrap();

    assert_eq!(
        outcome,
        CheckOutcome::Checked {
            invocations_run: 1,
            files: 0,
            found_for_triggering_file: false,
            malformed: 0,
        }
    );
    assert!(checker.sink().drawn.is_empty());
}

#[tokio::test]
async fn malformed_span_is_counted_and_skipped() {
    let toolchain = ScriptedToolchain::new()
        .with_metadata(lib_and_bin())
        .with_check(
            "--lib",
            vec![diagnostic(
                "error",
                "odd diagnostic",
                vec![span("src/lib.rs", 1, false, None), span("src/lib.rs", 2, true, None)],
                vec![],
            )],
        );
    let checker = checker(Settings::default(), toolchain, &["/p/src/lib.rs"]);
    let outcome = checker.on_save(Path::new("/p/src/lib.rs")).await.unwrap();

    assert!(matches!(outcome, CheckOutcome::Checked { malformed: 1, .. }));
    let sink = checker.sink();
    let group = &sink.drawn[&FileId::new("/p/src/lib.rs")];
    assert_eq!(group.annotations().len(), 1);
}

#[tokio::test]
async fn resave_clears_previous_annotations() {
    let toolchain = ScriptedToolchain::new()
        .with_metadata(lib_and_bin())
        .with_check(
            "--lib",
            vec![diagnostic(
                "error",
                "mismatched types",
                vec![span("src/lib.rs", 4, true, None)],
                vec![],
            )],
        );
    let checker = checker(Settings::default(), toolchain, &["/p/src/lib.rs"]);
    checker.on_save(Path::new("/p/src/lib.rs")).await.unwrap();
    assert_eq!(checker.current().len(), 1);

    let outcome = checker.on_save(Path::new("/elsewhere/x.rs")).await.unwrap();
    assert_eq!(outcome, CheckOutcome::NoTargets);
    assert!(checker.current().is_empty());
    assert!(checker.sink().drawn.is_empty());
}

#[tokio::test]
async fn missing_manifest_means_no_targets() {
    let checker = checker(Settings::default(), ScriptedToolchain::new(), &[]);
    let outcome = checker.on_save(Path::new("/p/src/lib.rs")).await.unwrap();

    assert_eq!(outcome, CheckOutcome::NoTargets);
    assert!(checker.toolchain().checked_targets().is_empty());
    assert_eq!(
        checker.sink().events,
        vec![
            SinkEvent::Status(STATUS_RUNNING.to_string()),
            SinkEvent::Clear,
            SinkEvent::EraseStatus,
        ]
    );
}

#[tokio::test]
async fn unknown_target_kind_aborts_run() {
    let toolchain =
        ScriptedToolchain::new().with_metadata(metadata(&[("cdylib-ish", "p", "/p/src/lib.rs")]));
    let checker = checker(Settings::default(), toolchain, &["/p/src/lib.rs"]);

    let err = checker.on_save(Path::new("/p/src/lib.rs")).await.unwrap_err();
    assert!(matches!(err, CheckError::Resolve(_)));
    assert_eq!(
        checker.sink().events.last(),
        Some(&SinkEvent::EraseStatus)
    );
}

#[tokio::test]
async fn dismiss_then_navigate_hide_is_idempotent() {
    let toolchain = ScriptedToolchain::new()
        .with_metadata(lib_and_bin())
        .with_check(
            "--lib",
            vec![diagnostic(
                "error",
                "mismatched types",
                vec![span("src/lib.rs", 4, true, None)],
                vec![],
            )],
        );
    let checker = checker(Settings::default(), toolchain, &["/p/src/lib.rs"]);
    checker.on_save(Path::new("/p/src/lib.rs")).await.unwrap();

    checker.dismiss();
    checker.on_navigate("hide");
    assert!(checker.current().is_empty());
    assert!(checker.sink().drawn.is_empty());
}
