//! Progressive extraction monitor against a scripted archive tool

#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{Fixture, RecordingRemover, deleted_parts, drain, extract_mode};
use rar_reclaim::{
    ArchiveSet, ArchiveTool, Error, Event, ExtractionMonitor, SessionStatus, locate,
};
use serial_test::serial;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const BASE: &str = "show";

struct Run {
    fixture: Fixture,
    remover: Arc<RecordingRemover>,
    events: Vec<Event>,
    session: rar_reclaim::ExtractionSession,
}

async fn run_monitor(parts: u32, extract_body: &str) -> Run {
    let fixture = Fixture::with_parts(BASE, parts, 32);
    let tool = fixture.write_tool("exit 0", extract_body);
    let config = fixture.config(&tool);
    let set = locate(&fixture.part(BASE, 1), &config.extraction).unwrap();

    let remover = Arc::new(RecordingRemover::default());
    let (tx, mut rx) = broadcast::channel(256);
    let monitor = ExtractionMonitor::new(ArchiveTool::new(tool), config.extraction.clone())
        .with_remover(remover.clone())
        .with_events(tx);

    let session = monitor.extract(&set, &fixture.dest_dir).await.unwrap();
    let events = drain(&mut rx);
    Run {
        fixture,
        remover,
        events,
        session,
    }
}

#[tokio::test]
#[serial]
async fn no_markers_deletes_only_the_single_part_after_exit() {
    let run = run_monitor(1, &extract_mode(BASE, &[], 0)).await;

    assert_eq!(run.session.status, SessionStatus::Succeeded);
    assert_eq!(deleted_parts(&run.events), vec![1]);
    assert!(
        !run.events
            .iter()
            .any(|e| matches!(e, Event::PartTransition { .. }))
    );
    assert!(!run.fixture.exists(BASE, 1));
}

#[tokio::test]
#[serial]
async fn repeated_and_backward_markers_delete_each_part_once() {
    let body = "\
echo \"Extracting from $PARTS/show.part1.rar\"
echo \"Extracting from $PARTS/show.part2.rar\"
echo \"Extracting from $PARTS/show.part2.rar\"
echo \"Extracting from $PARTS/show.part1.rar\"
echo \"Extracting from $PARTS/show.part3.rar\"
exit 0";
    let run = run_monitor(3, body).await;

    assert_eq!(run.session.status, SessionStatus::Succeeded);
    assert_eq!(deleted_parts(&run.events), vec![1, 2, 3]);
    assert_eq!(
        run.remover.call_names(),
        vec!["show.part1.rar", "show.part2.rar", "show.part3.rar"]
    );
    let transitions: Vec<(u32, u32)> = run
        .events
        .iter()
        .filter_map(|e| match e {
            Event::PartTransition { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(transitions, vec![(1, 2), (2, 3)]);
}

#[tokio::test]
#[serial]
async fn markers_for_other_archives_are_ignored() {
    // A nested archive inside the payload produces markers with another base name
    let body = "\
echo \"Extracting from $PARTS/show.part1.rar\"
echo \"Extracting from /tmp/nested/extras.part4.rar\"
echo \"Extracting  extras.part7.rar   OK\"
echo \"Extracting from $PARTS/show.part2.rar\"
exit 0";
    let run = run_monitor(2, body).await;

    assert_eq!(deleted_parts(&run.events), vec![1, 2]);
    assert_eq!(run.session.current_part, 2);
}

#[tokio::test]
#[serial]
async fn jump_over_a_part_deletes_only_the_vacated_one_before_exit() {
    let body = "\
echo \"Extracting from $PARTS/show.part1.rar\"
echo \"Extracting from $PARTS/show.part3.rar\"
exit 0";
    let run = run_monitor(3, body).await;

    assert_eq!(run.session.status, SessionStatus::Succeeded);
    assert_eq!(deleted_parts(&run.events), vec![1, 3]);
    assert!(run.fixture.exists(BASE, 2));
    let kept: Vec<u32> = run
        .session
        .remaining_parts()
        .iter()
        .map(|p| p.number)
        .collect();
    assert_eq!(kept, vec![2]);
}

#[tokio::test]
#[serial]
async fn failed_exit_before_any_marker_keeps_everything() {
    let body = "echo \"Extracting from $ARCHIVE\"\necho \"ERROR: cannot open\" >&2\nexit 3";
    let run = run_monitor(2, body).await;

    assert_eq!(run.session.status, SessionStatus::FailedExtraction);
    assert_eq!(run.session.exit_code, Some(3));
    assert!(run.session.diagnostics.contains("cannot open"));
    assert!(run.remover.call_names().is_empty());
    assert!(run.fixture.exists(BASE, 1));
    assert!(run.fixture.exists(BASE, 2));
    assert_eq!(
        run.events.last(),
        Some(&Event::ExtractionFinished {
            status: SessionStatus::FailedExtraction,
            exit_code: Some(3)
        })
    );
}

#[tokio::test]
#[serial]
async fn tool_runs_in_the_destination_directory() {
    let run = run_monitor(2, &extract_mode(BASE, &[2], 0)).await;

    assert!(run.fixture.dest_dir.join("extracted.bin").exists());
    assert_eq!(run.session.destination, run.fixture.dest_dir);
}

#[tokio::test]
#[serial]
async fn large_error_stream_does_not_stall_extraction() {
    // Far more than a pipe buffer on stderr before stdout finishes
    let body = "\
i=0
while [ $i -lt 4000 ]; do echo \"warning: line $i of noise on the error stream\" >&2; i=$((i+1)); done
echo \"Extracting from $PARTS/show.part1.rar\"
echo \"Extracting from $PARTS/show.part2.rar\"
exit 0";
    let run = run_monitor(2, body).await;

    assert_eq!(run.session.status, SessionStatus::Succeeded);
    assert_eq!(deleted_parts(&run.events), vec![1, 2]);
    assert!(run.session.diagnostics.contains("line 3999"));
}

#[tokio::test]
#[serial]
async fn unstartable_tool_is_an_error() {
    let fixture = Fixture::with_parts(BASE, 1, 8);
    let config = fixture.config(&PathBuf::from("/nonexistent/unrar"));
    let set = locate(&fixture.part(BASE, 1), &config.extraction).unwrap();
    let monitor = ExtractionMonitor::new(
        ArchiveTool::new(PathBuf::from("/nonexistent/unrar")),
        config.extraction.clone(),
    );

    let result = monitor.extract(&set, &fixture.dest_dir).await;

    assert!(matches!(result, Err(Error::ExternalTool(_))));
    assert!(fixture.exists(BASE, 1));
}

#[tokio::test]
#[serial]
async fn warnings_from_a_successful_run_are_kept() {
    let body = "\
echo \"Extracting from $PARTS/show.part1.rar\"
echo \"Cannot set attributes of show.mkv\" >&2
echo \"All OK\"
exit 0";
    let run = run_monitor(1, body).await;

    assert_eq!(run.session.status, SessionStatus::Succeeded);
    assert_eq!(run.session.diagnostics, "Cannot set attributes of show.mkv");
    assert_eq!(deleted_parts(&run.events), vec![1]);
}

#[tokio::test]
#[serial]
async fn dropping_a_running_extraction_kills_the_tool() {
    let fixture = Fixture::with_parts(BASE, 2, 16);
    // Announces part 1, then touches a heartbeat file until it is killed
    let tool = fixture.write_tool(
        "exit 0",
        "echo \"Extracting from $ARCHIVE\"\n\
         while true; do touch heartbeat; sleep 0.1; done",
    );
    let config = fixture.config(&tool);
    let set = locate(&fixture.part(BASE, 1), &config.extraction).unwrap();
    let remover = Arc::new(RecordingRemover::default());
    let monitor = ExtractionMonitor::new(ArchiveTool::new(tool), config.extraction.clone())
        .with_remover(remover.clone());

    let result = tokio::time::timeout(
        Duration::from_millis(500),
        monitor.extract(&set, &fixture.dest_dir),
    )
    .await;
    assert!(result.is_err(), "extraction should still be running");

    let heartbeat = fixture.dest_dir.join("heartbeat");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(heartbeat.exists(), "tool never started");
    std::fs::remove_file(&heartbeat).unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(!heartbeat.exists(), "tool kept running after the extraction was dropped");
    assert!(remover.call_names().is_empty());
    assert!(fixture.exists(BASE, 1));
    assert!(fixture.exists(BASE, 2));
}

#[tokio::test]
#[serial]
async fn empty_set_is_rejected_before_anything_runs() {
    let fixture = Fixture::with_parts(BASE, 1, 8);
    let tool = fixture.write_tool("exit 0", "exit 0");
    let config = fixture.config(&tool);
    let set = ArchiveSet {
        base_name: BASE.to_string(),
        directory: fixture.parts_dir.clone(),
        parts: Vec::new(),
    };
    let monitor = ExtractionMonitor::new(ArchiveTool::new(tool), config.extraction.clone());

    let result = monitor.extract(&set, &fixture.dest_dir).await;

    assert!(matches!(result, Err(Error::NoPartsFound { .. })));
    assert!(!fixture.dest_dir.exists());
}
