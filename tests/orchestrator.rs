mod common;

use common::{FailingHost, Fixture};
use release_matrix::matrix::Platform;
use release_matrix::{EntryState, Orchestrator, ReportManager, Stage, TriggerEvent};

fn trigger(tag: &str) -> TriggerEvent {
    TriggerEvent::from_tag(tag, &Default::default()).unwrap()
}

#[tokio::test]
async fn test_failed_entry_does_not_stop_siblings() {
    let fx = Fixture::new();
    let entries = vec![fx.entry(Platform::Linux), fx.entry(Platform::Mac)];
    let runner = fx.runner(&entries);
    runner.omit_output(Platform::Linux);

    let orchestrator = Orchestrator::new(fx.pipeline(&runner));
    let report = orchestrator.run(&trigger("2.3.1"), &entries).await;

    assert!(!report.succeeded());
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.entries[0].platform, Platform::Linux);
    assert_eq!(report.entries[0].state, EntryState::Failed);
    assert_eq!(
        report.entries[0].failure.as_ref().unwrap().stage,
        Some(Stage::Collect)
    );
    assert_eq!(report.entries[1].state, EntryState::Published);
    assert!(fx.release_asset("2.3.1", "app-mac").is_file());
    assert!(!fx.release_asset("2.3.1", "app-linux").exists());
    assert!(report.finished_at.is_some());
}

#[tokio::test]
async fn test_runnable_entries_publish_distinct_assets() {
    let fx = Fixture::new();
    let matrix = fx.config.matrix().unwrap();
    let entries = matrix.runnable_on(Some(Platform::Windows));
    let runner = fx.runner(&entries);

    let report = Orchestrator::new(fx.pipeline_on(&runner, Platform::Windows))
        .run(&trigger("2.3.1"), &entries)
        .await;

    assert!(report.succeeded(), "{:?}", report.failed().collect::<Vec<_>>());
    assert_eq!(report.entries.len(), 2);
    for name in ["app-linux", "app-windows.exe"] {
        assert!(fx.release_asset("2.3.1", name).is_file(), "{name}");
    }
    let wheels = std::fs::read_dir(fx.pool_dir()).unwrap().count();
    assert_eq!(wheels, 2);
}

#[tokio::test]
async fn test_full_matrix_fails_only_the_foreign_entry() {
    let fx = Fixture::new();
    let entries = fx.config.matrix().unwrap().entries().to_vec();
    let runner = fx.runner(&entries);

    let report = Orchestrator::new(fx.pipeline_on(&runner, Platform::Windows))
        .run(&trigger("2.3.1"), &entries)
        .await;

    assert!(!report.succeeded());
    let mac = report.entry(Platform::Mac).unwrap();
    assert_eq!(mac.state, EntryState::Failed);
    assert_eq!(mac.failure.as_ref().unwrap().stage, Some(Stage::Provision));
    assert!(!fx.release_asset("2.3.1", "app-mac").exists());
    assert!(report.entry(Platform::Linux).unwrap().succeeded());
    assert!(report.entry(Platform::Windows).unwrap().succeeded());
    assert!(fx.release_asset("2.3.1", "app-windows.exe").is_file());
}

#[tokio::test]
async fn test_host_rejection_fails_only_that_entry() {
    let fx = Fixture::new();
    let entries = vec![fx.entry(Platform::Linux), fx.entry(Platform::Mac)];
    let runner = fx.runner(&entries);
    let host = FailingHost::new(fx.host(), "app-linux");

    let report = Orchestrator::new(fx.pipeline_with_host(&runner, host, Platform::Mac))
        .run(&trigger("2.3.1"), &entries)
        .await;

    assert!(!report.succeeded());
    let linux = report.entry(Platform::Linux).unwrap();
    assert_eq!(linux.state, EntryState::Failed);
    let failure = linux.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Some(Stage::Publish));
    assert!(failure.message.contains("502"), "{}", failure.message);
    assert!(linux.sha256.is_none());
    assert!(!fx.release_asset("2.3.1", "app-linux").exists());

    assert!(report.entry(Platform::Mac).unwrap().succeeded());
    assert!(fx.release_asset("2.3.1", "app-mac").is_file());
}

#[tokio::test]
async fn test_panicking_entry_is_reported_as_failed() {
    let fx = Fixture::new();
    let entries = vec![fx.entry(Platform::Linux), fx.entry(Platform::Windows)];
    let runner = fx.runner(&entries);
    runner.panic_on("sudo");

    let report = Orchestrator::new(fx.pipeline_on(&runner, Platform::Windows))
        .run(&trigger("2.3.1"), &entries)
        .await;

    let linux = report.entry(Platform::Linux).unwrap();
    assert_eq!(linux.state, EntryState::Failed);
    assert_eq!(linux.failure.as_ref().unwrap().stage, None);
    assert!(report.entry(Platform::Windows).unwrap().succeeded());
}

#[tokio::test]
async fn test_run_report_round_trips_through_manager() {
    let fx = Fixture::new();
    let entries = vec![fx.entry(Platform::Mac)];
    let runner = fx.runner(&entries);

    let report = Orchestrator::new(fx.pipeline(&runner))
        .run(&trigger("2.3.1"), &entries)
        .await;

    let manager = ReportManager::new(fx.config.output_root());
    let path = manager.save(&report).unwrap();
    assert!(path.ends_with("run-2.3.1.json"));

    let loaded = manager.load("2.3.1").unwrap();
    assert!(loaded.succeeded());
    assert_eq!(loaded.entries[0].sha256, report.entries[0].sha256);
}
