#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::diagnostics::{RecordingReporter, Severity};
use std::fs;
use std::path::{Path, PathBuf};

#[test]
fn test_generation_is_success() {
    assert!(Generation::Succeeded.is_success());
    assert!(!Generation::Failed.is_success());
}

#[test]
fn test_generator_options_defaults() {
    let options = GeneratorOptions::new("/project");
    assert_eq!(options.output_dir, PathBuf::from("generated"));
    assert_eq!(options.output_path(), PathBuf::from("/project/generated"));
    assert_eq!(options.resolve("./api"), PathBuf::from("/project/./api"));
}

#[test]
fn test_generator_options_absolute_output_dir() {
    let options = GeneratorOptions::new("/project").with_output_dir("/tmp/out");
    assert_eq!(options.output_path(), PathBuf::from("/tmp/out"));
}

#[tokio::test]
async fn test_write_artifact_creates_parent() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested").join("deeper").join("api.ts");
    let reporter = RecordingReporter::new();

    let outcome = write_artifact(&target, "export default router;\n", &reporter).await;

    assert_eq!(outcome, Generation::Succeeded);
    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "export default router;\n"
    );
    assert!(reporter.diagnostics().is_empty());
}

#[tokio::test]
async fn test_write_artifact_reports_directory_failure() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let target = blocker.join("api.ts");
    let reporter = RecordingReporter::new();

    let outcome = write_artifact(&target, "x", &reporter).await;

    assert_eq!(outcome, Generation::Failed);
    let errors = reporter.messages(Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with(&format!(
        "Error creating the directory: {}: ",
        blocker.display()
    )));
}

#[test]
fn test_render_artifact_reports_template_errors() {
    let reporter = RecordingReporter::new();
    let text = render_artifact(Path::new("generated/index.ts"), &reporter, || {
        Err(anyhow::anyhow!("boom"))
    });
    assert!(text.is_none());
    assert!(reporter.contains(Severity::Error, "Failed to render generated/index.ts: boom"));
}
