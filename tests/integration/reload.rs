use crate::common::TestWorkspace;

/// App -> Lib -> Core and App -> Core
fn layered_workspace() -> TestWorkspace {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("Core", &[]);
    workspace.project("Lib", &["Core"]);
    workspace.project("App", &["Lib", "Core"]);
    workspace
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack.find(needle).unwrap_or_else(|| panic!("'{needle}' not found in:\n{haystack}"))
}

#[test]
fn test_reload_restores_dependencies_first() {
    let workspace = layered_workspace();
    workspace.use_shell_tool("echo restored").unwrap();

    let output = workspace.run_rtree(&["reload", "App/App.csproj"]).unwrap();
    output
        .assert_success()
        .assert_stdout_contains("Restore command exit code: 0")
        .assert_stdout_contains("3 restored, 0 failed, 0 skipped, 0 cancelled");

    let core = position(&output.stdout, "Restoring Core...");
    let lib = position(&output.stdout, "Restoring Lib...");
    let app = position(&output.stdout, "Restoring App...");
    assert!(core < lib && lib < app, "unexpected order:\n{}", output.stdout);
}

#[test]
fn test_reload_cleans_output_directories() {
    let workspace = layered_workspace();
    workspace.use_shell_tool("true").unwrap();
    let stale = workspace.path().join("Core/obj/project.assets.json");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, "{}").unwrap();
    std::fs::create_dir_all(workspace.path().join("Core/bin/Debug")).unwrap();

    workspace.run_rtree(&["reload", "App/App.csproj"]).unwrap().assert_success();

    assert!(!stale.exists());
    assert!(!workspace.path().join("Core/bin").exists());
}

#[test]
fn test_output_path_containing_project_is_not_deleted() {
    let workspace = TestWorkspace::new().unwrap();
    let app = workspace.project_with_properties("App", "    <BaseOutputPath>.\\</BaseOutputPath>\n");
    workspace.use_shell_tool("echo restored").unwrap();

    let output = workspace.run_rtree(&["reload", "App/App.csproj"]).unwrap();
    output
        .assert_failure()
        .assert_stdout_contains("Failed to clean directory")
        .assert_stdout_contains("0 restored, 1 failed");
    assert!(app.exists());
    assert!(!output.stdout.contains("Restore command exit code"));
}

#[test]
fn test_shared_dependency_restored_once_across_roots() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("Core", &[]);
    workspace.project("App", &["Core"]);
    workspace.project("Tool", &["Core"]);
    workspace.use_shell_tool("true").unwrap();

    let output =
        workspace.run_rtree(&["reload", "App/App.csproj", "Tool/Tool.csproj"]).unwrap();
    output.assert_success().assert_stdout_contains("3 restored");
    assert_eq!(output.stdout.matches("Restoring Core...").count(), 1);
}

#[test]
fn test_dry_run_prints_levels_without_restoring() {
    let workspace = layered_workspace();
    workspace.use_shell_tool("exit 1").unwrap();
    let obj = workspace.path().join("App/obj");
    std::fs::create_dir_all(&obj).unwrap();

    let output = workspace.run_rtree(&["reload", "App/App.csproj", "--dry-run"]).unwrap();
    output
        .assert_success()
        .assert_stdout_contains("level 0: Core")
        .assert_stdout_contains("level 1: Lib")
        .assert_stdout_contains("level 2: App");
    assert!(!output.stdout.contains("Restoring"));
    assert!(obj.exists());
}

#[test]
fn test_dry_run_json_shares_claims_between_roots() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("Core", &[]);
    workspace.project("App", &["Core"]);

    let output = workspace
        .run_rtree(&["reload", "App/App.csproj", "Core/Core.csproj", "--dry-run", "--format", "json"])
        .unwrap();
    output.assert_success();

    let plan: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(plan[0]["root"], "App");
    assert_eq!(plan[0]["levels"], serde_json::json!([["Core"], ["App"]]));
    assert_eq!(plan[1]["root"], "Core");
    assert_eq!(plan[1]["levels"], serde_json::json!([]));
}

#[test]
fn test_non_zero_exit_fails_command() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("App", &[]);
    workspace.use_shell_tool("exit 3").unwrap();

    let output = workspace.run_rtree(&["reload", "App/App.csproj"]).unwrap();
    output
        .assert_failure()
        .assert_stdout_contains("Restore command exit code: 3")
        .assert_stdout_contains("exited with code 3")
        .assert_stderr_contains("1 project(s) failed");
}

#[test]
fn test_failure_without_escalation_continues_dependents() {
    let workspace = layered_workspace();
    workspace.use_shell_tool("case \"$1\" in *Core*) exit 1 ;; esac").unwrap();

    let output = workspace.run_rtree(&["reload", "App/App.csproj"]).unwrap();
    output
        .assert_failure()
        .assert_stdout_contains("Restoring App...")
        .assert_stdout_contains("2 restored, 1 failed, 0 skipped");
}

#[test]
fn test_escalation_skips_dependents() {
    let workspace = layered_workspace();
    workspace.use_shell_tool("case \"$1\" in *Core*) exit 1 ;; esac").unwrap();

    let output =
        workspace.run_rtree(&["reload", "App/App.csproj", "--escalate-failures"]).unwrap();
    output
        .assert_failure()
        .assert_stdout_contains("Lib skipped")
        .assert_stdout_contains("App skipped")
        .assert_stdout_contains("0 restored, 1 failed, 2 skipped");
    assert!(!output.stdout.contains("Restoring App..."));
}

#[test]
fn test_json_report() {
    let workspace = layered_workspace();
    workspace.use_shell_tool("echo restored").unwrap();

    let output =
        workspace.run_rtree(&["reload", "App/App.csproj", "--format", "json"]).unwrap();
    output.assert_success();

    let report: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    let outcomes = report["outcomes"].as_array().unwrap();
    let names: Vec<&str> = outcomes.iter().map(|o| o["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Core", "Lib", "App"]);
    assert!(outcomes.iter().all(|o| o["status"] == "restored" && o["exit_code"] == 0));
    assert_eq!(report["cancelled"], false);
}

#[test]
fn test_missing_tool_is_reported_per_project() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("App", &[]);
    workspace.write_config("tool = \"rtree-no-such-restore-tool\"\n").unwrap();

    let output = workspace.run_rtree(&["reload", "App/App.csproj"]).unwrap();
    output
        .assert_failure()
        .assert_stdout_contains("rtree-no-such-restore-tool")
        .assert_stdout_contains("0 restored, 1 failed");
}

#[test]
fn test_unknown_project_is_rejected() {
    let workspace = layered_workspace();

    let output = workspace.run_rtree(&["reload", "Missing/Missing.csproj"]).unwrap();
    output.assert_failure().assert_stderr_contains("Project not found");
}

#[test]
fn test_timeout_fails_project() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("App", &[]);
    workspace.use_shell_tool("sleep 5").unwrap();

    let output =
        workspace.run_rtree(&["reload", "App/App.csproj", "--timeout", "1"]).unwrap();
    output.assert_failure().assert_stdout_contains("timed out after 1 seconds");
}
