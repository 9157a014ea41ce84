use crate::common::TestWorkspace;

#[test]
fn test_config_path_honours_environment() {
    let workspace = TestWorkspace::new().unwrap();

    let output = workspace.run_rtree(&["config", "path"]).unwrap();
    output.assert_success();
    assert_eq!(output.stdout.trim(), workspace.config_path().display().to_string());
}

#[test]
fn test_config_init_then_show() {
    let workspace = TestWorkspace::new().unwrap();

    workspace
        .run_rtree(&["config", "init"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("Created config");
    assert!(workspace.config_path().exists());

    workspace
        .run_rtree(&["config", "init"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("already exists");

    workspace
        .run_rtree(&["config"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("tool = \"dotnet\"");
}

#[test]
fn test_invalid_config_is_reported() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("App", &[]);
    workspace.write_config("max_parallel = 0\n").unwrap();

    let output = workspace.run_rtree(&["reload", "App/App.csproj", "--dry-run"]).unwrap();
    output.assert_failure().assert_stderr_contains("max_parallel");
}
