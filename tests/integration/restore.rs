use crate::common::TestWorkspace;

#[test]
fn test_restore_touches_only_selected_project() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("Core", &[]);
    workspace.project("App", &["Core"]);
    workspace.use_shell_tool("echo restored").unwrap();

    let output = workspace.run_rtree(&["restore", "App/App.csproj"]).unwrap();
    output
        .assert_success()
        .assert_stdout_contains("Restoring App...")
        .assert_stdout_contains("1 restored, 0 failed");
    assert!(!output.stdout.contains("Restoring Core"));
}

#[test]
fn test_restore_runs_projects_in_order() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("One", &[]);
    workspace.project("Two", &[]);
    workspace.use_shell_tool("true").unwrap();

    let output =
        workspace.run_rtree(&["restore", "Two/Two.csproj", "One/One.csproj"]).unwrap();
    output.assert_success().assert_stdout_contains("2 restored");

    let two = output.stdout.find("Restoring Two...").unwrap();
    let one = output.stdout.find("Restoring One...").unwrap();
    assert!(two < one);
}

#[test]
fn test_restore_rejects_unsupported_extension() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project_with_extension("Fs", "fsproj");
    workspace.use_shell_tool("true").unwrap();

    let output = workspace.run_rtree(&["restore", "Fs/Fs.fsproj"]).unwrap();
    output.assert_failure().assert_stderr_contains("csproj, vbproj");
}

#[test]
fn test_restore_extensions_from_config() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project_with_extension("Fs", "fsproj");
    workspace
        .write_config(
            "tool = \"sh\"\ntool_args = [\"-c\", \"true\", \"sh\"]\nrestorable_extensions = [\"fsproj\"]\n",
        )
        .unwrap();

    let output = workspace.run_rtree(&["restore", "Fs/Fs.fsproj"]).unwrap();
    output.assert_success().assert_stdout_contains("1 restored");
}
