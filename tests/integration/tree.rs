use crate::common::TestWorkspace;
use predicates::prelude::*;

/// Shared dependencies are expanded once and marked afterwards
#[test]
fn test_tree_marks_shared_dependency() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("Core", &[]);
    workspace.project("Lib", &["Core"]);
    workspace.project("App", &["Lib", "Core"]);

    workspace
        .rtree()
        .args(["tree", "App/App.csproj"])
        .assert()
        .success()
        .stdout(predicate::str::contains("App\n├── Lib\n│   └── Core\n└── Core (shared)\n"))
        .stdout(predicate::str::contains("3 projects, 3 references"));
}

#[test]
fn test_tree_reports_cycle() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("A", &["B"]);
    workspace.project("B", &["A"]);

    workspace
        .rtree()
        .args(["tree", "A/A.csproj"])
        .assert()
        .success()
        .stdout(predicate::str::contains("└── A (cycle)"))
        .stdout(predicate::str::contains("contains cycles"));
}

#[test]
fn test_tree_json_lists_missing_reference_as_leaf() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("App", &["Missing"]);

    let output = workspace.run_rtree(&["tree", "App/App.csproj", "--format", "json"]).unwrap();
    output.assert_success();

    let json: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(json["root"], "App");
    assert_eq!(json["projects"], 1);
    assert_eq!(json["references"], 0);
    assert_eq!(json["has_cycles"], false);
}

#[test]
fn test_tree_unknown_project_fails() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.project("App", &[]);

    workspace
        .rtree()
        .args(["tree", "Other/Other.csproj"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Project not found"));
}

#[test]
fn test_tree_with_workspace_flag() {
    let workspace = TestWorkspace::new().unwrap();
    let app = workspace.project("App", &[]);

    workspace
        .rtree()
        .current_dir(std::env::temp_dir())
        .arg("--workspace")
        .arg(workspace.path())
        .arg("tree")
        .arg(&app)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("App\n"));
}
