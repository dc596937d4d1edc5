//! Integration tests for building runtime invocations from configuration files
//!
//! Loads the fixture configuration from disk and checks the complete argument
//! lists produced for service and primary containers.

use binci_core::config::{ConfigFormat, ConfigLoader, Overrides, ServiceSelection};
use binci_core::errors::{BinciError, BuildError, ConfigWarning};
use binci_core::invocation::{
    build_invocation, plan_invocations, ContainerRole, HostContext, InvocationPlan,
};
use binci_core::platform::Platform;
use binci_core::task::NewlineMode;
use std::collections::HashMap;
use std::path::Path;

fn fixture_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("binci.yml")
}

fn host_env() -> HashMap<String, String> {
    HashMap::from([("BINCI_TEST_HOME".to_string(), "/home/tester".to_string())])
}

fn plan(mode: NewlineMode) -> InvocationPlan {
    let config = ConfigLoader::load_from_path(&fixture_path()).unwrap();
    let env = host_env();
    let host = HostContext::new("/src/app", Platform::Unix, &env);
    plan_invocations(&config, "primary", &host, mode).unwrap()
}

#[test]
fn test_fixture_primary_invocation() {
    let plan = plan(NewlineMode::FirstOnly);

    let expected = [
        "run",
        "--rm",
        "-v",
        "/src/app:/src/app",
        "-w",
        "/src/app",
        "--privileged",
        "-e",
        "NODE_ENV=test",
        "-e",
        "HOME_DIR=/home/tester",
        "-e",
        "TOKEN=null",
        "-p",
        "8080:8080",
        "-v",
        "/home/tester/.npm:/root/.npm",
        "--link",
        "dl_mongo:dl_mongo",
        "--link",
        "dl_redis:dl_redis",
        "--name",
        "dl_primary",
        "node:20",
        "/bin/sh",
        "-c",
        "\"npm install; npm run lint; npm test\nnpm run coverage; echo done; echo bye\"",
    ];
    assert_eq!(plan.primary.args, expected);
    assert!(plan.primary.warnings.is_empty());
}

#[test]
fn test_fixture_service_invocations() {
    let plan = plan(NewlineMode::FirstOnly);

    assert_eq!(plan.service_container_names(), vec!["dl_mongo", "dl_redis"]);
    assert_eq!(
        plan.services[0].invocation.args,
        vec![
            "run",
            "-d",
            "--privileged",
            "-p",
            "27017:27017",
            "--name",
            "dl_mongo",
            "mongo:7"
        ]
    );
    assert_eq!(
        plan.services[1].invocation.args,
        vec!["run", "-d", "--privileged", "--name", "dl_redis", "redis:7"]
    );
}

#[test]
fn test_fixture_join_all_lines() {
    let plan = plan(NewlineMode::All);
    assert_eq!(
        plan.primary.args.last().unwrap(),
        "\"npm install; npm run lint; npm test; npm run coverage; echo done; echo bye\""
    );
}

#[test]
fn test_disabled_services_drop_links_and_containers() {
    let config = ConfigLoader::load_from_path(&fixture_path()).unwrap();
    let selection = ServiceSelection::from_flags(&["mongo".to_string()], false).unwrap();
    let config = config.without_services(&selection);

    let env = host_env();
    let host = HostContext::new("/src/app", Platform::Unix, &env);
    let plan = plan_invocations(&config, "primary", &host, NewlineMode::FirstOnly).unwrap();

    assert_eq!(plan.service_container_names(), vec!["dl_redis"]);
    assert!(!plan.primary.args.iter().any(|a| a.contains("dl_mongo")));
    assert!(plan.primary.args.iter().any(|a| a == "dl_redis:dl_redis"));
}

#[test]
fn test_command_line_exec_override() {
    let config = ConfigLoader::load_from_path(&fixture_path()).unwrap();
    let config = config
        .without_services(&ServiceSelection::All)
        .with_overrides(&Overrides {
            from: Some("node:18".to_string()),
            task: vec!["node".to_string(), "-v".to_string()],
            exec: true,
        });

    let env = host_env();
    let host = HostContext::new("/src/app", Platform::Unix, &env);
    let inv = build_invocation(
        &config,
        "primary",
        ContainerRole::Primary,
        &host,
        NewlineMode::FirstOnly,
    )
    .unwrap();

    let tail: Vec<&str> = inv.args.iter().rev().take(4).rev().map(String::as_str).collect();
    assert_eq!(
        tail,
        vec![
            "node:18",
            "/bin/sh",
            "-c",
            "\"npm install; node -v; echo done; echo bye\""
        ]
    );
    assert!(!inv.args.iter().any(|a| a == "--link"));
}

#[test]
fn test_missing_task_from_command_line() {
    let config = ConfigLoader::load_from_path(&fixture_path()).unwrap();
    let config = config.with_overrides(&Overrides {
        task: vec!["deploy".to_string()],
        ..Overrides::default()
    });

    let env = host_env();
    let host = HostContext::new("/src/app", Platform::Unix, &env);
    let err = plan_invocations(&config, "primary", &host, NewlineMode::FirstOnly).unwrap_err();
    assert_eq!(
        err,
        BuildError::MissingTask {
            name: "deploy".to_string()
        }
    );
}

#[test]
fn test_missing_from_never_returns_arguments() {
    let config = ConfigLoader::parse_str("task: x\n", ConfigFormat::Yaml).unwrap();
    let env: HashMap<String, String> = HashMap::new();
    let host = HostContext::new("/src/app", Platform::Unix, &env);

    let result = build_invocation(
        &config,
        "primary",
        ContainerRole::Primary,
        &host,
        NewlineMode::FirstOnly,
    );
    assert_eq!(result, Err(BuildError::MissingBaseImage));

    let err: BinciError = result.unwrap_err().into();
    assert_eq!(err.to_string(), "Missing 'from' property in config or argument");
}

#[test]
fn test_wrong_typed_properties_warn_and_continue() {
    let yaml = "env: NODE_ENV=test\nvolumes:\n  - /a:/a\nexpose: 8080\nfrom: alpine\nexec: true\ntask: ls\n";
    let config = ConfigLoader::parse_str(yaml, ConfigFormat::Yaml).unwrap();
    let env: HashMap<String, String> = HashMap::new();
    let host = HostContext::new("/w", Platform::Unix, &env);

    let inv = build_invocation(
        &config,
        "primary",
        ContainerRole::Primary,
        &host,
        NewlineMode::FirstOnly,
    )
    .unwrap();

    assert!(!inv.args.iter().any(|a| a == "-e" || a == "-p"));
    assert_eq!(inv.args.iter().filter(|a| *a == "-v").count(), 2);
    assert_eq!(
        inv.warnings,
        vec![
            ConfigWarning::InvalidArrayProperty {
                property: "env".to_string()
            },
            ConfigWarning::InvalidArrayProperty {
                property: "expose".to_string()
            },
        ]
    );
}

#[test]
fn test_json_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("binci.json");
    std::fs::write(
        &path,
        r#"{
  // volumes before env reverses the flag order
  "from": "alpine",
  "volumes": ["/data:/data"],
  "env": ["A=1"],
  "exec": true,
  "task": "env",
}"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_path(&path).unwrap();
    let env: HashMap<String, String> = HashMap::new();
    let host = HostContext::new("/w", Platform::Unix, &env);
    let inv = build_invocation(
        &config,
        "primary",
        ContainerRole::Primary,
        &host,
        NewlineMode::FirstOnly,
    )
    .unwrap();

    assert_eq!(&inv.args[7..11], ["-v", "/data:/data", "-e", "A=1"]);
}
