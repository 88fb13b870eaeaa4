use anyhow::Result;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_canary-deployments"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(binary())
        .current_dir(dir)
        .env_remove("CANARY_STAGE")
        .env_remove("CANARY_SERVICE")
        .env_remove("CANARY_CONFIG")
        .env_remove("CANARY_CONFIG_CONTENT")
        .env_remove("CANARY_REQUIRE_INTEGRATION")
        .args(args)
        .output()
        .expect("Failed to run binary")
}

fn compiled_template() -> Value {
    json!({
        "AWSTemplateFormatVersion": "2010-09-09",
        "Resources": {
            "HelloLambdaFunction": {
                "Type": "AWS::Lambda::Function",
                "Properties": { "Handler": "handler.hello" }
            },
            "HelloLambdaVersionAbc123": {
                "Type": "AWS::Lambda::Version",
                "DeletionPolicy": "Retain",
                "Properties": { "FunctionName": { "Ref": "HelloLambdaFunction" } }
            },
            "ApiGatewayMethodHelloGet": {
                "Type": "AWS::ApiGateway::Method",
                "Properties": {
                    "HttpMethod": "GET",
                    "Integration": {
                        "Type": "AWS_PROXY",
                        "Uri": {
                            "Fn::Join": ["", [
                                "arn:aws:apigateway:",
                                { "Ref": "AWS::Region" },
                                ":lambda:path/2015-03-31/functions/",
                                { "Fn::GetAtt": ["HelloLambdaFunction", "Arn"] },
                                "/invocations"
                            ]]
                        }
                    }
                }
            }
        }
    })
}

const SERVICE: &str = r#"
service: greeter
provider:
  name: aws
  stage: dev
functions:
  hello:
    handler: handler.hello
    deploymentPreference:
      type: Canary10Percent5Minutes
      alias: live
      alarms:
        - HelloErrorsAlarm
"#;

fn write_inputs(dir: &TempDir, service: &str) -> Result<(PathBuf, PathBuf)> {
    let template = dir.path().join("compiled.json");
    let descriptor = dir.path().join("serverless.yml");
    std::fs::write(&template, serde_json::to_string_pretty(&compiled_template())?)?;
    std::fs::write(&descriptor, service)?;
    Ok((template, descriptor))
}

#[test]
fn test_cli_help() {
    let output = Command::new(binary())
        .arg("--help")
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("apply"));
    assert!(stdout.contains("plan"));
    assert!(stdout.contains("--config"));
    assert!(stdout.contains("--log-level"));
}

#[test]
fn test_apply_writes_augmented_template() -> Result<()> {
    let dir = TempDir::new()?;
    let (template, descriptor) = write_inputs(&dir, SERVICE)?;
    let out = dir.path().join("out.json");

    let output = run(
        dir.path(),
        &[
            "apply",
            "--template",
            template.to_str().unwrap(),
            "--service",
            descriptor.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&out)?)?;
    let resources = &written["Resources"];
    assert_eq!(
        resources["GreeterdevDeploymentApplication"]["Type"],
        "AWS::CodeDeploy::Application"
    );
    assert_eq!(resources["CodeDeployServiceRole"]["Type"], "AWS::IAM::Role");
    assert_eq!(
        resources["HelloLambdaFunctionAliaslive"]["Properties"]["FunctionVersion"],
        json!({ "Fn::GetAtt": ["HelloLambdaVersionAbc123", "Version"] })
    );
    assert_eq!(
        resources["ApiGatewayMethodHelloGet"]["Properties"]["Integration"]["Uri"]["Fn::Join"][1][3],
        json!({ "Ref": "HelloLambdaFunctionAliaslive" })
    );
    assert_eq!(written["AWSTemplateFormatVersion"], "2010-09-09");
    Ok(())
}

#[test]
fn test_stage_flag_overrides_descriptor() -> Result<()> {
    let dir = TempDir::new()?;
    let (template, descriptor) = write_inputs(&dir, SERVICE)?;

    let output = run(
        dir.path(),
        &[
            "apply",
            "--template",
            template.to_str().unwrap(),
            "--service",
            descriptor.to_str().unwrap(),
            "--stage",
            "prod",
        ],
    );
    assert!(output.status.success());

    let written: Value = serde_json::from_slice(&output.stdout)?;
    assert!(written["Resources"]
        .get("GreeterprodDeploymentApplication")
        .is_some());
    Ok(())
}

#[test]
fn test_plan_prints_summary_without_writing() -> Result<()> {
    let dir = TempDir::new()?;
    let (template, descriptor) = write_inputs(&dir, SERVICE)?;
    let before = std::fs::read_to_string(&template)?;

    let output = run(
        dir.path(),
        &[
            "plan",
            "--template",
            template.to_str().unwrap(),
            "--service",
            descriptor.to_str().unwrap(),
        ],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("+ HelloLambdaFunctionDeploymentGroup"));
    assert!(stdout.contains("+ HelloLambdaFunctionAliaslive"));
    assert!(stdout.contains("~ ApiGatewayMethodHelloGet -> HelloLambdaFunctionAliaslive"));
    assert_eq!(std::fs::read_to_string(&template)?, before);
    Ok(())
}

#[test]
fn test_unresolved_version_fails_without_output() -> Result<()> {
    let dir = TempDir::new()?;
    let service = SERVICE.replace("  hello:", "  goodbye:");
    let (template, descriptor) = write_inputs(&dir, &service)?;
    let out = dir.path().join("out.json");

    let output = run(
        dir.path(),
        &[
            "apply",
            "--template",
            template.to_str().unwrap(),
            "--service",
            descriptor.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("goodbye"), "stderr: {stderr}");
    assert!(stderr.contains("E002"), "stderr: {stderr}");
    assert!(!out.exists());
    Ok(())
}

#[test]
fn test_config_file_relaxes_integration_requirement() -> Result<()> {
    let dir = TempDir::new()?;
    let (template, descriptor) = write_inputs(&dir, SERVICE)?;

    // Drop the API method so the function has no integration
    let mut compiled = compiled_template();
    compiled["Resources"]
        .as_object_mut()
        .unwrap()
        .remove("ApiGatewayMethodHelloGet");
    std::fs::write(&template, serde_json::to_string(&compiled)?)?;

    let args = [
        "plan",
        "--template",
        template.to_str().unwrap(),
        "--service",
        descriptor.to_str().unwrap(),
    ];
    assert!(!run(dir.path(), &args).status.success());

    std::fs::write(
        dir.path().join("canary.toml"),
        "[orchestration]\nrequire_integration = false\n",
    )?;
    let output = run(dir.path(), &args);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("no API Gateway integration"));
    Ok(())
}

#[test]
fn test_malformed_default_config_is_reported() -> Result<()> {
    let dir = TempDir::new()?;
    let (template, descriptor) = write_inputs(&dir, SERVICE)?;
    let out = dir.path().join("out.json");
    std::fs::write(dir.path().join("canary.toml"), "[naming]\nstage = [[[ not toml\n")?;

    let output = run(
        dir.path(),
        &[
            "apply",
            "--template",
            template.to_str().unwrap(),
            "--service",
            descriptor.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("canary.toml"), "stderr: {stderr}");
    assert!(!out.exists());
    Ok(())
}
