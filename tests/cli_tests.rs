//! Tests for the xmlobject binary

use std::error::Error;

use assert_cmd::Command;
use predicates::prelude::*;

type TestResult = Result<(), Box<dyn Error>>;

const RESPONSE: &str = r#"<saml2p:Response xmlns:saml2p="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion" ID="r1" Version="2.0" IssueInstant="2024-01-01T00:00:00Z"><saml2:Assertion ID="a1" Version="2.0" IssueInstant="2024-01-01T00:00:00Z"><saml2:Issuer>https://idp.example.org</saml2:Issuer></saml2:Assertion></saml2p:Response>"#;

fn xmlobject() -> Result<Command, Box<dyn Error>> {
    Ok(Command::cargo_bin("xmlobject")?)
}

#[test]
fn test_stdin_roundtrip() -> TestResult {
    xmlobject()?
        .write_stdin(RESPONSE)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"ID="r1""#))
        .stdout(predicate::str::contains("https://idp.example.org"));
    Ok(())
}

#[test]
fn test_resolve_prints_only_the_referenced_element() -> TestResult {
    xmlobject()?
        .args(["--resolve", "a1"])
        .write_stdin(RESPONSE)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<saml2:Assertion"))
        .stdout(predicate::str::contains("Response").not());
    Ok(())
}

#[test]
fn test_unknown_id_fails() -> TestResult {
    xmlobject()?
        .args(["--resolve", "missing"])
        .write_stdin(RESPONSE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no element with ID"));
    Ok(())
}

#[test]
fn test_unknown_root_fails() -> TestResult {
    xmlobject()?
        .write_stdin(r#"<unknown xmlns="urn:nothing"/>"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to unmarshall"));
    Ok(())
}

#[test]
fn test_doctype_requires_flag() -> TestResult {
    let input = format!("<!DOCTYPE r>{RESPONSE}");
    xmlobject()?
        .write_stdin(input.as_str())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse input"));
    xmlobject()?
        .arg("--allow-doctype")
        .write_stdin(input.as_str())
        .assert()
        .success();
    Ok(())
}

#[test]
fn test_file_input_and_output() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("response.xml");
    let output = dir.path().join("out.xml");
    std::fs::write(&input, RESPONSE)?;

    xmlobject()?
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .args(["--pretty", "--rebuild"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = std::fs::read_to_string(&output)?;
    assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
    assert!(written.contains("  <saml2:Assertion"));
    Ok(())
}
