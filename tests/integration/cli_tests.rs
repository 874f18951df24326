//! Integration tests for the CLI binary.
//!
//! Runs the `wotv` binary against a temporary home directory.
//!
//! This test is registered as a [[test]] in the wot-vouch-cli crate
//! so that CARGO_BIN_EXE_wotv is available.

use std::path::Path;
use std::process::Command;

use wot_vouch::chain::{ChainLink, LinkBody, VerifiedUser};
use wot_vouch::expansion::Sha256Extractor;
use wot_vouch::identity::{Kid, LocalIdentity, Seqno, SigId, Uid};
use wot_vouch::storage::ChainStore;

const EXPANSION: &str = r#"{"user":{"eldest":{"KID":"kid_alice","Seqno":1},"UID":"uid_alice","Username":"alice"},"confidence":{"username_verified_via":"video","vouched_by":["uid_V"]},"vouch_text":["Known from conference"]}"#;

/// Get a Command pointing to the `wotv` binary.
fn wotv_binary() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_wotv"));
    cmd.env_remove("WOT_HOME").env_remove("RUST_LOG");
    cmd
}

/// Seed `home` with alice as `me` and victor's chain, and write a
/// response reporting victor's vouch with `expansion`.
fn seed_home(home: &Path, expansion: &str) -> std::path::PathBuf {
    let store = ChainStore::new(home).unwrap();
    store
        .save_me(&LocalIdentity::new(
            "alice",
            Uid::new("uid_alice"),
            Kid::new("kid_alice"),
        ))
        .unwrap();
    store
        .save_user(&VerifiedUser {
            uid: Uid::new("uid_V"),
            username: "victor".into(),
            eldest_kid: Kid::new("kid_V"),
            eldest_seqno: Seqno(1),
            links: vec![ChainLink {
                seqno: Seqno(2),
                sig_id: SigId::new("sig_123"),
                revoked: false,
                body: LinkBody::WotVouch {
                    expansion_id: Sha256Extractor::expansion_id_for(EXPANSION.as_bytes()),
                },
            }],
        })
        .unwrap();

    let response = home.join("pending.json");
    let body = serde_json::json!({
        "pending": [{
            "voucher": "uid_V",
            "voucher_eldest_seqno": 1,
            "sig_id": "sig_123",
            "expansion_json": expansion,
        }]
    });
    std::fs::write(&response, serde_json::to_vec(&body).unwrap()).unwrap();
    response
}

#[test]
fn cli_responds_to_help() {
    let output = wotv_binary()
        .arg("--help")
        .output()
        .expect("failed to execute wotv --help");

    assert!(
        output.status.success(),
        "wotv --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("pending") && stdout.contains("Usage"),
        "wotv --help output should list subcommands, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = wotv_binary()
        .arg("--version")
        .output()
        .expect("failed to execute wotv --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("wotv") && stdout.contains(env!("CARGO_PKG_VERSION")),
        "wotv --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = wotv_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute wotv");

    assert!(
        !output.status.success(),
        "wotv with unknown flag should exit with error"
    );
}

#[test]
fn pending_prints_verified_vouch() {
    let dir = tempfile::tempdir().unwrap();
    let response = seed_home(dir.path(), EXPANSION);

    let output = wotv_binary()
        .arg("--home")
        .arg(dir.path())
        .arg("pending")
        .arg("--response")
        .arg(&response)
        .output()
        .expect("failed to execute wotv pending");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pending vouches: 1"), "got: {stdout}");
    assert!(stdout.contains("victor (uid_V%1)"), "got: {stdout}");
    assert!(stdout.contains("Known from conference"), "got: {stdout}");
    assert!(stdout.contains("Verified via: video"), "got: {stdout}");
}

#[test]
fn pending_json_output_parses() {
    let dir = tempfile::tempdir().unwrap();
    let response = seed_home(dir.path(), EXPANSION);

    let output = wotv_binary()
        .arg("--home")
        .arg(dir.path())
        .args(["pending", "--json", "--response"])
        .arg(&response)
        .output()
        .expect("failed to execute wotv pending --json");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["verified_at"].is_string());
    assert_eq!(json["pending"][0]["proof"], "sig_123");
    assert_eq!(json["pending"][0]["confidence"]["vouched_by"][0], "victor");
}

#[test]
fn pending_fails_on_vouch_for_someone_else() {
    let dir = tempfile::tempdir().unwrap();
    let for_bob = EXPANSION.replace(r#""Username":"alice""#, r#""Username":"bob""#);
    let response = seed_home(dir.path(), &for_bob);

    let output = wotv_binary()
        .arg("--home")
        .arg(dir.path())
        .arg("pending")
        .arg("--response")
        .arg(&response)
        .output()
        .expect("failed to execute wotv pending");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "got: {stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn expansion_id_matches_library() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("expansion.json");
    std::fs::write(&file, EXPANSION).unwrap();

    let output = wotv_binary()
        .arg("expansion-id")
        .arg(&file)
        .output()
        .expect("failed to execute wotv expansion-id");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        Sha256Extractor::expansion_id_for(EXPANSION.as_bytes()).as_str()
    );
}

#[test]
fn confidence_resolves_uids_from_store() {
    let dir = tempfile::tempdir().unwrap();
    seed_home(dir.path(), EXPANSION);
    let file = dir.path().join("confidence.json");
    std::fs::write(&file, r#"{"username_verified_via":"IN_PERSON","vouched_by":["uid_V"]}"#)
        .unwrap();

    let output = wotv_binary()
        .arg("--home")
        .arg(dir.path())
        .arg("confidence")
        .arg(&file)
        .output()
        .expect("failed to execute wotv confidence");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["username_verified_via"], "in_person");
    assert_eq!(json["vouched_by"][0], "victor");
}

#[test]
fn users_lists_stored_chains() {
    let dir = tempfile::tempdir().unwrap();
    seed_home(dir.path(), EXPANSION);

    let output = wotv_binary()
        .arg("--home")
        .arg(dir.path())
        .arg("users")
        .output()
        .expect("failed to execute wotv users");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("uid_V  victor  (1 links)"), "got: {stdout}");
}
