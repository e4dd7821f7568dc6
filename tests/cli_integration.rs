use assert_cmd::Command;
use micropay_core::wallet::{address_key_hashes, verify, PublicKey, Signature};
use micropay_core::{build_spend_authorization, AssetQuantityVector, FundReference};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const TX: &str = "0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f";

fn micropay() -> Command {
    let mut cmd = Command::cargo_bin("micropay").expect("binary builds");
    cmd.env_remove("MICROPAY_NETWORK")
        .env_remove("MICROPAY_DEBUG")
        .env_remove("MICROPAY_ACCOUNT");
    cmd
}

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("cli runs");
    assert!(output.status.success(), "cli exited unsuccessfully: {:?}", output);
    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    serde_json::from_str(&stdout).expect("stdout is valid json")
}

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("micropay-{}-{}", std::process::id(), name));
    fs::write(&path, contents).expect("write temp file");
    path
}

#[test]
fn parse_unit_splits_policy_and_name() {
    let unit = "c48cbb3d5e57ed56e276bc45f99ab39abe94e6cd7ac39fb402da47ad0014df105553444d";
    let out = run_json(micropay().args(["parse-unit", unit]));
    assert_eq!(out["group_id"], "c48cbb3d5e57ed56e276bc45f99ab39abe94e6cd7ac39fb402da47ad");
    assert_eq!(out["sub_name"], "0014df105553444d");
    assert_eq!(out["label"], 333);
    assert_eq!(out["name"], "5553444d");

    let lovelace = run_json(micropay().args(["parse-unit", "lovelace"]));
    assert_eq!(lovelace["sub_name"], Value::Null);
}

#[test]
fn encode_and_decode_roundtrip() {
    let schema = temp_file(
        "schema.json",
        r#"{"dataType": "map", "keys": {"dataType": "bytes"}, "values": {"dataType": "integer"}}"#,
    );
    let out = run_json(micropay().args([
        "encode",
        "--schema",
        schema.to_str().unwrap(),
        r#"{"map": [["bb", 1], ["aa", 2]]}"#,
    ]));
    assert_eq!(out["cbor"], "a241aa0241bb01");

    let decoded = run_json(micropay().args(["decode", "a241aa0241bb01"]));
    assert_eq!(decoded["map"][0]["k"]["bytes"], "aa");
    fs::remove_file(schema).ok();
}

#[test]
fn derive_reads_phrase_from_stdin() {
    let out = run_json(micropay().args(["--network", "preprod", "derive"]).write_stdin(PHRASE));
    let address = out["address"].as_str().unwrap();
    assert!(address.starts_with("addr_test1q"));
    assert_eq!(out["path"], "m/1852'/1815'/0'/0/0");
    assert_eq!(out["public_key"].as_str().unwrap().len(), 64);

    let again = run_json(micropay().args(["--network", "preprod", "derive"]).write_stdin(PHRASE));
    assert_eq!(out, again);

    let stdout = serde_json::to_string(&out).unwrap();
    assert!(!stdout.contains("abandon"));
}

#[test]
fn derive_rejects_short_phrase() {
    let output = micropay()
        .arg("derive")
        .write_stdin("too few words")
        .output()
        .expect("cli runs");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("got 3"));
    assert!(!stderr.contains("few words"));
}

#[test]
fn authorize_produces_verifiable_envelope() {
    let merchant = run_json(
        micropay()
            .args(["--network", "preprod", "derive", "--path", "m/1852'/1815'/5'/0/0"])
            .write_stdin(PHRASE),
    );
    let merchant_address = merchant["address"].as_str().unwrap().to_string();

    let request = temp_file(
        "request.json",
        &serde_json::json!({
            "fund": {"hash": TX, "index": 2},
            "amount": {"lovelace": "1500000"},
            "merchant_address": merchant_address,
        })
        .to_string(),
    );
    let envelope = run_json(
        micropay()
            .args(["--network", "preprod", "authorize", "--request", request.to_str().unwrap()])
            .write_stdin(PHRASE),
    );
    fs::remove_file(request).ok();

    assert_eq!(envelope["merchant_address"], merchant_address.as_str());
    assert_eq!(envelope["funds_utxo_ref"]["index"], 2);
    assert_eq!(envelope["amount"][0][0], "lovelace");

    let hashes = address_key_hashes(&merchant_address).unwrap();
    let message = build_spend_authorization(
        &FundReference::new(TX, 2),
        &AssetQuantityVector::from_pairs([("lovelace", 1_500_000u128)]),
        &[hashes.payment.to_vec(), hashes.stake.unwrap().to_vec()],
    )
    .unwrap();
    let signature = Signature::from_hex(envelope["signature"].as_str().unwrap()).unwrap();
    let public_key = PublicKey::from_hex(envelope["public_key"].as_str().unwrap()).unwrap();
    assert!(verify(message.as_bytes(), &signature, &public_key));
}

#[test]
fn reconcile_applies_overrides() {
    let funds = temp_file(
        "funds.json",
        r#"{
            "totalInL1": {"lovelace": "1000000", "beef01": "250"},
            "totalInL2": {"lovelace": 2000000},
            "fetchedAt": "2026-03-01T00:00:00Z"
        }"#,
    );
    let out = run_json(micropay().args([
        "reconcile",
        "--funds",
        funds.to_str().unwrap(),
        "--price",
        "lovelace=0.35",
        "--decimals",
        "beef01=2",
    ]));
    fs::remove_file(funds).ok();

    assert_eq!(out["total_usd"], "1.05");
    let assets = out["assets"].as_array().unwrap();
    assert_eq!(assets.len(), 2);
    let beef = assets.iter().find(|a| a["unit"] == "beef01").unwrap();
    assert_eq!(beef["display"], "2.5");
    assert_eq!(beef["usd_value"], Value::Null);
    assert_eq!(out["partial"][0]["reason"], "unknown_price");
}
