//! netdump binary output

use serde_json::{json, Value};
use std::process::Command;

fn netdump(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_netdump"))
        .args(args)
        .output()
        .expect("Failed to run netdump")
}

#[test]
fn test_host_dump_json() {
    let output = netdump(&[
        "host",
        "--id",
        "1",
        "--ipv6-ula-prefix",
        "fc00::/64",
        "--ipv4-prefix",
        "192.168.0.0/24",
    ]);
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        value,
        json!({
            "ipv4": "192.168.0.1",
            "ipv4Cidr": "192.168.0.1/24",
            "ipv6Ula": "fc00::1",
            "ipv6UlaCidr": "fc00::1/64",
            "ipv6Gua": null,
            "ipv6GuaCidr": null
        })
    );
}

#[test]
fn test_host_without_id_fails() {
    let output = netdump(&[
        "host",
        "--ipv6-ula-prefix",
        "fc00::/64",
        "--ipv4-prefix",
        "192.168.0.0/24",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid host ID"));
}

#[test]
fn test_bad_mac_rejected_by_parser() {
    let output = netdump(&[
        "host",
        "--id",
        "2",
        "--mac",
        "not-a-mac",
        "--ipv6-ula-prefix",
        "fc00::/64",
        "--ipv4-prefix",
        "192.168.0.0/24",
    ]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_network_dump_json() {
    let output = netdump(&[
        "network",
        "--id",
        "3",
        "--ipv4-prefix",
        "10.0.0.0/16",
        "--ipv6-gua-prefix",
        "2001:db8:42::/48",
    ]);
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["ipv4Prefix"], "10.0.3.0/24");
    assert_eq!(value["ipv6UlaPrefix"], Value::Null);
    assert_eq!(value["ipv6GuaPrefix"], "2001:db8:42:3::/64");
}
