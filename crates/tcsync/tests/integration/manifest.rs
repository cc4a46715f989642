//! Manifest application tests.

use tcsync::exec::ExecOutput;
use tcsync::{ApplyOptions, Error, Manifest};

use crate::common::{command_lines, host, output, reconciler};

const MANIFEST: &str = r#"
qdiscs:
  - device: eth0
classes:
  - device: eth0
    classid: "1:6"
    rate: 450mbit
    ceil: 900mbit
filters:
  - device: eth0
    flowid: "1:6"
    priority: 5
    port: 80
"#;

fn fresh_host() -> tcsync::exec::ScriptedRunner {
    host()
        .respond("qdisc show", output("qdisc_default.txt"))
        .respond("qdisc show", output("qdisc_htb.txt"))
        .respond("class show", ExecOutput::ok(""))
        .respond("class show", output("class_htb.txt"))
}

#[tokio::test]
async fn test_fresh_host() {
    let manifest = Manifest::from_yaml(MANIFEST).unwrap();
    let r = reconciler(fresh_host());

    let report = r.apply_manifest(&manifest, &ApplyOptions::default()).await;
    assert!(report.is_success(), "{}", report.summary_text());
    assert!(report.changed());
    assert_eq!(report.entries.len(), 3);

    assert_eq!(
        command_lines(&r.runner().mutating_calls()),
        vec![
            "tc qdisc add dev eth0 root handle 1:0 htb",
            "tc class add dev eth0 parent 1:0 classid 1:6 htb rate 450mbit ceil 900mbit",
            "tc filter add dev eth0 parent 1:0 protocol ip prio 5 u32 match ip dport 80 0xffff flowid 1:6",
        ]
    );
}

#[tokio::test]
async fn test_converged_host() {
    let manifest = Manifest::from_yaml(MANIFEST).unwrap();
    let r = reconciler(
        host()
            .respond("qdisc show", output("qdisc_htb.txt"))
            .respond("class show", output("class_htb.txt"))
            .respond("filter show", output("filter_u32.txt")),
    );

    let report = r.apply_manifest(&manifest, &ApplyOptions::default()).await;
    assert!(report.is_success());
    assert!(!report.changed());
    assert!(r.runner().mutating_calls().is_empty());
}

#[tokio::test]
async fn test_stops_at_first_failure() {
    let manifest = Manifest::from_yaml(&MANIFEST.replacen("device: eth0", "device: eth9", 1)).unwrap();

    let r = reconciler(fresh_host());
    let report = r.apply_manifest(&manifest, &ApplyOptions::default()).await;
    assert!(!report.is_success());
    assert_eq!(report.entries.len(), 1);

    let (resource, err) = report.errors().next().unwrap();
    assert!(resource.starts_with("qdisc"));
    assert!(matches!(err, Error::DeviceNotFound { .. }));
    assert!(r.runner().mutating_calls().is_empty());
}

#[tokio::test]
async fn test_continue_on_error() {
    let manifest = Manifest::from_yaml(&MANIFEST.replacen("device: eth0", "device: eth9", 1)).unwrap();

    let r = reconciler(
        host()
            .respond("qdisc show", output("qdisc_htb.txt"))
            .respond("class show", output("class_htb.txt")),
    );
    let options = ApplyOptions::default().continue_on_error(true);
    let report = r.apply_manifest(&manifest, &options).await;

    assert_eq!(report.entries.len(), 3);
    assert_eq!(report.errors().count(), 1);
    assert!(report.entries[1].result.is_ok());
    assert!(report.entries[2].result.is_ok());
}

#[tokio::test]
async fn test_check_only() {
    let manifest = Manifest::from_yaml(MANIFEST).unwrap();
    let r = reconciler(
        host()
            .respond("qdisc show", output("qdisc_htb.txt"))
            .respond("class show", output("class_htb.txt")),
    );

    let report = r
        .apply_manifest(&manifest, &ApplyOptions::default().check_only(true))
        .await;
    assert!(report.is_success());
    assert!(!report.changed());
    for entry in &report.entries {
        assert!(entry.result.as_ref().unwrap().is_planned());
    }
    assert!(r.runner().mutating_calls().is_empty());
}

const TEARDOWN: &str = r#"
qdiscs:
  - device: eth0
    state: absent
classes:
  - device: eth0
    classid: "1:6"
    rate: 450mbit
    state: absent
filters:
  - device: eth0
    flowid: "1:6"
    priority: 5
    port: 80
    state: absent
"#;

#[tokio::test]
async fn test_absent_removed_children_first() {
    let manifest = Manifest::from_yaml(TEARDOWN).unwrap();
    let r = reconciler(
        host()
            .respond("qdisc show", output("qdisc_htb.txt"))
            .respond("class show", output("class_htb.txt"))
            .respond("filter show", output("filter_u32.txt")),
    );

    let report = r.apply_manifest(&manifest, &ApplyOptions::default()).await;
    assert!(report.is_success(), "{}", report.summary_text());
    assert_eq!(
        command_lines(&r.runner().mutating_calls()),
        vec![
            "tc filter del dev eth0 parent 1:0 protocol ip prio 5 u32",
            "tc class del dev eth0 parent 1:0 classid 1:6",
            "tc qdisc del dev eth0 root",
        ]
    );
}

#[tokio::test]
async fn test_teardown_twice() {
    let manifest = Manifest::from_yaml(TEARDOWN).unwrap();
    // The filter, the class and the qdisc itself each list the HTB root
    // once; after that only the kernel default is left.
    let r = reconciler(
        host()
            .respond("qdisc show", output("qdisc_htb.txt"))
            .respond("qdisc show", output("qdisc_htb.txt"))
            .respond("qdisc show", output("qdisc_htb.txt"))
            .respond("qdisc show", output("qdisc_default.txt"))
            .respond("class show", output("class_htb.txt"))
            .respond("filter show", output("filter_u32.txt")),
    );

    let first = r.apply_manifest(&manifest, &ApplyOptions::default()).await;
    assert!(first.is_success(), "{}", first.summary_text());
    assert!(first.changed());
    assert_eq!(r.runner().mutating_calls().len(), 3);

    let second = r.apply_manifest(&manifest, &ApplyOptions::default()).await;
    assert!(second.is_success(), "{}", second.summary_text());
    assert!(!second.changed());
    assert_eq!(second.entries.len(), 3);
    assert_eq!(r.runner().mutating_calls().len(), 3);
}
