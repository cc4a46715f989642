//! Qdisc reconciliation tests.

use tcsync::exec::{ExecOutput, ScriptedRunner};
use tcsync::reconcile::QdiscState;
use tcsync::{ApplyOptions, Error, Outcome, QdiscSpec};

use crate::common::{command_lines, host, output, reconciler};

#[tokio::test]
async fn test_add_then_idempotent() {
    let r = reconciler(
        host()
            .respond("qdisc show", output("qdisc_default.txt"))
            .respond("qdisc show", output("qdisc_htb.txt")),
    );
    let spec = QdiscSpec::new("eth0");
    let options = ApplyOptions::default();

    let first = r.qdisc(&spec, &options).await.unwrap();
    assert!(first.is_changed());

    let second = r.qdisc(&spec, &options).await.unwrap();
    assert_eq!(second, Outcome::Unchanged);

    assert_eq!(
        command_lines(&r.runner().mutating_calls()),
        vec!["tc qdisc add dev eth0 root handle 1:0 htb"]
    );
}

#[tokio::test]
async fn test_replace_deletes_then_adds() {
    let r = reconciler(host().respond("qdisc show", output("qdisc_htb.txt")));
    let spec = QdiscSpec::new("eth0").handle("2:0");

    assert_eq!(r.inspect_qdisc(&spec).await.unwrap(), QdiscState::Change);
    r.qdisc(&spec, &ApplyOptions::default()).await.unwrap();

    assert_eq!(
        command_lines(&r.runner().mutating_calls()),
        vec![
            "tc qdisc del dev eth0 root",
            "tc qdisc add dev eth0 root handle 2:0 htb",
        ]
    );
}

#[tokio::test]
async fn test_absent() {
    let r = reconciler(host().respond("qdisc show", output("qdisc_default.txt")));
    let spec = QdiscSpec::new("eth0").absent();
    assert_eq!(
        r.qdisc(&spec, &ApplyOptions::default()).await.unwrap(),
        Outcome::Unchanged
    );

    let r = reconciler(host().respond("qdisc show", output("qdisc_htb.txt")));
    let outcome = r.qdisc(&spec, &ApplyOptions::default()).await.unwrap();
    assert_eq!(outcome.commands()[0].to_string(), "tc qdisc del dev eth0 root");
}

#[tokio::test]
async fn test_noqueue_is_default() {
    let r = reconciler(host().respond("qdisc show", output("qdisc_noqueue.txt")));
    let spec = QdiscSpec::new("eth0");
    assert_eq!(r.inspect_qdisc(&spec).await.unwrap(), QdiscState::Default);
}

#[tokio::test]
async fn test_attach_points_are_independent() {
    let r = reconciler(host().respond("qdisc show", output("qdisc_htb_ingress.txt")));

    let root = QdiscSpec::new("eth0");
    assert_eq!(r.inspect_qdisc(&root).await.unwrap(), QdiscState::Match);

    let ingress = QdiscSpec::new("eth0")
        .ingress()
        .discipline("ingress")
        .handle("ffff:");
    assert_eq!(r.inspect_qdisc(&ingress).await.unwrap(), QdiscState::Match);
}

#[tokio::test]
async fn test_check_only() {
    let r = reconciler(host().respond("qdisc show", output("qdisc_default.txt")));
    let options = ApplyOptions::default().check_only(true);

    let outcome = r.qdisc(&QdiscSpec::new("eth0"), &options).await.unwrap();
    match outcome {
        Outcome::Planned { commands } => {
            assert_eq!(commands.len(), 1);
            assert_eq!(commands[0].to_string(), "tc qdisc add dev eth0 root handle 1:0 htb");
        }
        other => panic!("expected a plan, got {:?}", other),
    }
    assert!(r.runner().mutating_calls().is_empty());
}

#[tokio::test]
async fn test_failed_add_after_delete() {
    let r = reconciler(
        host()
            .respond("qdisc show", output("qdisc_htb.txt"))
            .respond("qdisc add", ExecOutput::failed(2, "RTNETLINK answers: Invalid argument")),
    );
    let err = r
        .qdisc(&QdiscSpec::new("eth0").handle("2:0"), &ApplyOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ExternalToolFailure { exit_code: 2, .. }));
    // The delete went through and nothing tried to restore the old qdisc.
    assert_eq!(r.runner().mutating_calls().len(), 2);
}

#[tokio::test]
async fn test_show_failure() {
    let r = reconciler(host().respond("qdisc show", ExecOutput::failed(1, "Cannot find device \"eth0\"")));
    let err = r
        .qdisc(&QdiscSpec::new("eth0"), &ApplyOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), Some(1));
    assert!(r.runner().mutating_calls().is_empty());
}

#[tokio::test]
async fn test_device_from_ip_output() {
    let r = reconciler(
        ScriptedRunner::without_interface_list()
            .respond("a", output("ip_a.txt"))
            .respond("qdisc show", output("qdisc_htb.txt")),
    );

    let outcome = r.qdisc(&QdiscSpec::new("eth0"), &ApplyOptions::default()).await.unwrap();
    assert_eq!(outcome, Outcome::Unchanged);

    let err = r
        .qdisc(&QdiscSpec::new("eth1"), &ApplyOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DeviceNotFound { ref name } if name == "eth1"));
}
