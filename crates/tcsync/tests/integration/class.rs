//! Class reconciliation tests.

use tcsync::exec::ExecOutput;
use tcsync::reconcile::ClassState;
use tcsync::{ApplyOptions, ClassSpec, Error, Outcome};

use crate::common::{command_lines, host, output, reconciler};

fn htb_host() -> tcsync::exec::ScriptedRunner {
    host()
        .respond("qdisc show", output("qdisc_htb.txt"))
        .respond("class show", output("class_htb.txt"))
}

#[tokio::test]
async fn test_drift_detection() {
    let r = reconciler(htb_host());

    let faster = ClassSpec::new("eth0", "200mbit");
    assert_eq!(r.inspect_class(&faster).await.unwrap(), ClassState::Change);

    let same = ClassSpec::new("eth0", "100mbit");
    assert_eq!(r.inspect_class(&same).await.unwrap(), ClassState::Match);
}

#[tokio::test]
async fn test_change_in_place() {
    let r = reconciler(htb_host());
    r.class(&ClassSpec::new("eth0", "200mbit"), &ApplyOptions::default())
        .await
        .unwrap();

    assert_eq!(
        command_lines(&r.runner().mutating_calls()),
        vec!["tc class change dev eth0 parent 1:0 classid 1:1 htb rate 200mbit ceil 200mbit"]
    );
}

#[tokio::test]
async fn test_ceil_defaults_to_rate() {
    let r = reconciler(htb_host());
    let options = ApplyOptions::default();

    let implicit = ClassSpec::new("eth0", "100Mbit");
    let explicit = ClassSpec::new("eth0", "100Mbit").ceil("100Mbit");
    assert_eq!(r.class(&implicit, &options).await.unwrap(), Outcome::Unchanged);
    assert_eq!(r.class(&explicit, &options).await.unwrap(), Outcome::Unchanged);

    // 1:6 is listed with ceil 900Mbit, so leaving ceil out is drift.
    let leaf = ClassSpec::new("eth0", "450mbit").classid("1:6");
    assert_eq!(r.inspect_class(&leaf).await.unwrap(), ClassState::Change);
    let leaf = leaf.ceil("900mbit");
    assert_eq!(r.inspect_class(&leaf).await.unwrap(), ClassState::Match);
}

#[tokio::test]
async fn test_add_then_idempotent() {
    let listed = "class htb 1:6 root prio 0 rate 50Mbit ceil 50Mbit burst 1600b cburst 1600b \n";
    let r = reconciler(
        host()
            .respond("qdisc show", output("qdisc_htb.txt"))
            .respond("class show", ExecOutput::ok(""))
            .respond("class show", ExecOutput::ok(listed)),
    );
    let spec = ClassSpec::new("eth0", "50mbit").classid("1:6");

    assert!(r.class(&spec, &ApplyOptions::default()).await.unwrap().is_changed());
    assert_eq!(
        r.class(&spec, &ApplyOptions::default()).await.unwrap(),
        Outcome::Unchanged
    );
    assert_eq!(
        command_lines(&r.runner().mutating_calls()),
        vec!["tc class add dev eth0 parent 1:0 classid 1:6 htb rate 50mbit ceil 50mbit"]
    );
}

#[tokio::test]
async fn test_absent() {
    let r = reconciler(htb_host());
    let options = ApplyOptions::default();

    let missing = ClassSpec::new("eth0", "1mbit").classid("1:9").absent();
    assert_eq!(r.class(&missing, &options).await.unwrap(), Outcome::Unchanged);

    let listed = ClassSpec::new("eth0", "1mbit").absent();
    let outcome = r.class(&listed, &options).await.unwrap();
    assert_eq!(
        outcome.commands()[0].to_string(),
        "tc class del dev eth0 parent 1:0 classid 1:1"
    );
}

#[tokio::test]
async fn test_validation_before_mutation() {
    let r = reconciler(htb_host());
    let options = ApplyOptions::default();

    let err = r
        .class(&ClassSpec::new("eth0", "100mbit").classid("2:6"), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ClassIdentifierInconsistent { param: "classid", .. }));

    let err = r
        .class(&ClassSpec::new("eth0", "100mbit").classid("1:0"), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ClassIdentifierInconsistent { .. }));

    let err = r
        .class(&ClassSpec::new("eth0", "100megabit"), &options)
        .await
        .unwrap_err();
    assert_eq!(err.param(), Some(("rate", "100megabit")));

    let err = r
        .class(&ClassSpec::new("eth0", "100mbit").ceil("1.5gbit"), &options)
        .await
        .unwrap_err();
    assert_eq!(err.param(), Some(("ceil", "1.5gbit")));

    let err = r
        .class(&ClassSpec::new("eth0", "100mbit").parent("1:1"), &options)
        .await
        .unwrap_err();
    assert_eq!(err.param(), Some(("parent", "1:1")));

    assert!(r.runner().mutating_calls().is_empty());
}

#[tokio::test]
async fn test_parent_not_configured() {
    let r = reconciler(htb_host());
    let spec = ClassSpec::new("eth0", "100mbit").parent("2:0").classid("2:1");
    let err = r.class(&spec, &ApplyOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::ParentNotFound { ref parent, .. } if parent == "2:0"));
}
