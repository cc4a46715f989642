//! Filter reconciliation tests.

use tcsync::exec::{ExecOutput, ScriptedRunner};
use tcsync::reconcile::FilterState;
use tcsync::settings::ParserKind;
use tcsync::{ApplyOptions, Error, FilterSpec, Outcome, Reconciler, Settings};

use crate::common::{command_lines, host, output, reconciler};

fn filter_host(filters: &str) -> ScriptedRunner {
    host()
        .respond("qdisc show", output("qdisc_htb.txt"))
        .respond("class show", output("class_htb.txt"))
        .respond("filter show", output(filters))
}

#[tokio::test]
async fn test_missing_target_class() {
    let r = reconciler(
        host()
            .respond("qdisc show", output("qdisc_htb.txt"))
            .respond("class show", ExecOutput::ok("")),
    );

    let spec = FilterSpec::new("eth0", 5, 80).flowid("1:6");
    let err = r.filter(&spec, &ApplyOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::FilterTargetMissing { ref flowid, .. } if flowid == "1:6"));

    // Removing a filter whose class is gone needs nothing.
    let outcome = r.filter(&spec.absent(), &ApplyOptions::default()).await.unwrap();
    assert_eq!(outcome, Outcome::Unchanged);
    assert!(r.runner().mutating_calls().is_empty());
}

#[tokio::test]
async fn test_absent_filter_without_parent() {
    let r = reconciler(host().respond("qdisc show", output("qdisc_default.txt")));

    let spec = FilterSpec::new("eth0", 5, 80).flowid("1:6").absent();
    let outcome = r.filter(&spec, &ApplyOptions::default()).await.unwrap();
    assert_eq!(outcome, Outcome::Unchanged);

    let err = r
        .filter(&FilterSpec::new("eth0", 5, 80).flowid("1:6"), &ApplyOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ParentNotFound { .. }));
    assert!(r.runner().mutating_calls().is_empty());
}

#[tokio::test]
async fn test_u32_match() {
    for fixture in ["filter_u32.txt", "filter_u32_legacy.txt"] {
        let r = reconciler(filter_host(fixture));
        let spec = FilterSpec::new("eth0", 5, 80).flowid("1:6");
        assert_eq!(
            r.filter(&spec, &ApplyOptions::default()).await.unwrap(),
            Outcome::Unchanged,
            "{}",
            fixture
        );
    }
}

#[tokio::test]
async fn test_u32_filters_sharing_a_class() {
    for (priority, port) in [(5, 80), (6, 443)] {
        for parser in [ParserKind::Positional, ParserKind::Keyword] {
            let r = Reconciler::new(
                filter_host("filter_u32_shared_class.txt"),
                Settings::default().parser(parser),
            );
            let spec = FilterSpec::new("eth0", priority, port).flowid("1:6");

            assert_eq!(r.inspect_filter(&spec).await.unwrap(), FilterState::Match);
            assert_eq!(
                r.filter(&spec, &ApplyOptions::default()).await.unwrap(),
                Outcome::Unchanged,
                "prio {} with {:?}",
                priority,
                parser
            );
            assert!(r.runner().mutating_calls().is_empty());
        }
    }
}

#[tokio::test]
async fn test_u32_port_change_at_second_priority() {
    let r = reconciler(filter_host("filter_u32_shared_class.txt"));
    let spec = FilterSpec::new("eth0", 6, 8443).flowid("1:6");
    r.filter(&spec, &ApplyOptions::default()).await.unwrap();

    assert_eq!(
        command_lines(&r.runner().mutating_calls()),
        vec![
            "tc filter del dev eth0 parent 1:0 protocol ip prio 6 u32",
            "tc filter add dev eth0 parent 1:0 protocol ip prio 6 u32 match ip dport 8443 0xffff flowid 1:6",
        ]
    );
}

#[tokio::test]
async fn test_u32_port_change() {
    let r = reconciler(filter_host("filter_u32.txt"));
    let spec = FilterSpec::new("eth0", 5, 443).flowid("1:6");

    assert_eq!(r.inspect_filter(&spec).await.unwrap(), FilterState::Change);
    r.filter(&spec, &ApplyOptions::default()).await.unwrap();

    assert_eq!(
        command_lines(&r.runner().mutating_calls()),
        vec![
            "tc filter del dev eth0 parent 1:0 protocol ip prio 5 u32",
            "tc filter add dev eth0 parent 1:0 protocol ip prio 5 u32 match ip dport 443 0xffff flowid 1:6",
        ]
    );
}

#[tokio::test]
async fn test_u32_other_priority_is_new_filter() {
    let r = reconciler(filter_host("filter_u32.txt"));
    let spec = FilterSpec::new("eth0", 6, 80).flowid("1:6");

    assert_eq!(r.inspect_filter(&spec).await.unwrap(), FilterState::None);
    let outcome = r.filter(&spec, &ApplyOptions::default()).await.unwrap();
    assert_eq!(outcome.commands().len(), 1);
    assert_eq!(
        outcome.commands()[0].to_string(),
        "tc filter add dev eth0 parent 1:0 protocol ip prio 6 u32 match ip dport 80 0xffff flowid 1:6"
    );
}

#[tokio::test]
async fn test_u32_absent() {
    let r = reconciler(filter_host("filter_u32.txt"));
    let spec = FilterSpec::new("eth0", 5, 80).flowid("1:6").absent();
    let outcome = r.filter(&spec, &ApplyOptions::default()).await.unwrap();
    assert_eq!(
        command_lines(&r.runner().mutating_calls()),
        vec!["tc filter del dev eth0 parent 1:0 protocol ip prio 5 u32"]
    );
    assert!(outcome.is_changed());

    let r = reconciler(filter_host("filter_cgroup.txt"));
    assert_eq!(
        r.filter(&spec, &ApplyOptions::default()).await.unwrap(),
        Outcome::Unchanged
    );
}

#[tokio::test]
async fn test_cgroup_match() {
    let r = reconciler(filter_host("filter_cgroup.txt"));
    for handle in ["8:", "0x8"] {
        let spec = FilterSpec::new("eth0", 8, 65536).flowid("1:6").cgroup(handle);
        assert_eq!(r.inspect_filter(&spec).await.unwrap(), FilterState::Match);
    }
    assert!(r.runner().mutating_calls().is_empty());
}

#[tokio::test]
async fn test_cgroup_handle_change() {
    let r = reconciler(filter_host("filter_cgroup.txt"));
    let spec = FilterSpec::new("eth0", 8, 65536).flowid("1:6").cgroup("9:");
    r.filter(&spec, &ApplyOptions::default()).await.unwrap();

    assert_eq!(
        command_lines(&r.runner().mutating_calls()),
        vec![
            "tc filter del dev eth0 parent 1:0 prio 8",
            "tc filter add dev eth0 parent 1:0 prio 8 handle 9: cgroup",
        ]
    );
}

#[tokio::test]
async fn test_check_only() {
    let r = reconciler(filter_host("filter_u32.txt"));
    let spec = FilterSpec::new("eth0", 5, 443).flowid("1:6");
    let outcome = r
        .filter(&spec, &ApplyOptions::default().check_only(true))
        .await
        .unwrap();

    assert!(outcome.is_planned());
    assert_eq!(outcome.commands().len(), 2);
    assert!(r.runner().mutating_calls().is_empty());
}

#[tokio::test]
async fn test_flowid_major_mismatch() {
    let r = reconciler(filter_host("filter_u32.txt"));
    let spec = FilterSpec::new("eth0", 5, 80).flowid("2:6");
    let err = r.filter(&spec, &ApplyOptions::default()).await.unwrap_err();
    assert_eq!(err.param(), Some(("flowid", "2:6")));
    assert!(r.runner().mutating_calls().is_empty());
}
