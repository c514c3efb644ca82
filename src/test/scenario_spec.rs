use super::{mac, sw};
use crate::fabric::preset_scenario;
use crate::net::PortNo;
use crate::sim::{ScenarioError, ScenarioSpec, TopologySpec};

fn parse(raw: &str) -> ScenarioSpec {
    ScenarioSpec::from_json_str(raw).expect("parse scenario")
}

#[test]
fn scenario_parses_minimal_json_with_defaults() {
    let spec = parse(r#"{ "schema_version": 1, "topology": { "kind": "diamond" } }"#);
    assert!(matches!(spec.topology, TopologySpec::Diamond));
    assert!(spec.hosts.is_empty());
    assert!(spec.traffic.is_empty());
    assert!(spec.meta.is_none());
    assert_eq!(spec.controller_config().unwrap().sampling_interval_secs, 5);

    let topo = spec.validate().expect("valid");
    assert_eq!(topo.switches, vec![sw(1), sw(2), sw(3), sw(4)]);
    assert_eq!(topo.links.len(), 4);
}

#[test]
fn custom_topology_keeps_declared_ports() {
    let spec = parse(
        r#"
    {
        "schema_version": 1,
        "meta": { "name": "pair" },
        "topology": {
            "kind": "custom",
            "switches": [7, 9],
            "links": [ { "a": 7, "a_port": 3, "b": 9, "b_port": 5 } ]
        },
        "hosts": [ { "mac": "00:00:00:00:00:01", "switch": 7, "port": 1 } ]
    }
    "#,
    );
    assert_eq!(spec.meta.as_ref().and_then(|m| m.name.as_deref()), Some("pair"));
    let topo = spec.validate().expect("valid");
    let link = topo.find_link(sw(9), sw(7)).expect("link");
    assert_eq!((link.a_port, link.b_port), (PortNo(3), PortNo(5)));
    assert_eq!(topo.free_port(sw(7)), PortNo(4));
}

#[test]
fn line_and_ring_builders_allocate_ports_sequentially() {
    let line = TopologySpec::Line { switches: 3 }.build().unwrap();
    assert_eq!(line.links.len(), 2);
    assert_eq!(line.link_ports(sw(2)).collect::<Vec<_>>(), vec![PortNo(1), PortNo(2)]);

    let ring = TopologySpec::Ring { switches: 4 }.build().unwrap();
    assert_eq!(ring.links.len(), 4);
    assert!(ring.find_link(sw(4), sw(1)).is_some());

    // Two switches do not form a ring.
    assert_eq!(TopologySpec::Ring { switches: 2 }.build().unwrap().links.len(), 1);
    assert!(matches!(
        TopologySpec::Line { switches: 0 }.build(),
        Err(ScenarioError::EmptyTopology)
    ));
}

#[test]
fn validation_rejects_dangling_references() {
    let base = |extra: &str| {
        format!(
            r#"{{ "schema_version": 1, "topology": {{ "kind": "line", "switches": 2 }}, {extra} }}"#
        )
    };

    let err = parse(&base(r#""hosts": [ { "mac": "00:00:00:00:00:01", "switch": 5, "port": 9 } ]"#))
        .validate()
        .unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownSwitch { dpid, .. } if dpid == sw(5)));

    let err = parse(&base(
        r#""hosts": [ { "mac": "00:00:00:00:00:01", "switch": 1, "port": 9 },
                      { "mac": "00:00:00:00:00:01", "switch": 2, "port": 9 } ]"#,
    ))
    .validate()
    .unwrap_err();
    assert!(matches!(err, ScenarioError::DuplicateHost { .. }));

    let err = parse(&base(r#""hosts": [ { "mac": "00:00:00:00:00:01", "switch": 1, "port": 1 } ]"#))
        .validate()
        .unwrap_err();
    assert!(matches!(err, ScenarioError::HostPortInUse { port, .. } if port == PortNo(1)));

    let err = parse(&base(
        r#""traffic": [ { "at_ms": 1, "src": "00:00:00:00:00:01", "dst": "00:00:00:00:00:02" } ]"#,
    ))
    .validate()
    .unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownHost { mac: m, .. } if m == mac(1)));

    let err = parse(&base(r#""link_changes": [ { "at_ms": 1, "a": 1, "b": 3, "up": false } ]"#))
        .validate()
        .unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownLink { .. }));

    let err = parse(&base(r#""loads": [ { "switch": 4, "kbps": 1.0 } ]"#))
        .validate()
        .unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownSwitch { context: "load", .. }));

    let custom = |links: &str| {
        format!(
            r#"{{ "schema_version": 1,
                 "topology": {{ "kind": "custom", "switches": [1, 2, 3], "links": [{links}] }} }}"#
        )
    };

    // s1 port 1 wired to both s2 and s3
    let err = parse(&custom(
        r#"{ "a": 1, "a_port": 1, "b": 2, "b_port": 1 },
           { "a": 1, "a_port": 1, "b": 3, "b_port": 1 }"#,
    ))
    .validate()
    .unwrap_err();
    assert!(matches!(
        err,
        ScenarioError::PortInUse { dpid, port } if dpid == sw(1) && port == PortNo(1)
    ));

    let err = parse(&custom(r#"{ "a": 2, "a_port": 1, "b": 2, "b_port": 2 }"#))
        .validate()
        .unwrap_err();
    assert!(matches!(err, ScenarioError::SelfLink { dpid } if dpid == sw(2)));

    let err = parse(&custom(r#"{ "a": 1, "a_port": 1, "b": 4, "b_port": 1 }"#))
        .validate()
        .unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownSwitch { context: "link", .. }));

    // The same port number on different switches is fine.
    parse(&custom(
        r#"{ "a": 1, "a_port": 1, "b": 2, "b_port": 1 },
           { "a": 2, "a_port": 2, "b": 3, "b_port": 1 }"#,
    ))
    .validate()
    .expect("distinct ports");
}

#[test]
fn validation_rejects_unknown_schema_and_bad_config() {
    let err = parse(r#"{ "schema_version": 2, "topology": { "kind": "diamond" } }"#)
        .validate()
        .unwrap_err();
    assert!(matches!(err, ScenarioError::SchemaVersion(2)));

    let spec = parse(
        r#"{ "schema_version": 1, "topology": { "kind": "diamond" },
             "controller": { "sampling_interval_secs": 0 } }"#,
    );
    assert!(matches!(spec.controller_config(), Err(ScenarioError::Config(_))));
}

#[test]
fn malformed_mac_fails_to_parse() {
    let raw = r#"{ "schema_version": 1, "topology": { "kind": "diamond" },
                   "hosts": [ { "mac": "bogus", "switch": 1, "port": 9 } ] }"#;
    assert!(matches!(ScenarioSpec::from_json_str(raw), Err(ScenarioError::Parse(_))));
}

#[test]
fn preset_places_hosts_on_free_ports_at_both_ends() {
    let spec = preset_scenario(TopologySpec::Line { switches: 3 }, 3_000).expect("preset");
    spec.validate().expect("preset is valid");
    assert_eq!(spec.hosts.len(), 2);
    assert_eq!((spec.hosts[0].switch, spec.hosts[0].port), (sw(1), PortNo(2)));
    assert_eq!((spec.hosts[1].switch, spec.hosts[1].port), (sw(3), PortNo(2)));
    let times: Vec<u64> = spec.traffic.iter().map(|t| t.at_ms).collect();
    assert_eq!(times, vec![100, 200, 1000, 2000, 3000]);

    let single = preset_scenario(TopologySpec::Line { switches: 1 }, 0).expect("preset");
    single.validate().expect("single switch preset is valid");
    assert_ne!(single.hosts[0].port, single.hosts[1].port);
}
