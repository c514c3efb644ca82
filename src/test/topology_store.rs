use super::{store, sw};
use crate::ctrl::{LinkPorts, TopologyStore};
use crate::net::PortNo;

#[test]
fn add_switch_is_idempotent_and_keeps_stats() {
    let mut topo = TopologyStore::new();
    assert!(topo.add_switch(sw(1)));
    topo.switch_mut(sw(1)).unwrap().throughput_kbps = Some(42.0);
    assert!(!topo.add_switch(sw(1)));
    assert_eq!(topo.throughput_kbps(sw(1)), Some(42.0));
    assert_eq!(topo.switch_count(), 1);
}

#[test]
fn links_are_directed() {
    let mut topo = store(&[1, 2], &[]);
    assert!(topo.link_up(sw(1), sw(2), PortNo(7), PortNo(9)));
    assert_eq!(topo.port(sw(1), sw(2)), Some(PortNo(7)));
    assert_eq!(topo.port(sw(2), sw(1)), None);
    assert_eq!(
        topo.link(sw(1), sw(2)),
        Some(LinkPorts {
            port: PortNo(7),
            peer_port: PortNo(9)
        })
    );

    // Re-reporting the same link is not a new link.
    assert!(!topo.link_up(sw(1), sw(2), PortNo(7), PortNo(9)));
    assert_eq!(topo.link_count(), 1);
}

#[test]
fn link_down_removes_only_that_direction() {
    let mut topo = store(&[1, 2, 3], &[(1, 2), (2, 3)]);
    assert_eq!(topo.link_count(), 4);

    let removed = topo.link_down(sw(2), sw(3)).expect("link existed");
    assert_eq!(removed.port, PortNo(3));
    assert_eq!(topo.port(sw(2), sw(3)), None);
    assert_eq!(topo.port(sw(3), sw(2)), Some(PortNo(2)));
    assert_eq!(topo.link_count(), 3);

    assert!(topo.link_down(sw(2), sw(3)).is_none());
    assert!(topo.link_down(sw(9), sw(3)).is_none());
}

#[test]
fn neighbours_lists_outgoing_edges_in_id_order() {
    let topo = store(&[1, 2, 3, 4], &[(2, 4), (2, 1), (2, 3)]);
    let nbrs: Vec<_> = topo.neighbours(sw(2)).collect();
    assert_eq!(
        nbrs,
        vec![(sw(1), PortNo(1)), (sw(3), PortNo(3)), (sw(4), PortNo(4))]
    );
    assert_eq!(topo.neighbours(sw(9)).count(), 0);
}
