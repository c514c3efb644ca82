mod dataplane;
mod path_selector;
mod scenario_spec;
mod topology_store;

use crate::ctrl::TopologyStore;
use crate::net::{DatapathId, ETH_TYPE_ARP, MacAddr, PacketIn, PortNo};

pub(crate) fn sw(n: u64) -> DatapathId {
    DatapathId(n)
}

pub(crate) fn mac(n: u64) -> MacAddr {
    MacAddr::from_u64(n)
}

/// Host-facing port used throughout the tests; switch-to-switch ports are the
/// neighbour's id.
pub(crate) const HOST_PORT: PortNo = PortNo(100);

/// Store with the given switches and bidirectional links. The port on `a`
/// towards `b` is `PortNo(b)`.
pub(crate) fn store(switches: &[u64], links: &[(u64, u64)]) -> TopologyStore {
    let mut topo = TopologyStore::new();
    for &s in switches {
        topo.add_switch(sw(s));
    }
    for &(a, b) in links {
        topo.link_up(sw(a), sw(b), PortNo(b as u16), PortNo(a as u16));
        topo.link_up(sw(b), sw(a), PortNo(a as u16), PortNo(b as u16));
    }
    topo
}

pub(crate) fn set_load(topo: &mut TopologyStore, s: u64, kbps: f64) {
    topo.switch_mut(sw(s)).expect("switch exists").throughput_kbps = Some(kbps);
}

pub(crate) fn packet_in(
    src: MacAddr,
    dst: MacAddr,
    dpid: DatapathId,
    in_port: PortNo,
) -> PacketIn {
    PacketIn {
        src,
        dst,
        ether_type: ETH_TYPE_ARP,
        src_ip: None,
        dpid,
        in_port,
        payload: vec![0xde, 0xad],
    }
}
