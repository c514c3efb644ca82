//! 主机位置表
//!
//! 主机地址 -> (接入交换机, 接入端口)。首次看到某个源地址时记录，之后一直以它为准，
//! 没有老化也没有迁移处理。

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::net::{DatapathId, MacAddr, PortNo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub dpid: DatapathId,
    pub port: PortNo,
}

#[derive(Debug, Default, Clone)]
pub struct HostTable {
    hosts: BTreeMap<MacAddr, Attachment>,
    /// MAC -> IPv4，只用于日志
    ips: BTreeMap<MacAddr, Ipv4Addr>,
}

impl HostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, mac: MacAddr) -> Option<Attachment> {
        self.hosts.get(&mac).copied()
    }

    pub fn contains(&self, mac: MacAddr) -> bool {
        self.hosts.contains_key(&mac)
    }

    /// 记录主机接入位置，覆盖旧值。
    pub fn learn(&mut self, mac: MacAddr, dpid: DatapathId, port: PortNo) -> Option<Attachment> {
        self.hosts.insert(mac, Attachment { dpid, port })
    }

    pub fn learn_ip(&mut self, mac: MacAddr, ip: Ipv4Addr) {
        self.ips.insert(mac, ip);
    }

    pub fn ip(&self, mac: MacAddr) -> Option<Ipv4Addr> {
        self.ips.get(&mac).copied()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
