// # Netlink IP Source
//
// This crate provides the interface address source for gandi-ddns on Linux.
//
// ## Implementation
//
// 1. Resolve the interface name to an index (`if_nametoindex`)
// 2. Dump IPv4 addresses with an RTM_GETADDR request over `netlink-sys`
// 3. Parse replies with `netlink-packet-route`
// 4. Return the first address bound to the interface
//
// The socket is synchronous; the dump runs on the blocking pool so the
// runtime is never stalled.
//
// ## Platform Support
//
// Netlink is Linux-specific. On other platforms the source compiles but
// every lookup fails with a configuration error.

use gandi_ddns_core::traits::{IpSource, IpVersion};
use gandi_ddns_core::{Error, Result};
use std::net::IpAddr;

/// Interface address source backed by rtnetlink
#[derive(Debug, Clone)]
pub struct NetlinkIpSource {
    interface: String,
}

impl NetlinkIpSource {
    /// Create a source for the named interface (e.g. "eth0", "ppp0")
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    /// Interface being queried
    pub fn interface(&self) -> &str {
        &self.interface
    }
}

#[cfg(target_os = "linux")]
#[async_trait::async_trait]
impl IpSource for NetlinkIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let interface = self.interface.clone();
        let ip = tokio::task::spawn_blocking(move || linux::interface_ipv4(&interface))
            .await
            .map_err(|e| Error::ip_source(format!("netlink lookup task failed: {}", e)))??;

        tracing::debug!("Interface {} has address {}", self.interface, ip);
        Ok(IpAddr::V4(ip))
    }

    fn source_name(&self) -> &'static str {
        "netlink"
    }

    fn version(&self) -> Option<IpVersion> {
        Some(IpVersion::V4)
    }
}

#[cfg(not(target_os = "linux"))]
#[async_trait::async_trait]
impl IpSource for NetlinkIpSource {
    async fn current(&self) -> Result<IpAddr> {
        Err(Error::config(format!(
            "Netlink IP source is only supported on Linux (interface {})",
            self.interface
        )))
    }

    fn source_name(&self) -> &'static str {
        "netlink"
    }

    fn version(&self) -> Option<IpVersion> {
        Some(IpVersion::V4)
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use gandi_ddns_core::{Error, Result};
    use netlink_packet_core::{
        NLM_F_DUMP, NLM_F_REQUEST, NetlinkHeader, NetlinkMessage, NetlinkPayload,
    };
    use netlink_packet_route::address::nlas::Nla;
    use netlink_packet_route::{AddressMessage, RtnlMessage};
    use netlink_sys::{Socket, SocketAddr, protocols::NETLINK_ROUTE};
    use std::ffi::CString;
    use std::net::Ipv4Addr;

    /// Receive buffer size; a dump is delivered over several reads if needed
    const RECV_BUFFER_SIZE: usize = 8192;

    /// Kernel index of a named interface
    pub(crate) fn interface_index(name: &str) -> Result<u32> {
        let c_name = CString::new(name)
            .map_err(|_| Error::invalid_input(format!("interface name contains NUL: {:?}", name)))?;

        // SAFETY: c_name is a valid NUL-terminated string for the duration of the call
        let index = unsafe { libc::if_nametoindex(c_name.as_ptr()) };
        if index == 0 {
            return Err(Error::interface_not_found(name));
        }

        Ok(index)
    }

    /// First IPv4 address bound to the interface
    pub(crate) fn interface_ipv4(name: &str) -> Result<Ipv4Addr> {
        let index = interface_index(name)?;
        let messages = dump_ipv4_addresses()?;

        select_ipv4(&messages, index).ok_or_else(|| Error::interface_not_found(name))
    }

    /// Pick the address for `index` out of an RTM_GETADDR dump
    ///
    /// `IFA_LOCAL` is preferred over `IFA_ADDRESS`: on point-to-point links
    /// the latter is the peer's address.
    pub(crate) fn select_ipv4(messages: &[AddressMessage], index: u32) -> Option<Ipv4Addr> {
        messages
            .iter()
            .filter(|m| m.header.family == libc::AF_INET as u8 && m.header.index == index)
            .find_map(|m| {
                let local = m.nlas.iter().find_map(|nla| match nla {
                    Nla::Local(bytes) => ipv4_from_bytes(bytes),
                    _ => None,
                });
                local.or_else(|| {
                    m.nlas.iter().find_map(|nla| match nla {
                        Nla::Address(bytes) => ipv4_from_bytes(bytes),
                        _ => None,
                    })
                })
            })
    }

    fn ipv4_from_bytes(bytes: &[u8]) -> Option<Ipv4Addr> {
        let octets: [u8; 4] = bytes.try_into().ok()?;
        Some(Ipv4Addr::from(octets))
    }

    /// Run one RTM_GETADDR dump for AF_INET
    fn dump_ipv4_addresses() -> Result<Vec<AddressMessage>> {
        let mut socket = Socket::new(NETLINK_ROUTE)?;
        socket.bind_auto()?;
        socket.connect(&SocketAddr::new(0, 0))?;

        let mut request = AddressMessage::default();
        request.header.family = libc::AF_INET as u8;

        let mut header = NetlinkHeader::default();
        header.flags = NLM_F_DUMP | NLM_F_REQUEST;

        let mut packet = NetlinkMessage::new(
            header,
            NetlinkPayload::InnerMessage(RtnlMessage::GetAddress(request)),
        );
        packet.finalize();

        let mut send_buffer = vec![0; packet.header.length as usize];
        packet.serialize(&mut send_buffer[..]);
        socket.send(&send_buffer[..], 0)?;

        let mut messages = Vec::new();
        let mut receive_buffer = vec![0; RECV_BUFFER_SIZE];

        loop {
            let size = socket.recv(&mut &mut receive_buffer[..], 0)?;
            let mut offset = 0;

            while offset < size {
                let bytes = &receive_buffer[offset..size];
                let reply: NetlinkMessage<RtnlMessage> = NetlinkMessage::deserialize(bytes)
                    .map_err(|e| Error::ip_source(format!("malformed netlink reply: {}", e)))?;

                let length = reply.header.length as usize;
                match reply.payload {
                    NetlinkPayload::Done(_) => return Ok(messages),
                    NetlinkPayload::Error(e) => {
                        return Err(Error::ip_source(format!("netlink error: {:?}", e)));
                    }
                    NetlinkPayload::InnerMessage(RtnlMessage::NewAddress(message)) => {
                        messages.push(message);
                    }
                    _ => {}
                }

                if length == 0 {
                    break;
                }
                offset += length;
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn address_message(family: i32, index: u32, nlas: Vec<Nla>) -> AddressMessage {
            let mut message = AddressMessage::default();
            message.header.family = family as u8;
            message.header.index = index;
            message.nlas = nlas;
            message
        }

        #[test]
        fn test_select_matching_interface() {
            let messages = vec![
                address_message(libc::AF_INET, 1, vec![Nla::Address(vec![127, 0, 0, 1])]),
                address_message(libc::AF_INET, 2, vec![Nla::Address(vec![192, 0, 2, 10])]),
            ];

            assert_eq!(select_ipv4(&messages, 2), Some(Ipv4Addr::new(192, 0, 2, 10)));
            assert_eq!(select_ipv4(&messages, 3), None);
        }

        #[test]
        fn test_local_preferred_over_peer_address() {
            let messages = vec![address_message(
                libc::AF_INET,
                4,
                vec![
                    Nla::Address(vec![10, 64, 64, 64]),
                    Nla::Local(vec![100, 64, 1, 2]),
                ],
            )];

            assert_eq!(select_ipv4(&messages, 4), Some(Ipv4Addr::new(100, 64, 1, 2)));
        }

        #[test]
        fn test_other_families_ignored() {
            let messages = vec![address_message(
                libc::AF_INET6,
                2,
                vec![Nla::Address(vec![0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1])],
            )];

            assert_eq!(select_ipv4(&messages, 2), None);
        }

        #[test]
        fn test_missing_interface() {
            assert!(matches!(
                interface_index("gddns-missing0"),
                Err(Error::InterfaceNotFound(_))
            ));
        }

        #[test]
        fn test_nul_in_interface_name() {
            assert!(matches!(
                interface_index("eth\0"),
                Err(Error::InvalidInput(_))
            ));
        }
    }
}
