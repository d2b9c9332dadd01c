//! Protocol-number and well-known-port lookup tables shared by both flow
//! parsers (§4.3).

/// IANA protocol numbers the estate actually sees in practice; unlisted
/// numbers fall back to their decimal string.
const PROTOCOL_NAMES: &[(u8, &str)] = &[
    (1, "ICMP"),
    (6, "TCP"),
    (17, "UDP"),
    (47, "GRE"),
    (50, "ESP"),
    (51, "AH"),
    (89, "OSPF"),
    (132, "SCTP"),
];

const PORT_APPS: &[(u16, &str)] = &[
    (80, "HTTP"),
    (443, "HTTPS"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (110, "POP3"),
    (143, "IMAP"),
    (3306, "MySQL"),
    (5432, "PostgreSQL"),
    (6379, "Redis"),
    (161, "SNMP"),
    (162, "SNMP-Trap"),
    (389, "LDAP"),
    (636, "LDAPS"),
    (8080, "HTTP-Alt"),
    (8443, "HTTPS-Alt"),
    (3389, "RDP"),
    (5900, "VNC"),
];

pub fn protocol_name(protocol: u8) -> String {
    PROTOCOL_NAMES
        .iter()
        .find(|(num, _)| *num == protocol)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| protocol.to_string())
}

/// dst-port-first lookup (§4.3): a flow to a well-known server port is
/// named for that port even if the client's ephemeral src_port happens to
/// collide with another entry.
pub fn detect_application(src_port: u16, dst_port: u16, protocol: u8) -> String {
    if protocol == 1 {
        return "ICMP".to_string();
    }
    PORT_APPS
        .iter()
        .find(|(port, _)| *port == dst_port)
        .or_else(|| PORT_APPS.iter().find(|(port, _)| *port == src_port))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("port/{dst_port}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dst_port_wins_over_src_port() {
        assert_eq!(detect_application(443, 80, 6), "HTTP");
    }

    #[test]
    fn unknown_port_falls_back_to_port_label() {
        assert_eq!(detect_application(54321, 59999, 17), "port/59999");
    }

    #[test]
    fn icmp_always_named_icmp_regardless_of_ports() {
        assert_eq!(detect_application(0, 0, 1), "ICMP");
    }

    #[test]
    fn boundary_scenario_https_lookup() {
        assert_eq!(detect_application(443, 54321, 6), "HTTPS");
        assert_eq!(protocol_name(6), "TCP");
    }
}
