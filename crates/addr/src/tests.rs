use super::*;
use proptest::prelude::*;

// -------------------- parse_ipv4 --------------------

#[test]
fn parses_dotted_quads() {
    assert_eq!(parse_ipv4("0.0.0.0"), Ok(0));
    assert_eq!(parse_ipv4("10.0.0.1"), Ok(0x0A00_0001));
    assert_eq!(parse_ipv4("192.168.1.254"), Ok(0xC0A8_01FE));
    assert_eq!(parse_ipv4("255.255.255.255"), Ok(u32::MAX));
}

#[test]
fn leading_zeros_are_accepted() {
    assert_eq!(parse_ipv4("010.000.000.001"), Ok(0x0A00_0001));
}

#[test]
fn rejects_malformed_addresses() {
    assert_eq!(parse_ipv4(""), Err(AddrError::Empty));
    assert_eq!(parse_ipv4("1.2.3"), Err(AddrError::WrongOctetCount(3)));
    assert_eq!(parse_ipv4("1.2.3.4.5"), Err(AddrError::WrongOctetCount(5)));
    assert_eq!(parse_ipv4("1.2.3.256"), Err(AddrError::OctetOverflow));
    assert_eq!(parse_ipv4("1..3.4"), Err(AddrError::EmptyOctet));
    assert_eq!(parse_ipv4("1.2.3."), Err(AddrError::EmptyOctet));
    assert_eq!(parse_ipv4(".1.2.3"), Err(AddrError::EmptyOctet));
    assert_eq!(parse_ipv4("1.2.3.x"), Err(AddrError::InvalidChar('x')));
    assert_eq!(parse_ipv4(" 1.2.3.4"), Err(AddrError::InvalidChar(' ')));
    assert_eq!(parse_ipv4("-1.2.3.4"), Err(AddrError::InvalidChar('-')));
}

#[test]
fn very_long_octet_does_not_overflow() {
    assert_eq!(
        parse_ipv4("1.2.3.99999999999999999999"),
        Err(AddrError::OctetOverflow)
    );
}

// -------------------- ip_to_u32 sentinel --------------------

#[test]
fn sentinel_variant_returns_zero_on_failure() {
    assert_eq!(ip_to_u32("not an ip"), 0);
    assert_eq!(ip_to_u32("300.1.1.1"), 0);
    // indistinguishable from a real 0.0.0.0
    assert_eq!(ip_to_u32("0.0.0.0"), 0);
    assert_eq!(ip_to_u32("8.8.8.8"), 0x0808_0808);
}

// -------------------- formatting / key split --------------------

#[test]
fn formats_addresses() {
    assert_eq!(u32_to_ip(0), "0.0.0.0");
    assert_eq!(u32_to_ip(0xC0A8_0101), "192.168.1.1");
    assert_eq!(u32_to_ip(u32::MAX), "255.255.255.255");
}

#[test]
fn block_and_slot_split() {
    let a = parse_ipv4("192.168.7.42").unwrap();
    assert_eq!(block_id(a), 0x00C0_A807);
    assert_eq!(slot(a), 42);
    assert_eq!(join(block_id(a), slot(a)), a);
}

// -------------------- bogons --------------------

#[test]
fn classifies_bogons() {
    for bogon in [
        "0.1.2.3",
        "10.20.30.40",
        "100.64.0.1",
        "127.0.0.1",
        "169.254.10.10",
        "172.16.0.1",
        "172.31.255.255",
        "192.0.2.5",
        "192.168.1.1",
        "198.18.0.1",
        "198.19.255.255",
        "203.0.113.9",
        "224.0.0.1",
        "239.255.255.250",
        "240.0.0.1",
        "255.255.255.255",
    ] {
        assert!(is_bogon(ip_to_u32(bogon)), "{bogon} should be a bogon");
    }
}

#[test]
fn routable_addresses_are_not_bogons() {
    for ok in [
        "1.1.1.1",
        "8.8.8.8",
        "100.63.255.255",
        "100.128.0.0",
        "172.15.255.255",
        "172.32.0.0",
        "198.17.255.255",
        "198.20.0.0",
        "223.255.255.255",
    ] {
        assert!(!is_bogon(ip_to_u32(ok)), "{ok} should be routable");
    }
}

// -------------------- properties --------------------

proptest! {
    #[test]
    fn text_round_trip(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255) {
        let text = format!("{a}.{b}.{c}.{d}");
        prop_assert_eq!(u32_to_ip(ip_to_u32(&text)), text);
    }

    #[test]
    fn numeric_round_trip(addr in any::<u32>()) {
        prop_assert_eq!(parse_ipv4(&u32_to_ip(addr)), Ok(addr));
    }
}
