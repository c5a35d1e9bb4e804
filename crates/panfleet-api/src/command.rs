// CLI-to-XML command translation.
//
// Two grammars live here, both closed and both total over what they
// claim to support:
//
// - `TestCommand`: the handful of active-probe commands, parsed into a
//   tagged variant and serialized into the wire XML for `type=test`.
// - `show` translation: `show a b c` becomes nested op XML with a
//   self-closing leaf, with fixed rewrites for the commands whose wire
//   form does not follow the plain nesting rule.
//
// Anything the grammars do not recognize is `Error::UnsupportedCommand`,
// raised before a single byte goes on the wire. No token is ever
// silently dropped.

use crate::error::Error;

/// A recognized test command.
///
/// The supported grammar, one line per variant:
///
/// ```text
/// test vpn ike-sa [gateway <name>]
/// test vpn ipsec-sa [tunnel <name>]
/// test routing fib-lookup virtual-router <vr> ip <address>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCommand {
    /// IKE phase-1 probe, optionally scoped to one gateway.
    IkeSa { gateway: Option<String> },
    /// IPsec phase-2 probe, optionally scoped to one tunnel.
    IpsecSa { tunnel: Option<String> },
    /// Route lookup in the named virtual router.
    FibLookup { virtual_router: String, ip: String },
}

impl TestCommand {
    /// Parse a human CLI test command.
    ///
    /// Fails with [`Error::UnsupportedCommand`] on anything outside the
    /// grammar, including trailing tokens.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let unsupported = || Error::UnsupportedCommand(input.trim().to_owned());

        match tokens.as_slice() {
            ["test", "vpn", "ike-sa"] => Ok(Self::IkeSa { gateway: None }),
            ["test", "vpn", "ike-sa", "gateway", name] => Ok(Self::IkeSa {
                gateway: Some(checked_value(name, input)?),
            }),
            ["test", "vpn", "ipsec-sa"] => Ok(Self::IpsecSa { tunnel: None }),
            ["test", "vpn", "ipsec-sa", "tunnel", name] => Ok(Self::IpsecSa {
                tunnel: Some(checked_value(name, input)?),
            }),
            ["test", "routing", "fib-lookup", "virtual-router", vr, "ip", ip] => {
                Ok(Self::FibLookup {
                    virtual_router: checked_value(vr, input)?,
                    ip: checked_value(ip, input)?,
                })
            }
            _ => Err(unsupported()),
        }
    }

    /// The wire XML for this command.
    pub fn to_xml(&self) -> String {
        match self {
            Self::IkeSa { gateway: None } => "<test><vpn><ike-sa/></vpn></test>".to_owned(),
            Self::IkeSa {
                gateway: Some(name),
            } => {
                format!("<test><vpn><ike-sa><gateway>{name}</gateway></ike-sa></vpn></test>")
            }
            Self::IpsecSa { tunnel: None } => "<test><vpn><ipsec-sa/></vpn></test>".to_owned(),
            Self::IpsecSa { tunnel: Some(name) } => {
                format!("<test><vpn><ipsec-sa><tunnel>{name}</tunnel></ipsec-sa></vpn></test>")
            }
            Self::FibLookup { virtual_router, ip } => format!(
                "<test><routing><fib-lookup><virtual-router>{virtual_router}</virtual-router><ip>{ip}</ip></fib-lookup></routing></test>"
            ),
        }
    }
}

/// Translate a `show ...` CLI command into op XML.
///
/// Fixed rewrites first (commands whose wire form deviates from plain
/// nesting), then the general rule: each token becomes a nesting level
/// and the last token a self-closing leaf.
pub fn translate_show(input: &str) -> Result<String, Error> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "show interface all" => return Ok("<show><interface>all</interface></show>".to_owned()),
        "show arp all" => {
            return Ok("<show><arp><entry name='all'/></arp></show>".to_owned());
        }
        "show vpn ike-sa" | "show vpn ike sa" | "show ike gw" | "show ike gateway" => {
            return Ok("<show><vpn><ike-sa></ike-sa></vpn></show>".to_owned());
        }
        "show vpn ipsec-sa" | "show vpn ipsec sa" | "show ipsec tunnel" | "show ipsec tunnels" => {
            return Ok("<show><vpn><ipsec-sa></ipsec-sa></vpn></show>".to_owned());
        }
        "show routing protocol bgp summary" | "show bgp summary" => {
            return Ok(
                "<show><routing><protocol><bgp><summary></summary></bgp></protocol></routing></show>"
                    .to_owned(),
            );
        }
        _ => {}
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let Some((first, rest)) = tokens.split_first() else {
        return Err(Error::UnsupportedCommand(trimmed.to_owned()));
    };
    if !first.eq_ignore_ascii_case("show") {
        return Err(Error::UnsupportedCommand(trimmed.to_owned()));
    }
    for token in rest {
        if !is_xml_name(token) {
            return Err(Error::UnsupportedCommand(trimmed.to_owned()));
        }
    }
    let Some((leaf, inner)) = rest.split_last() else {
        return Ok("<show/>".to_owned());
    };

    let mut xml = String::from("<show>");
    for token in inner {
        xml.push('<');
        xml.push_str(token);
        xml.push('>');
    }
    xml.push('<');
    xml.push_str(leaf);
    xml.push_str("/>");
    for token in inner.iter().rev() {
        xml.push_str("</");
        xml.push_str(token);
        xml.push('>');
    }
    xml.push_str("</show>");
    Ok(xml)
}

/// Names and addresses embedded in command XML. The grammar is closed:
/// rather than escaping arbitrary input we reject anything that could
/// change the XML structure.
fn checked_value(token: &str, input: &str) -> Result<String, Error> {
    if token.is_empty() || token.chars().any(|c| matches!(c, '<' | '>' | '&' | '\'' | '"')) {
        return Err(Error::UnsupportedCommand(input.trim().to_owned()));
    }
    Ok(token.to_owned())
}

/// A token usable as an XML element name.
fn is_xml_name(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
