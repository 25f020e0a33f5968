//! Input validation for email addresses, domains, and IP addresses.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Pragmatic email shape check: local@domain.tld with no whitespace.
    /// Recipient addresses are stored verbatim; this only gates obviously
    /// broken input on the on-demand endpoints.
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex");

    /// DNS hostname: dot-separated labels of letters, digits, and hyphens,
    /// not starting or ending with a hyphen, at least two labels.
    static ref DOMAIN_RE: Regex = Regex::new(
        r"^([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}$"
    )
    .expect("valid domain regex");
}

/// Checks whether a string looks like a deliverable email address.
pub fn is_valid_email(input: &str) -> bool {
    input.len() <= 254 && EMAIL_RE.is_match(input)
}

/// Checks whether a string is a well-formed DNS domain name.
pub fn is_valid_domain(input: &str) -> bool {
    input.len() <= 253 && DOMAIN_RE.is_match(input)
}

/// Parses a dotted-quad IPv4 address, returning its octets.
pub fn parse_ipv4(input: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = input.split('.');
    for octet in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || (part.len() > 1 && part.starts_with('0')) {
            return None;
        }
        *octet = part.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}

/// Extracts the domain part of an email address, lowercased.
pub fn email_domain(email: &str) -> Option<String> {
    let (_, domain) = email.rsplit_once('@')?;
    if domain.is_empty() {
        return None;
    }
    Some(domain.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co.uk"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("user@nodot"));
    }

    #[test]
    fn test_valid_domains() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("mail.sub.example.io"));
        assert!(is_valid_domain("xn--bcher-kva.example"));
    }

    #[test]
    fn test_invalid_domains() {
        assert!(!is_valid_domain("example"));
        assert!(!is_valid_domain("-bad.example.com"));
        assert!(!is_valid_domain("exa mple.com"));
        assert!(!is_valid_domain(""));
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("192.168.1.25"), Some([192, 168, 1, 25]));
        assert_eq!(parse_ipv4("0.0.0.0"), Some([0, 0, 0, 0]));
        assert_eq!(parse_ipv4("256.1.1.1"), None);
        assert_eq!(parse_ipv4("1.2.3"), None);
        assert_eq!(parse_ipv4("1.2.3.4.5"), None);
        assert_eq!(parse_ipv4("01.2.3.4"), None);
        assert_eq!(parse_ipv4("a.b.c.d"), None);
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(
            email_domain("User@Example.COM"),
            Some("example.com".to_string())
        );
        assert_eq!(email_domain("no-at"), None);
        assert_eq!(email_domain("user@"), None);
    }
}
