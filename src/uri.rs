//! Deterministic `otpauth://` URI construction per the Google
//! Authenticator key-URI format:
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//!
//! Colons are stripped from issuer and account before substitution (a
//! colon is the label separator, so one inside either field would corrupt
//! the URI), and the label is percent-encoded, separator included. All
//! five query parameters are always emitted, in a fixed order, so the
//! same `TotpData` always produces byte-identical output.

use crate::types::TotpData;

/// Build the provisioning URI for a `TotpData` record.
pub fn build_otpauth_uri(data: &TotpData) -> String {
    let issuer = data.issuer.replace(':', "");
    let account = data.account_name.replace(':', "");

    let label = if issuer.is_empty() {
        percent_encode(&account)
    } else {
        percent_encode(&format!("{}:{}", issuer, account))
    };

    format!(
        "otpauth://totp/{}?secret={}&issuer={}&algorithm={}&digits={}&period={}",
        label,
        data.secret,
        percent_encode(&issuer),
        data.algorithm.uri_name(),
        data.digits,
        data.period,
    )
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn percent_encode(s: &str) -> String {
    let mut output = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                output.push(byte as char);
            }
            _ => output.push_str(&format!("%{:02X}", byte)),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Algorithm;

    #[test]
    fn basic_uri_shape() {
        let data = TotpData::new("JBSWY3DPEHPK3PXP", "Example", "alice");
        let uri = data.otpauth_uri();
        assert_eq!(
            uri,
            "otpauth://totp/Example%3Aalice?secret=JBSWY3DPEHPK3PXP&issuer=Example&algorithm=SHA1&digits=6&period=30"
        );
    }

    #[test]
    fn all_parameters_always_present() {
        let uri = TotpData::new("ABCDEF", "Acme", "bob").otpauth_uri();
        for param in ["secret=", "issuer=", "algorithm=", "digits=", "period="] {
            assert!(uri.contains(param), "missing {}", param);
        }
    }

    #[test]
    fn non_default_parameters_are_reflected() {
        let uri = TotpData::new("ABCDEF", "Acme", "bob")
            .with_algorithm(Algorithm::Sha512)
            .with_digits(8)
            .with_period(60)
            .otpauth_uri();
        assert!(uri.contains("algorithm=SHA512"));
        assert!(uri.contains("digits=8"));
        assert!(uri.contains("period=60"));
    }

    #[test]
    fn colons_are_stripped_from_issuer_and_account() {
        let uri = TotpData::new("ABCDEF", "Test:App", "a:b").otpauth_uri();
        assert!(uri.contains("issuer=TestApp"));
        assert!(uri.contains("TestApp%3Aab?"));
        // No raw colon anywhere past the scheme and type.
        let rest = &uri["otpauth://totp/".len()..];
        assert!(!rest.contains(':'), "unexpected colon in {}", rest);
    }

    #[test]
    fn account_only_label_when_issuer_empty() {
        let uri = TotpData::new("ABCDEF", "", "alice@example.com").otpauth_uri();
        assert!(uri.starts_with("otpauth://totp/alice%40example.com?"));
        assert!(uri.contains("issuer=&"));
    }

    #[test]
    fn label_characters_are_percent_encoded() {
        let uri = TotpData::new("ABCDEF", "My Corp", "user name").otpauth_uri();
        assert!(uri.contains("My%20Corp%3Auser%20name"));
        assert!(uri.contains("issuer=My%20Corp"));
    }

    #[test]
    fn uri_is_deterministic() {
        let data = TotpData::new("JBSWY3DPEHPK3PXP", "Example", "alice");
        assert_eq!(data.otpauth_uri(), data.otpauth_uri());
    }
}
