//! Setup code checks and the `X-HM://` setup URI
//!
//! Controllers pair by scanning a URI that packs the setup code, the supported
//! transports and the accessory category into a 45-bit value, base-36 encoded
//! and followed by the 4 character setup id.

use core::fmt::Write;

use crate::accessory::AccessoryCategory;
use crate::config::ConfigError;

const URI_SCHEME: &str = "X-HM://";
const PAYLOAD_DIGITS: usize = 9;
const SETUP_ID_LEN: usize = 4;

/// Length of a complete setup URI
pub const SETUP_URI_LEN: usize = URI_SCHEME.len() + PAYLOAD_DIGITS + SETUP_ID_LEN;

pub type SetupUri = heapless::String<SETUP_URI_LEN>;

/// Transport the accessory pairs over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Ip,
    Ble,
}

impl Transport {
    const fn flag(self) -> u64 {
        match self {
            Self::Ip => 2,
            Self::Ble => 4,
        }
    }
}

/// Parse a `DDD-DD-DDD` setup code into its numeric value.
pub fn parse_setup_code(code: &str) -> Result<u32, ConfigError> {
    let bytes = code.as_bytes();
    if bytes.len() != 10 || bytes[3] != b'-' || bytes[6] != b'-' {
        return Err(ConfigError::MalformedSetupCode);
    }

    let mut digits = [0u8; 8];
    let mut count = 0;
    for (i, byte) in bytes.iter().enumerate() {
        if i == 3 || i == 6 {
            continue;
        }
        if !byte.is_ascii_digit() {
            return Err(ConfigError::MalformedSetupCode);
        }
        digits[count] = byte - b'0';
        count += 1;
    }

    // Codes the protocol refuses to accept
    let all_same = digits.iter().all(|d| *d == digits[0]);
    if all_same || digits == [1, 2, 3, 4, 5, 6, 7, 8] || digits == [8, 7, 6, 5, 4, 3, 2, 1] {
        return Err(ConfigError::TrivialSetupCode);
    }

    Ok(digits.iter().fold(0u32, |acc, d| acc * 10 + *d as u32))
}

pub fn validate_setup_id(setup_id: &str) -> Result<(), ConfigError> {
    let valid = setup_id.len() == SETUP_ID_LEN
        && setup_id
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());

    if valid {
        Ok(())
    } else {
        Err(ConfigError::MalformedSetupId)
    }
}

/// Build the setup URI controllers scan to pair with the accessory.
pub fn setup_uri(
    setup_code: &str,
    setup_id: &str,
    category: AccessoryCategory,
    transport: Transport,
) -> Result<SetupUri, ConfigError> {
    let code = parse_setup_code(setup_code)?;
    validate_setup_id(setup_id)?;

    let payload = code as u64 | (transport.flag() << 27) | ((category.code() as u64) << 31);

    let mut encoded = [b'0'; PAYLOAD_DIGITS];
    let mut remaining = payload;
    for slot in encoded.iter_mut().rev() {
        *slot = base36_digit((remaining % 36) as u8);
        remaining /= 36;
    }

    let mut uri = SetupUri::new();
    // Capacity is exactly the scheme, payload and id; the writes cannot overflow
    let _ = uri.push_str(URI_SCHEME);
    for digit in encoded {
        let _ = uri.push(digit as char);
    }
    let _ = write!(uri, "{}", setup_id);

    Ok(uri)
}

const fn base36_digit(value: u8) -> u8 {
    if value < 10 {
        b'0' + value
    } else {
        b'A' + (value - 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setup_code() {
        assert_eq!(parse_setup_code("111-22-333"), Ok(11_122_333));
        assert_eq!(parse_setup_code("031-45-154"), Ok(3_145_154));
    }

    #[test]
    fn test_malformed_setup_codes() {
        for code in ["11122333", "111-22-33", "111_22_333", "11a-22-333", "111-22-3334"] {
            assert_eq!(
                parse_setup_code(code),
                Err(ConfigError::MalformedSetupCode),
                "{code}"
            );
        }
    }

    #[test]
    fn test_trivial_setup_codes() {
        for code in ["000-00-000", "999-99-999", "123-45-678", "876-54-321"] {
            assert_eq!(
                parse_setup_code(code),
                Err(ConfigError::TrivialSetupCode),
                "{code}"
            );
        }
    }

    #[test]
    fn test_setup_id() {
        assert_eq!(validate_setup_id("ES32"), Ok(()));
        assert_eq!(validate_setup_id("es32"), Err(ConfigError::MalformedSetupId));
        assert_eq!(validate_setup_id("ES3"), Err(ConfigError::MalformedSetupId));
        assert_eq!(validate_setup_id("ES-2"), Err(ConfigError::MalformedSetupId));
    }

    #[test]
    fn test_setup_uri_for_ip_sensor() {
        let uri = setup_uri("111-22-333", "ES32", AccessoryCategory::Sensor, Transport::Ip).unwrap();
        assert_eq!(uri.as_str(), "X-HM://009ZS061PES32");
    }

    #[test]
    fn test_setup_uri_encodes_transport_and_category() {
        let ble =
            setup_uri("111-22-333", "ES32", AccessoryCategory::Sensor, Transport::Ble).unwrap();
        assert_eq!(ble.as_str(), "X-HM://00A47TO65ES32");

        let bridge =
            setup_uri("123-44-321", "AB12", AccessoryCategory::Bridge, Transport::Ip).unwrap();
        assert_eq!(bridge.as_str(), "X-HM://0023OA51DAB12");
    }

    #[test]
    fn test_setup_uri_rejects_bad_input() {
        assert_eq!(
            setup_uri("111-11-111", "ES32", AccessoryCategory::Sensor, Transport::Ip),
            Err(ConfigError::TrivialSetupCode)
        );
        assert_eq!(
            setup_uri("111-22-333", "E", AccessoryCategory::Sensor, Transport::Ip),
            Err(ConfigError::MalformedSetupId)
        );
    }
}
