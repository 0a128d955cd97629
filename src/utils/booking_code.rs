//! Generación de códigos de reserva legibles
//!
//! Formato: `BK` + `YYYYMMDDHHMMSS` (UTC) + 5 caracteres de `[A-Z0-9]`.

use chrono::{DateTime, Utc};
use rand::Rng;

const PREFIX: &str = "BK";
const SUFFIX_LEN: usize = 5;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Genera un código nuevo a partir del instante de creación
pub fn generate_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!("{}{}{}", PREFIX, now.format("%Y%m%d%H%M%S"), suffix)
}

/// Comprueba que un código tenga el formato esperado
pub fn is_valid_booking_code(code: &str) -> bool {
    let Some(rest) = code.strip_prefix(PREFIX) else {
        return false;
    };
    if rest.len() != 14 + SUFFIX_LEN {
        return false;
    }
    let (stamp, suffix) = rest.split_at(14);
    stamp.bytes().all(|b| b.is_ascii_digit()) && suffix.bytes().all(|b| ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_code_format() {
        let now = Utc.with_ymd_and_hms(2024, 7, 4, 9, 5, 3).unwrap();
        let code = generate_id(now);

        assert_eq!(code.len(), 21);
        assert!(code.starts_with("BK20240704090503"));
        assert!(is_valid_booking_code(&code));
    }

    #[test]
    fn test_codes_differ_within_same_second() {
        let now = Utc::now();
        let codes: std::collections::HashSet<String> =
            (0..50).map(|_| generate_id(now)).collect();
        // 36^5 combinaciones; 50 colisiones seguidas no ocurren en la práctica
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_invalid_codes() {
        assert!(!is_valid_booking_code(""));
        assert!(!is_valid_booking_code("XX20240704090503ABCDE"));
        assert!(!is_valid_booking_code("BK20240704090503abcde"));
        assert!(!is_valid_booking_code("BK2024070409050ABCDE"));
    }
}
