//! Display numbers for work orders: `WO-{YYMMDD}-{HHMM}-{XXXX}`.

use chrono::{DateTime, Utc};
use rand::Rng;

const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 4;

/// Build a number from the UTC minute and a random base36 suffix.
pub fn generate<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!("WO-{}-{suffix}", now.format("%y%m%d-%H%M"))
}

/// Default generator backed by the thread-local RNG.
pub fn generate_random(now: DateTime<Utc>) -> String {
    generate(now, &mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn number_has_expected_shape() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 59).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let number = generate(now, &mut rng);

        assert!(number.starts_with("WO-240115-0930-"), "{number}");
        let suffix = &number["WO-240115-0930-".len()..];
        assert_eq!(suffix.len(), 4);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn same_seed_same_number() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap();
        let a = generate(now, &mut StdRng::seed_from_u64(7));
        let b = generate(now, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn suffixes_vary() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let numbers: std::collections::HashSet<_> =
            (0..50).map(|_| generate(now, &mut rng)).collect();
        assert!(numbers.len() > 45);
    }
}
