use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// ASCII-ordered, so lexicographic order of ids follows generation order.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_LEN: usize = 8;
const RANDOM_LEN: usize = 12;

/// Generates chronologically ordered 20 character keys for `push` writes.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    last_ms: u64,
    last_random: [u8; RANDOM_LEN],
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&mut self) -> String {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.generate_at(now_ms)
    }

    /// Clock skew backwards is treated as "same millisecond" so ids never go down.
    pub fn generate_at(&mut self, now_ms: u64) -> String {
        if now_ms > self.last_ms {
            self.last_ms = now_ms;
            let mut rng = rand::rng();
            for slot in self.last_random.iter_mut() {
                *slot = rng.random_range(0..64);
            }
        } else {
            self.increment_random();
        }

        let mut id = String::with_capacity(TIME_LEN + RANDOM_LEN);
        let mut time_chars = [0u8; TIME_LEN];
        let mut ts = self.last_ms;
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(ts % 64) as usize];
            ts /= 64;
        }
        id.extend(time_chars.iter().map(|&c| c as char));
        id.extend(self.last_random.iter().map(|&i| PUSH_CHARS[i as usize] as char));
        id
    }

    fn increment_random(&mut self) {
        for slot in self.last_random.iter_mut().rev() {
            if *slot == 63 {
                *slot = 0;
            } else {
                *slot += 1;
                return;
            }
        }
        // all 12 digits wrapped: borrow a millisecond so ordering still holds
        self.last_ms += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_fixed_length_and_alphabet() {
        let mut generator = PushIdGenerator::new();
        let id = generator.generate();
        assert_eq!(id.len(), TIME_LEN + RANDOM_LEN);
        assert!(id.bytes().all(|b| PUSH_CHARS.contains(&b)));
    }

    #[test]
    fn ids_increase_within_the_same_millisecond() {
        let mut generator = PushIdGenerator::new();
        let mut previous = generator.generate_at(1_700_000_000_000);
        for _ in 0..500 {
            let next = generator.generate_at(1_700_000_000_000);
            assert!(next > previous, "{next} should sort after {previous}");
            previous = next;
        }
    }

    #[test]
    fn ids_increase_across_milliseconds_and_clock_skew() {
        let mut generator = PushIdGenerator::new();
        let a = generator.generate_at(1_000);
        let b = generator.generate_at(2_000);
        let c = generator.generate_at(1_500);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn wrapped_random_part_borrows_a_millisecond() {
        let mut generator = PushIdGenerator::new();
        let first = generator.generate_at(10);
        generator.last_random = [63; RANDOM_LEN];
        let wrapped = generator.generate_at(10);
        assert_eq!(generator.last_ms, 11);
        assert!(wrapped > first);
    }

    #[test]
    fn time_prefix_encodes_milliseconds() {
        let mut generator = PushIdGenerator::new();
        let id = generator.generate_at(2 * 64 + 3);
        assert_eq!(&id[..TIME_LEN], "------12");
    }
}
