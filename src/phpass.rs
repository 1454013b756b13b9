//! Portable phpass password hashing implementation.
//!
//! This module implements the portable ("$P$") variant of Solar Designer's
//! phpass scheme, as deployed by WordPress and phpBB. The format is:
//! `$P$` + 1 cost character + 8 salt characters + 22 digest characters,
//! 34 characters total.
//!
//! # Algorithm Source
//!
//! The construction follows the reference phpass `crypt_private()`:
//!
//! - http://www.openwall.com/phpass/
//! - https://github.com/WordPress/WordPress/blob/master/wp-includes/class-phpass.php
//!
//! The cost character encodes an iteration exponent via its position in the
//! itoa64 alphabet; the digest loop runs `2^exponent` MD5 rounds of
//! `MD5(digest || password)` seeded with `MD5(salt || password)`.
//!
//! # Security Warning
//!
//! MD5 is cryptographically broken. This implementation is provided for
//! compatibility with existing phpass password databases only. Do not use
//! phpass for new password hashes - use bcrypt instead.

use crate::encode::{encode64, ITOA64};
use crate::entropy::FallbackRng;
use crate::error::{Error, Result};
use md5::{Digest, Md5};
use std::sync::Mutex;
use subtle::ConstantTimeEq;

/// Portable phpass hash prefix
pub const PORTABLE_PREFIX: &str = "$P$";

/// Length of the setting prefix (marker + cost char + salt) in characters
pub const SETTING_LEN: usize = 12;

/// Length of a complete portable hash in characters
pub const HASH_LEN: usize = 34;

/// Salt length in encoded characters (derived from 6 raw bytes)
pub const SALT_LEN: usize = 8;

/// Number of raw random bytes behind an encoded salt
const SALT_RAW_LEN: usize = 6;

/// Valid range for the decoded iteration exponent
const MIN_COST_LOG2: usize = 7;
const MAX_COST_LOG2: usize = 30;

/// A phpass hasher.
///
/// Holds the configured cost exponent, the portability flag, and the
/// entropy fallback state. A single instance can be shared across threads;
/// the fallback state is lock-protected so concurrent salt generation stays
/// well-formed even when the OS random source is down.
pub struct PasswordHash {
    iteration_count_log2: usize,
    portable: bool,
    fallback: Mutex<FallbackRng>,
}

impl PasswordHash {
    /// Create a hasher with the given cost exponent.
    ///
    /// The exponent is clamped to `[7, 30]`. Note that the encoded cost
    /// character carries `min(exponent + 5, 30)`, so exponents at the top of
    /// the range collapse onto the same character and the same work factor.
    ///
    /// Only `portable = true` is supported; a non-portable hasher refuses to
    /// hash.
    pub fn new(cost_log2: u32, portable: bool) -> Self {
        Self {
            iteration_count_log2: (cost_log2 as usize).clamp(MIN_COST_LOG2, MAX_COST_LOG2),
            portable,
            fallback: Mutex::new(FallbackRng::new()),
        }
    }

    /// Obtain `count` random bytes for salt generation.
    ///
    /// Never fails: if the OS source errors out, bytes come from the
    /// (insecure) MD5-chain fallback.
    fn get_random_bytes(&self, count: usize) -> Vec<u8> {
        let mut buf = vec![0u8; count];
        if getrandom::fill(&mut buf).is_err() {
            let mut rng = match self.fallback.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            rng.fill(&mut buf);
        }
        buf
    }

    /// Build a 12-character setting string from 6 raw salt bytes.
    fn gensalt_private(&self, input: &[u8]) -> String {
        let mut output = String::with_capacity(SETTING_LEN);
        output.push_str(PORTABLE_PREFIX);
        output.push(ITOA64[usize::min(self.iteration_count_log2 + 5, MAX_COST_LOG2)] as char);
        output.push_str(&encode64(input, SALT_RAW_LEN));
        output
    }

    /// Run the iterative digest loop for `password` under `setting`.
    ///
    /// Returns the 34-character hash, or a 2-character sentinel (`*0`, or
    /// `*1` when the setting itself starts with `*0`) when the setting is
    /// malformed. The sentinel can never equal a legitimate hash, which
    /// always starts with `$`.
    fn crypt_private(&self, password: &str, setting: &str) -> String {
        let mut output = "*0";
        if setting.starts_with(output) {
            output = "*1";
        }

        if !setting.starts_with(PORTABLE_PREFIX) {
            return output.to_string();
        }

        // The 4th character's alphabet index is the iteration exponent.
        let count_log2 = match setting
            .as_bytes()
            .get(3)
            .and_then(|c| ITOA64.iter().position(|&a| a == *c))
        {
            Some(n) if (MIN_COST_LOG2..=MAX_COST_LOG2).contains(&n) => n,
            _ => return output.to_string(),
        };
        let count = 1u32 << count_log2;

        // Salt is the 8 bytes at offset 4. Anything shorter, or a setting
        // sliced mid-UTF-8, is malformed.
        let salt = match setting.as_bytes().get(4..SETTING_LEN) {
            Some(salt) if salt.len() == SALT_LEN => salt,
            _ => return output.to_string(),
        };

        let mut hasher = Md5::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        let mut hash = hasher.finalize();

        for _ in 0..count {
            let mut hasher = Md5::new();
            hasher.update(&hash);
            hasher.update(password.as_bytes());
            hash = hasher.finalize();
        }

        let mut result = String::with_capacity(HASH_LEN);
        match setting.get(..SETTING_LEN) {
            Some(prefix) => result.push_str(prefix),
            None => return output.to_string(),
        }
        result.push_str(&encode64(&hash, 16));
        result
    }

    /// Hash a password, generating a fresh random salt.
    ///
    /// Returns the 34-character `$P$` hash. The only failure modes are a
    /// hasher constructed with `portable = false` and the internal length
    /// consistency check, which cannot trip under correct arithmetic.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        if !self.portable {
            return Err(Error::NotPortable);
        }

        let random = self.get_random_bytes(SALT_RAW_LEN);
        let setting = self.gensalt_private(&random);
        let hash = self.crypt_private(password, &setting);

        if hash.len() == HASH_LEN {
            Ok(hash)
        } else {
            Err(Error::BadHashLength(hash.len()))
        }
    }

    /// Verify a password against a stored phpass hash.
    ///
    /// Recomputes the digest with the stored hash as the setting and
    /// compares in constant time. Malformed stored hashes resolve to
    /// `false`, never an error: the digest engine funnels them into a
    /// sentinel, and a sentinel never equals a stored hash.
    pub fn check_password(&self, password: &str, stored_hash: &str) -> bool {
        let computed = self.crypt_private(password, stored_hash);
        computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHash {
        PasswordHash::new(8, true)
    }

    // Reference vector published with the original phpass test suite.
    // Cost character '9' sits at alphabet index 11, so 2^11 rounds.
    #[test]
    fn test_crypt_reference_vector() {
        let stored = "$P$9IQRaTwmfeRo7ud9Fh4E2PdI0S3r.L0";
        assert_eq!(hasher().crypt_private("test12345", stored), stored);
    }

    #[test]
    fn test_crypt_fixed_salt_vector() {
        // Setting built by a cost-8 hasher with salt "usesomes":
        // cost character itoa64[min(8+5, 30)] = 'B', 2^13 rounds.
        let h = hasher();
        assert!(h.gensalt_private(b"abcdef").starts_with("$P$B"));
        assert_eq!(
            h.crypt_private("test12345", "$P$Busesomes"),
            "$P$BusesomesoslU5fU0.7vtw2euSyzVL1"
        );
    }

    #[test]
    fn test_crypt_is_deterministic() {
        let h = hasher();
        let a = h.crypt_private("secret", "$P$Babcdefgh");
        let b = h.crypt_private("secret", "$P$Babcdefgh");
        assert_eq!(a, b);
        assert_eq!(a, "$P$BabcdefghhoF/sggXNwaIB66V9Zcjt.");
    }

    #[test]
    fn test_crypt_sentinels() {
        let h = hasher();
        assert_eq!(h.crypt_private("pw", "not-a-hash"), "*0");
        assert_eq!(h.crypt_private("pw", ""), "*0");
        assert_eq!(h.crypt_private("pw", "$P"), "*0");
        // Setting that already equals the primary sentinel flips to "*1"
        assert_eq!(h.crypt_private("pw", "*0"), "*1");
        assert_eq!(h.crypt_private("pw", "*0garbage"), "*1");
    }

    #[test]
    fn test_crypt_rejects_cost_out_of_range() {
        let h = hasher();
        // '4' is alphabet index 6, below the minimum of 7
        assert_eq!(h.crypt_private("pw", "$P$4saltsalt"), "*0");
        // 'z' is alphabet index 63, above the maximum of 30
        assert_eq!(h.crypt_private("pw", "$P$zsaltsalt"), "*0");
        // not in the alphabet at all
        assert_eq!(h.crypt_private("pw", "$P$$saltsalt"), "*0");
    }

    #[test]
    fn test_crypt_rejects_short_salt() {
        assert_eq!(hasher().crypt_private("pw", "$P$Bshort"), "*0");
    }

    #[test]
    fn test_hash_round_trip() {
        let h = hasher();
        let hash = h.hash_password("test12345").unwrap();
        assert!(h.check_password("test12345", &hash));
        assert!(!h.check_password("test12346", &hash));
    }

    #[test]
    fn test_hash_format() {
        let hash = hasher().hash_password("anything at all").unwrap();
        assert_eq!(hash.len(), HASH_LEN);
        assert!(hash.starts_with(PORTABLE_PREFIX));
        assert!(hash.bytes().skip(3).all(|b| ITOA64.contains(&b)));
    }

    #[test]
    fn test_fresh_salt_per_hash() {
        let h = hasher();
        let a = h.hash_password("same password").unwrap();
        let b = h.hash_password("same password").unwrap();
        assert_ne!(a, b);
        // but both verify
        assert!(h.check_password("same password", &a));
        assert!(h.check_password("same password", &b));
    }

    #[test]
    fn test_cost_character_clamps() {
        // 40 and 25 both encode alphabet index 30 = 'S'
        let high = PasswordHash::new(40, true).gensalt_private(b"abcdef");
        let capped = PasswordHash::new(25, true).gensalt_private(b"abcdef");
        assert_eq!(high, capped);
        assert_eq!(high.as_bytes()[3], b'S');
    }

    #[test]
    fn test_check_password_malformed_hash() {
        let h = hasher();
        assert!(!h.check_password("x", "not-a-hash"));
        assert!(!h.check_password("x", ""));
        assert!(!h.check_password("x", "*0"));
        assert!(!h.check_password("x", "*1"));
        // multi-byte characters must not panic the byte slicing
        assert!(!h.check_password("x", "$P$B日本語のソルト文字列"));
    }

    #[test]
    fn test_non_portable_refuses() {
        let h = PasswordHash::new(8, false);
        assert!(matches!(h.hash_password("pw"), Err(Error::NotPortable)));
    }

    #[test]
    fn test_empty_password() {
        let h = hasher();
        let hash = h.hash_password("").unwrap();
        assert!(h.check_password("", &hash));
        assert!(!h.check_password(" ", &hash));
    }
}
