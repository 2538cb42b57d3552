//! The `bcrypt` password hash and the OpenSSH `bcrypt_pbkdf`
//!
//! Records use the `$2a$` / `$2b$` format:
//!
//! ```text
//! $2b$RR$<22 char salt><31 char hash>
//! ```
//!
//! with bcrypt's own base64 alphabet (`./A-Za-z0-9`, no padding).

use blowfish::Blowfish;
use zeroize::Zeroize;
use crate::error::Error;
use crate::mac::hmac::algo::{Hash, Sha512};
use crate::ct;
use core::fmt;

/// The raw salt length.
pub const SALT_SIZE: usize = 16;

/// The stored hash length, the last byte of the 192 bit output is dropped.
pub const HASH_SIZE: usize = 23;

/// The smallest accepted log2 cost.
pub const MIN_ROUNDS: u32 = 4;

/// The largest accepted log2 cost.
pub const MAX_ROUNDS: u32 = 31;

/// The longest output `pbkdf` produces.
pub const MAX_PBKDF_SIZE: usize = 32 * 32;

/// The length of an encoded record.
pub const RECORD_SIZE: usize = 60;

const SALT64_SIZE: usize = 22;
const HASH64_SIZE: usize = 31;

const CIPHERTEXT192: &[u8; 24] = b"OrpheanBeholderScryDoubt";
const CIPHERTEXT256: &[u8; 32] = b"OxychromaticBlowfishSwatDynamite";

const CHARSET: &[u8; 64] = b"./ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const TABLE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let mut i = 0;
    while i < CHARSET.len() {
        table[CHARSET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// The record minor version.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Minor {
    /// `$2a$`, the key length wraps at 256 bytes.
    A,
    /// `$2b$`, the key is capped at 72 bytes.
    B
}

impl Minor {
    /// The version letter, `'a'` or `'b'`.
    pub const fn as_char(self) -> char {
        match self {
            Self::A => 'a',
            Self::B => 'b'
        }
    }
}

impl TryFrom<u8> for Minor {
    type Error = Error;

    /// # Errors
    ///
    /// `InvalidEncoding` for anything but `b'a'` and `b'b'`.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'a' => Ok(Self::A),
            b'b' => Ok(Self::B),
            _ => bail!(InvalidEncoding, minor = value, "unknown bcrypt minor")
        }
    }
}

impl fmt::Display for Minor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("2{}", self.as_char()))
    }
}

/// The expensive key schedule, `2^rounds` alternating expansions of `key` and `salt`.
fn eks(key: &[u8], salt: &[u8], rounds: u32, salt_first: bool) -> Blowfish {
    debug_assert!(!key.is_empty() && !salt.is_empty());

    let mut state: Blowfish = Blowfish::bc_init_state();
    state.salted_expand_key(salt, key);

    for _ in 0..(1u64 << rounds) {
        if salt_first {
            state.bc_expand_key(salt);
            state.bc_expand_key(key);
        } else {
            state.bc_expand_key(key);
            state.bc_expand_key(salt);
        }
    }

    state
}

/// Encrypts the magic text 64 times, returning its big endian words.
fn encrypt_text<const W: usize>(state: &Blowfish, text: &[u8]) -> [u32; W] {
    let mut cdata = [0u32; W];
    for (word, bytes) in cdata.iter_mut().zip(text.chunks_exact(4)) {
        *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }

    for _ in 0..64 {
        for pair in cdata.chunks_exact_mut(2) {
            let [l, r] = state.bc_encrypt([pair[0], pair[1]]);
            pair[0] = l;
            pair[1] = r;
        }
    }

    cdata
}

#[inline]
fn check_inputs(pass: &[u8], salt: &[u8]) -> Result<(), Error> {
    ensure!(
        !pass.is_empty() && !salt.is_empty(),
        InvalidParameters, pass_len = pass.len(), salt_len = salt.len(),
        "bcrypt needs a non-empty key and salt"
    );
    Ok(())
}

/// The 192 bit `bcrypt` core, `rounds` is clamped to `4..=31`.
///
/// # Errors
///
/// `InvalidParameters` if `pass` or `salt` is empty.
pub fn hash192(pass: &[u8], salt: &[u8], rounds: u32) -> Result<[u8; 24], Error> {
    check_inputs(pass, salt)?;

    let state = eks(pass, salt, rounds.clamp(MIN_ROUNDS, MAX_ROUNDS), false);
    let mut cdata = encrypt_text::<6>(&state, CIPHERTEXT192);

    let mut out = [0u8; 24];
    for (chunk, word) in out.chunks_exact_mut(4).zip(cdata.iter()) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }

    cdata.zeroize();
    Ok(out)
}

fn hash256_unchecked(pass: &[u8], salt: &[u8], rounds: u32) -> [u8; 32] {
    let state = eks(pass, salt, rounds.clamp(MIN_ROUNDS, MAX_ROUNDS), true);
    let mut cdata = encrypt_text::<8>(&state, CIPHERTEXT256);

    let mut out = [0u8; 32];
    for (chunk, word) in out.chunks_exact_mut(4).zip(cdata.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }

    cdata.zeroize();
    out
}

/// The 256 bit variant used by `bcrypt_pbkdf`, the salt is expanded before the key and the
/// words are written little endian.
///
/// # Errors
///
/// `InvalidParameters` if `pass` or `salt` is empty.
pub fn hash256(pass: &[u8], salt: &[u8], rounds: u32) -> Result<[u8; 32], Error> {
    check_inputs(pass, salt)?;
    Ok(hash256_unchecked(pass, salt, rounds))
}

/// OpenSSH's `bcrypt_pbkdf`.
///
/// # Errors
///
/// `InvalidParameters` if `rounds` is zero, `pass` or `salt` is empty, `salt` is longer than
/// `2^20` bytes, or `out` is empty or longer than [`MAX_PBKDF_SIZE`].
pub fn pbkdf(pass: &[u8], salt: &[u8], rounds: u32, out: &mut [u8]) -> Result<(), Error> {
    ensure!(
        rounds != 0
            && !pass.is_empty()
            && !salt.is_empty()
            && salt.len() <= 1 << 20
            && !out.is_empty()
            && out.len() <= MAX_PBKDF_SIZE,
        InvalidParameters, rounds, out_len = out.len(), "bcrypt_pbkdf parameters"
    );

    let size = out.len();
    let stride = size.div_ceil(32);
    let mut amt = size.div_ceil(stride);

    let mut sha2pass = Sha512::hash(&[pass]);
    let mut remaining = size;
    let mut count = 1usize;

    while remaining > 0 {
        let mut sha2salt = Sha512::hash(&[salt, (count as u32).to_be_bytes().as_slice()]);
        let mut tmp = hash256_unchecked(&sha2pass, &sha2salt, 6);
        let mut block = tmp;

        for _ in 1..rounds {
            sha2salt = Sha512::hash(&[tmp.as_slice()]);
            tmp = hash256_unchecked(&sha2pass, &sha2salt, 6);

            for (b, t) in block.iter_mut().zip(tmp.iter()) {
                *b ^= *t;
            }
        }

        // output bytes are interleaved, byte i of this block lands at i * stride + count - 1
        amt = amt.min(remaining);
        let mut written = 0;
        for (i, byte) in block.iter().take(amt).enumerate() {
            let dest = i * stride + count - 1;
            if dest >= size {
                break;
            }
            out[dest] = *byte;
            written += 1;
        }

        remaining -= written;
        count += 1;

        sha2salt.zeroize();
        tmp.zeroize();
        block.zeroize();
    }

    sha2pass.zeroize();
    Ok(())
}

/// The `bcrypt` hash of `pass` under `salt` at cost `2^rounds`.
///
/// The key is the password with its NUL terminator, `Minor::B` caps it at 72 bytes (plus one)
/// while `Minor::A` wraps the length at 256.
///
/// # Errors
///
/// `InvalidParameters` if `rounds` is outside `4..=31`, or a `Minor::A` key length wraps to
/// zero.
pub fn derive(pass: &[u8], salt: &[u8; SALT_SIZE], rounds: u32, minor: Minor) -> Result<[u8; HASH_SIZE], Error> {
    ensure!(
        (MIN_ROUNDS..=MAX_ROUNDS).contains(&rounds),
        InvalidParameters, rounds, "bcrypt rounds out of range"
    );

    let mut key = [0u8; 255];
    if pass.len() >= key.len() {
        key.copy_from_slice(&pass[..255]);
    } else {
        key[..pass.len()].copy_from_slice(pass);
    }

    let key_len = match minor {
        Minor::A => (pass.len() + 1) & 0xFF,
        Minor::B => pass.len().min(72) + 1
    };

    if key_len == 0 {
        key.zeroize();
        bail!(InvalidParameters, pass_len = pass.len(), "bcrypt 2a key length wrapped");
    }

    let mut full = hash192(&key[..key_len], salt, rounds)?;

    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&full[..HASH_SIZE]);

    full.zeroize();
    key.zeroize();
    Ok(out)
}

/// A decoded `$2?$RR$...` record.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    pub minor: Minor,
    pub rounds: u32,
    pub salt: [u8; SALT_SIZE],
    pub hash: [u8; HASH_SIZE]
}

opaque_dbg! { Record }

impl Zeroize for Record {
    fn zeroize(&mut self) {
        self.salt.zeroize();
        self.hash.zeroize();
    }
}

#[inline]
fn unbase64(c: Option<&u8>) -> Option<u8> {
    let c = *c?;
    match TABLE.get(c as usize) {
        Some(&v) if v != 0xFF => Some(v),
        _ => None
    }
}

/// Decodes exactly `out.len()` bytes, returning the number of characters consumed.
fn base64_decode(out: &mut [u8], s: &[u8]) -> Option<usize> {
    let mut chars = s.iter();
    let mut pos = 0;

    while pos < out.len() {
        let c1 = unbase64(chars.next())?;
        let c2 = unbase64(chars.next())?;
        out[pos] = (c1 << 2) | ((c2 & 0x30) >> 4);
        pos += 1;

        if pos == out.len() {
            break;
        }

        let c3 = unbase64(chars.next())?;
        out[pos] = ((c2 & 0x0F) << 4) | ((c3 & 0x3C) >> 2);
        pos += 1;

        if pos == out.len() {
            break;
        }

        let c4 = unbase64(chars.next())?;
        out[pos] = ((c3 & 0x03) << 6) | c4;
        pos += 1;
    }

    Some(s.len() - chars.as_slice().len())
}

/// Decode a `$2a$` / `$2b$` record.
///
/// # Errors
///
/// `InvalidEncoding` for any malformed field, an out of range cost, or trailing characters.
pub fn decode(record: &str) -> Result<Record, Error> {
    let raw = record.as_bytes();

    ensure!(
        raw.len() >= 7 && raw[0] == b'$' && raw[1] == b'2' && raw[3] == b'$' && raw[6] == b'$',
        InvalidEncoding, "bcrypt record framing"
    );

    let minor = Minor::try_from(raw[2])?;

    ensure!(
        raw[4].is_ascii_digit() && raw[5].is_ascii_digit(),
        InvalidEncoding, "bcrypt cost is not decimal"
    );

    let rounds = u32::from(raw[4] - b'0') * 10 + u32::from(raw[5] - b'0');
    ensure!(
        (MIN_ROUNDS..=MAX_ROUNDS).contains(&rounds),
        InvalidEncoding, rounds, "bcrypt cost out of range"
    );

    let body = &raw[7..];
    let mut out = Record { minor, rounds, salt: [0u8; SALT_SIZE], hash: [0u8; HASH_SIZE] };

    let Some(used) = base64_decode(&mut out.salt, body) else {
        bail!(InvalidEncoding, "bcrypt salt encoding")
    };
    let Some(rest) = base64_decode(&mut out.hash, &body[used..]) else {
        bail!(InvalidEncoding, "bcrypt hash encoding")
    };

    ensure!(used + rest == body.len(), InvalidEncoding, "bcrypt record trailing data");
    Ok(out)
}

/// Check `pass` against an encoded record in constant time.
///
/// Malformed records never verify.
pub fn verify(pass: &[u8], record: &str) -> bool {
    let Ok(mut parsed) = decode(record) else { return false };

    let ok = match derive(pass, &parsed.salt, parsed.rounds, parsed.minor) {
        Ok(mut hash) => {
            let eq = ct::ct_eq(hash, parsed.hash);
            hash.zeroize();
            eq
        },
        Err(_) => false
    };

    parsed.zeroize();
    ok
}

alloc! {
    use alloc::string::String;

    fn base64_encode(out: &mut String, data: &[u8]) {
        let sym = |i: u8| char::from(CHARSET[(i & 0x3F) as usize]);

        for group in data.chunks(3) {
            let c1 = group[0];
            out.push(sym(c1 >> 2));

            let Some(&c2) = group.get(1) else {
                out.push(sym((c1 & 0x03) << 4));
                break;
            };
            out.push(sym(((c1 & 0x03) << 4) | (c2 >> 4)));

            let Some(&c3) = group.get(2) else {
                out.push(sym((c2 & 0x0F) << 2));
                break;
            };
            out.push(sym(((c2 & 0x0F) << 2) | (c3 >> 6)));
            out.push(sym(c3));
        }
    }

    /// Encode a record.
    ///
    /// # Errors
    ///
    /// `InvalidParameters` if `rounds` is outside `4..=31`.
    pub fn encode(minor: Minor, rounds: u32, salt: &[u8; SALT_SIZE], hash: &[u8; HASH_SIZE]) -> Result<String, Error> {
        ensure!(
            (MIN_ROUNDS..=MAX_ROUNDS).contains(&rounds),
            InvalidParameters, rounds, "bcrypt rounds out of range"
        );

        let mut out = String::with_capacity(RECORD_SIZE);
        out.push('$');
        out.push('2');
        out.push(minor.as_char());
        out.push('$');
        out.push(char::from(b'0' + (rounds / 10) as u8));
        out.push(char::from(b'0' + (rounds % 10) as u8));
        out.push('$');

        base64_encode(&mut out, salt);
        base64_encode(&mut out, hash);

        debug_assert_eq!(out.len(), RECORD_SIZE);
        Ok(out)
    }

    /// Hash `pass` and encode the record.
    ///
    /// # Errors
    ///
    /// See [`derive`].
    ///
    /// # Example
    ///
    /// ```
    /// use torsion_sym::kdf::bcrypt::{generate, verify, Minor};
    ///
    /// let record = generate(b"hunter2", &[7u8; 16], 4, Minor::B).unwrap();
    /// assert!(verify(b"hunter2", &record));
    /// assert!(!verify(b"hunter3", &record));
    /// ```
    pub fn generate(pass: &[u8], salt: &[u8; SALT_SIZE], rounds: u32, minor: Minor) -> Result<String, Error> {
        let mut hash = derive(pass, salt, rounds, minor)?;
        let res = encode(minor, rounds, salt, &hash);
        hash.zeroize();
        res
    }

    /// [`generate`] with the salt given in bcrypt base64.
    ///
    /// # Errors
    ///
    /// `InvalidEncoding` unless `salt64` is exactly one 22 character encoded salt, otherwise
    /// see [`derive`].
    pub fn generate_with_salt64(pass: &[u8], salt64: &str, rounds: u32, minor: Minor) -> Result<String, Error> {
        let mut salt = [0u8; SALT_SIZE];

        match base64_decode(&mut salt, salt64.as_bytes()) {
            Some(used) if used == salt64.len() => {},
            _ => bail!(InvalidEncoding, "bcrypt salt encoding")
        }

        let res = generate(pass, &salt, rounds, minor);
        salt.zeroize();
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const OPENWALL: &str = "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW";

    #[test]
    #[cfg(feature = "alloc")]
    fn openwall_vector() {
        assert!(verify(b"U*U", OPENWALL));
        assert!(!verify(b"U*V", OPENWALL));

        assert_eq!(
            generate_with_salt64(b"U*U", "CCCCCCCCCCCCCCCCCCCCC.", 5, Minor::A).unwrap(),
            OPENWALL
        );
    }

    #[test]
    #[cfg(feature = "alloc")]
    fn decode_encode() {
        let record = decode(OPENWALL).unwrap();
        assert_eq!(record.minor, Minor::A);
        assert_eq!(record.rounds, 5);
        assert_eq!(
            encode(record.minor, record.rounds, &record.salt, &record.hash).unwrap(),
            OPENWALL
        );
    }

    #[test]
    fn malformed_records() {
        let bad = [
            "",
            "$2a$05$",
            "$2c$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW",
            "$2a$03$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW",
            "$2a$32$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW",
            "$2a$x5$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW",
            "$2a$05CCCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW",
            "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOe",
            "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeWW",
            "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOe!"
        ];

        for record in bad {
            assert_eq!(decode(record).unwrap_err().kind(), ErrorKind::InvalidEncoding, "{record}");
            assert!(!verify(b"U*U", record));
        }
    }

    #[test]
    fn rounds_checked() {
        assert_eq!(derive(b"pw", &[0; 16], 3, Minor::B).unwrap_err().kind(), ErrorKind::InvalidParameters);
        assert_eq!(derive(b"pw", &[0; 16], 32, Minor::B).unwrap_err().kind(), ErrorKind::InvalidParameters);
    }

    #[test]
    fn key_length_rules() {
        let salt = [3u8; 16];
        let long = [b'x'; 100];

        // 2b stops at 72 bytes plus one, everything past it is ignored
        assert_eq!(
            derive(&long[..80], &salt, 4, Minor::B).unwrap(),
            derive(&long, &salt, 4, Minor::B).unwrap()
        );

        // 2a wraps, a 255 byte password leaves an empty key
        assert_eq!(
            derive(&[b'x'; 255], &salt, 4, Minor::A).unwrap_err().kind(),
            ErrorKind::InvalidParameters
        );
        assert!(derive(&[b'x'; 256], &salt, 4, Minor::A).is_ok());
    }

    #[test]
    fn pbkdf_parameters() {
        let mut out = [0u8; 32];
        assert!(pbkdf(b"pw", b"salt", 0, &mut out).is_err());
        assert!(pbkdf(b"", b"salt", 1, &mut out).is_err());
        assert!(pbkdf(b"pw", b"", 1, &mut out).is_err());
        assert!(pbkdf(b"pw", b"salt", 1, &mut []).is_err());

        let mut huge = [0u8; MAX_PBKDF_SIZE + 1];
        assert!(pbkdf(b"pw", b"salt", 1, &mut huge).is_err());
        assert!(pbkdf(b"pw", b"salt", 1, &mut huge[..MAX_PBKDF_SIZE]).is_ok());
    }

    #[test]
    fn empty_core_inputs() {
        assert!(hash192(b"", b"salt", 4).is_err());
        assert!(hash256(b"key", b"", 4).is_err());
    }
}

#[cfg(all(test, feature = "alloc", not(miri)))]
mod property_tests {
    use super::*;
    use crate::test_utils::{BoundList, flip_bit};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn matches_rust_crypto(
            pass in "[a-zA-Z0-9 ]{0,60}",
            salt in any::<[u8; 16]>(),
            minor in prop_oneof![Just(Minor::A), Just(Minor::B)]
        ) {
            let ours = generate(pass.as_bytes(), &salt, 4, minor).unwrap();

            let version = match minor {
                Minor::A => ::bcrypt::Version::TwoA,
                Minor::B => ::bcrypt::Version::TwoB
            };
            let theirs = ::bcrypt::hash_with_salt(pass.as_bytes(), 4, salt)
                .unwrap()
                .format_for_version(version);

            prop_assert_eq!(&ours, &theirs);
            prop_assert!(verify(pass.as_bytes(), &theirs));
        }

        #[test]
        fn pbkdf_matches_rust_crypto(
            pass in any::<BoundList<32>>(),
            salt in any::<BoundList<32>>(),
            rounds in 1u32..4,
            len in 1usize..80
        ) {
            prop_assume!(!pass.is_empty() && !salt.is_empty());

            let mut ours = [0u8; 80];
            pbkdf(&pass, &salt, rounds, &mut ours[..len]).unwrap();

            let mut theirs = [0u8; 80];
            ::bcrypt_pbkdf::bcrypt_pbkdf(pass.as_slice(), &salt, rounds, &mut theirs[..len]).unwrap();

            prop_assert_eq!(&ours[..len], &theirs[..len]);
        }

        #[test]
        fn every_input_matters(
            pass in prop::collection::vec(any::<u8>(), 1..=60),
            salt in any::<[u8; 16]>(),
            minor in prop_oneof![Just(Minor::A), Just(Minor::B)],
            pass_bit in any::<prop::sample::Index>(),
            salt_bit in any::<prop::sample::Index>()
        ) {
            let hash = |pass: &[u8], salt: &[u8], rounds: u32| {
                let salt: [u8; SALT_SIZE] = salt.try_into().unwrap();
                derive(pass, &salt, rounds, minor).unwrap()
            };
            let base = hash(&pass, &salt, MIN_ROUNDS);

            prop_assert_eq!(base, hash(&pass, &salt, MIN_ROUNDS));
            prop_assert_ne!(base, hash(&flip_bit(&pass, pass_bit), &salt, MIN_ROUNDS));
            prop_assert_ne!(base, hash(&pass, &flip_bit(&salt, salt_bit), MIN_ROUNDS));
            prop_assert_ne!(base, hash(&pass, &salt, MIN_ROUNDS + 1));
        }

        #[test]
        fn pbkdf_every_input_matters(
            pass in prop::collection::vec(any::<u8>(), 1..32),
            salt in prop::collection::vec(any::<u8>(), 1..32),
            rounds in 1u32..3,
            pass_bit in any::<prop::sample::Index>(),
            salt_bit in any::<prop::sample::Index>()
        ) {
            let key = |pass: &[u8], salt: &[u8], rounds: u32| {
                let mut out = [0u8; 40];
                pbkdf(pass, salt, rounds, &mut out).unwrap();
                out
            };
            let base = key(&pass, &salt, rounds);

            prop_assert_eq!(base, key(&pass, &salt, rounds));
            prop_assert_ne!(base, key(&flip_bit(&pass, pass_bit), &salt, rounds));
            prop_assert_ne!(base, key(&pass, &flip_bit(&salt, salt_bit), rounds));
            prop_assert_ne!(base, key(&pass, &salt, rounds + 1));
        }
    }
}
