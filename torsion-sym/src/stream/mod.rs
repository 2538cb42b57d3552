//! Buffered cipher streams over any (cipher, mode) pair.
//!
//! [`CipherStream`] accepts input in arbitrary chunks, keeps partial blocks for the block modes,
//! applies PKCS#7 padding or ciphertext stealing at [`finalize`](CipherStream::finalize), and
//! keeps the tag bookkeeping for the AEAD modes.
//!
//! For the block modes whose last block may still be rewritten at finalization (decryption with
//! padding, and CTS / XTS with stealing) the most recent complete block is held back until the
//! next one forms. [`CipherStream::update_size`] accounts for this exactly.
//!
//! # Example
//!
//! ```
//! use torsion_sym::{CipherStream, CipherKind, Mode};
//! use torsion_sym::stream::{Direction, MAX_FINAL_SIZE};
//!
//! let key = [7u8; 32];
//! let iv = [1u8; 16];
//!
//! let mut enc = CipherStream::new(CipherKind::Aes256, Mode::Cbc, Direction::Encrypt, &key, &iv)?;
//! let mut ct = [0u8; 48];
//! let mut len = enc.update(b"attack at dawn, ", &mut ct)?;
//! len += enc.update(b"bring snacks", &mut ct[len..])?;
//! len += enc.finalize(&mut ct[len..])?;
//! assert_eq!(len, 32);
//!
//! let mut dec = CipherStream::new(CipherKind::Aes256, Mode::Cbc, Direction::Decrypt, &key, &iv)?;
//! let mut pt = [0u8; 32 + MAX_FINAL_SIZE];
//! let mut n = dec.update(&ct[..len], &mut pt)?;
//! n += dec.finalize(&mut pt[n..])?;
//! assert_eq!(&pt[..n], b"attack at dawn, bring snacks");
//! # Ok::<(), torsion_sym::Error>(())
//! ```

use core::fmt;
use zeroize::Zeroize;
use crate::buf::Block;
use crate::cipher::{Cipher, CipherKind};
use crate::ct;
use crate::error::{Error, ErrorKind};
use crate::mode::{ecb, pkcs7, stage, ensure_aligned};
use crate::mode::cbc::Cbc;
use crate::mode::xts::Xts;
use crate::mode::ctr::Ctr;
use crate::mode::cfb::Cfb;
use crate::mode::ofb::Ofb;
use crate::mode::gcm::{self, Gcm};
use crate::mode::ccm::Ccm;
use crate::mode::eax::Eax;

mod oneshot;

pub use oneshot::{static_encrypt_into, static_decrypt_into, static_output_size};

alloc! {
    pub use oneshot::{static_encrypt, static_decrypt};
}

/// The largest block size of any supported cipher.
pub const MAX_BLOCK_SIZE: usize = crate::buf::MAX_BLOCK_SIZE;
/// The largest AEAD tag any mode produces.
pub const MAX_TAG_SIZE: usize = 16;
/// The most [`CipherStream::finalize`] ever writes, a stolen block plus a partial one.
pub const MAX_FINAL_SIZE: usize = 2 * MAX_BLOCK_SIZE - 1;

/// Upper bound on what a single [`CipherStream::update`] of `len` bytes can write, for any
/// cipher, mode and stream state.
#[inline]
pub const fn max_update_size(len: usize) -> usize {
    let blocks = len / MAX_BLOCK_SIZE + (len % MAX_BLOCK_SIZE != 0) as usize;
    (blocks + 1) * MAX_BLOCK_SIZE
}

/// The mode of operation of a [`CipherStream`].
///
/// The discriminants are the legacy integer identifiers, stable for serialized configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Mode {
    /// Single block ECB, no padding, no IV.
    Raw = 0,
    Ecb = 1,
    Cbc = 2,
    /// CBC with ciphertext stealing.
    Cts = 3,
    Xts = 4,
    Ctr = 5,
    Cfb = 6,
    Ofb = 7,
    Gcm = 8,
    Ccm = 9,
    Eax = 10
}

const ALL_MODES: [Mode; 11] = [
    Mode::Raw, Mode::Ecb, Mode::Cbc, Mode::Cts, Mode::Xts, Mode::Ctr,
    Mode::Cfb, Mode::Ofb, Mode::Gcm, Mode::Ccm, Mode::Eax
];

impl Mode {
    /// The largest mode identifier.
    pub const MAX: Self = Self::Eax;

    /// Every mode, in identifier order.
    pub const fn all() -> &'static [Self; 11] {
        &ALL_MODES
    }

    /// Whether the mode produces an authentication tag.
    #[inline]
    pub const fn is_aead(self) -> bool {
        matches!(self, Self::Gcm | Self::Ccm | Self::Eax)
    }

    /// Whether the mode transforms input one to one without buffering.
    #[inline]
    pub const fn is_stream(self) -> bool {
        matches!(self, Self::Ctr | Self::Cfb | Self::Ofb | Self::Gcm | Self::Ccm | Self::Eax)
    }

    /// Whether [`CipherStream::set_padding`] applies to the mode.
    #[inline]
    pub const fn has_padding(self) -> bool {
        matches!(self, Self::Ecb | Self::Cbc | Self::Cts | Self::Xts)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Raw => "RAW",
            Self::Ecb => "ECB",
            Self::Cbc => "CBC",
            Self::Cts => "CTS",
            Self::Xts => "XTS",
            Self::Ctr => "CTR",
            Self::Cfb => "CFB",
            Self::Ofb => "OFB",
            Self::Gcm => "GCM",
            Self::Ccm => "CCM",
            Self::Eax => "EAX"
        }
    }

    /// Case-insensitive lookup by [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_MODES.iter().copied().find(|m| m.name().eq_ignore_ascii_case(name))
    }
}

impl TryFrom<u32> for Mode {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match usize::try_from(value).ok().and_then(|idx| ALL_MODES.get(idx)) {
            Some(mode) => Ok(*mode),
            None => bail!(InvalidContext, mode = value, "unknown mode id")
        }
    }
}

impl From<Mode> for u32 {
    #[inline]
    fn from(value: Mode) -> Self {
        value as Self
    }
}

impl fmt::Display for Mode {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a stream encrypts or decrypts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Encrypt,
    Decrypt
}

impl Direction {
    #[inline]
    pub const fn is_encrypt(self) -> bool {
        matches!(self, Self::Encrypt)
    }
}

enum State {
    /// RAW and ECB.
    Ecb,
    /// CBC and CTS.
    Cbc(Cbc),
    Xts(Xts),
    Ctr(Ctr),
    Cfb(Cfb),
    Ofb(Ofb),
    Gcm(Gcm),
    Ccm(Ccm),
    Eax(Eax)
}

/// The key schedule and mode state, dropped (and wiped) as one at finalization.
struct Engine {
    cipher: Cipher,
    state: State
}

impl Engine {
    fn new(kind: CipherKind, mode: Mode, key: &[u8], iv: &[u8]) -> Result<Self, Error> {
        if mode == Mode::Xts {
            ensure!(
                key.len() == 2 * kind.key_size(),
                InvalidContext, cipher = kind.name(), key_len = key.len(), "xts key must be doubled"
            );

            let (data_key, tweak_key) = key.split_at(kind.key_size());
            let cipher = Cipher::new(kind, data_key)?;
            let mut xts = Xts::new(&cipher, iv)?;
            xts.setup(&cipher, tweak_key)?;

            return Ok(Self { cipher, state: State::Xts(xts) });
        }

        let cipher = Cipher::new(kind, key)?;

        let state = match mode {
            Mode::Raw | Mode::Ecb => {
                ensure!(iv.is_empty(), InvalidContext, mode = mode.name(), "mode takes no iv");
                State::Ecb
            },
            Mode::Cbc | Mode::Cts => State::Cbc(Cbc::new(&cipher, iv)?),
            Mode::Ctr => State::Ctr(Ctr::new(&cipher, iv)?),
            Mode::Cfb => State::Cfb(Cfb::new(&cipher, iv)?),
            Mode::Ofb => State::Ofb(Ofb::new(&cipher, iv)?),
            Mode::Gcm => State::Gcm(Gcm::new(&cipher, iv)?),
            Mode::Ccm => State::Ccm(Ccm::new(&cipher, iv)?),
            Mode::Eax => State::Eax(Eax::new(&cipher, iv)),
            Mode::Xts => bail!(InvalidContext)
        };

        Ok(Self { cipher, state })
    }

    /// Runs the mode over `data`, which the block modes require to be aligned.
    fn process(&mut self, direction: Direction, data: &mut [u8]) -> Result<(), Error> {
        let cipher = &self.cipher;

        match (&mut self.state, direction) {
            (State::Ecb, Direction::Encrypt) => ecb::encrypt_in_place(cipher, data),
            (State::Ecb, Direction::Decrypt) => ecb::decrypt_in_place(cipher, data),
            (State::Cbc(s), Direction::Encrypt) => s.encrypt_in_place(cipher, data),
            (State::Cbc(s), Direction::Decrypt) => s.decrypt_in_place(cipher, data),
            (State::Xts(s), Direction::Encrypt) => s.encrypt_in_place(cipher, data),
            (State::Xts(s), Direction::Decrypt) => s.decrypt_in_place(cipher, data),
            (State::Ccm(s), Direction::Encrypt) => s.encrypt_in_place(cipher, data),
            (State::Ccm(s), Direction::Decrypt) => s.decrypt_in_place(cipher, data),
            (State::Ctr(s), _) => { s.apply_keystream(cipher, data); Ok(()) },
            (State::Ofb(s), _) => { s.apply_keystream(cipher, data); Ok(()) },
            (State::Cfb(s), Direction::Encrypt) => { s.encrypt_in_place(cipher, data); Ok(()) },
            (State::Cfb(s), Direction::Decrypt) => { s.decrypt_in_place(cipher, data); Ok(()) },
            (State::Gcm(s), Direction::Encrypt) => s.encrypt_in_place(cipher, data),
            (State::Gcm(s), Direction::Decrypt) => s.decrypt_in_place(cipher, data),
            (State::Eax(s), Direction::Encrypt) => { s.encrypt_in_place(cipher, data); Ok(()) },
            (State::Eax(s), Direction::Decrypt) => { s.decrypt_in_place(cipher, data); Ok(()) }
        }
    }

    fn steal(&mut self, direction: Direction, last: &mut [u8], partial: &mut [u8]) -> Result<(), Error> {
        let cipher = &self.cipher;

        match (&mut self.state, direction) {
            (State::Cbc(s), Direction::Encrypt) => s.steal(cipher, last, partial),
            (State::Cbc(s), Direction::Decrypt) => s.unsteal(cipher, last, partial),
            (State::Xts(s), Direction::Encrypt) => s.steal(cipher, last, partial),
            (State::Xts(s), Direction::Decrypt) => s.unsteal(cipher, last, partial),
            _ => bail!(InvalidState, "mode has no ciphertext stealing")
        }
    }

    /// The full tag and the number of meaningful bytes in it.
    fn digest(&mut self) -> Result<(Block, usize), Error> {
        let cipher = &self.cipher;

        match &mut self.state {
            State::Gcm(s) => Ok((s.digest(), gcm::TAG_SIZE)),
            State::Ccm(s) => {
                let tag = s.digest(cipher)?;
                Ok((tag, s.tag_len()))
            },
            State::Eax(s) => Ok((s.digest(cipher), cipher.block_size())),
            _ => bail!(InvalidState, "mode has no tag")
        }
    }
}

/// An incremental encryption or decryption context for one (cipher, mode, key, iv).
///
/// The lifecycle is one way: configuration (`set_padding`, `set_aad`, `set_ccm`), then any number
/// of [`update`](Self::update) calls, then [`finalize`](Self::finalize). Out of order calls fail
/// with [`ErrorKind::InvalidState`] and leave the stream unchanged. After finalization only
/// [`get_tag`](Self::get_tag) remains usable.
///
/// The key schedule and every buffer are zeroized at finalization and on drop.
pub struct CipherStream {
    inner: Option<Engine>,
    kind: CipherKind,
    mode: Mode,
    direction: Direction,
    block_size: usize,
    padding: bool,
    started: bool,
    block: Block,
    block_pos: usize,
    last: Block,
    has_last: bool,
    tag: Block,
    tag_len: usize
}

opaque_dbg! { CipherStream }

impl CipherStream {
    /// Creates a stream for `kind` in `mode`.
    ///
    /// XTS takes twice the cipher key size, the data key followed by the tweak key. RAW and ECB
    /// take no IV, CBC, CTS, CTR, CFB and OFB take one block, XTS takes 16 bytes, GCM any
    /// non-empty IV, CCM 7 to 13 bytes, and EAX any length.
    ///
    /// Padding (ECB / CBC) and ciphertext stealing (CTS / XTS) start enabled.
    ///
    /// # Errors
    ///
    /// `InvalidContext` if the key or IV is not accepted for the (cipher, mode) pair, the cipher
    /// is not available, or the mode requires a 16 byte block cipher.
    pub fn new(
        kind: CipherKind,
        mode: Mode,
        direction: Direction,
        key: &[u8],
        iv: &[u8]
    ) -> Result<Self, Error> {
        let inner = Engine::new(kind, mode, key, iv).map_err(|_| Error::new(ErrorKind::InvalidContext))?;

        Ok(Self {
            inner: Some(inner),
            kind,
            mode,
            direction,
            block_size: kind.block_size(),
            padding: mode.has_padding(),
            started: false,
            block: [0u8; MAX_BLOCK_SIZE],
            block_pos: 0,
            last: [0u8; MAX_BLOCK_SIZE],
            has_last: false,
            tag: [0u8; MAX_BLOCK_SIZE],
            tag_len: 0
        })
    }

    #[inline]
    pub const fn kind(&self) -> CipherKind {
        self.kind
    }

    #[inline]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Whether [`finalize`](Self::finalize) has been called.
    #[inline]
    pub const fn is_finalized(&self) -> bool {
        self.inner.is_none()
    }

    #[inline]
    fn engine(&mut self) -> Result<&mut Engine, Error> {
        match self.inner.as_mut() {
            Some(engine) => Ok(engine),
            None => bail!(InvalidState, "stream finalized")
        }
    }

    #[inline]
    fn ensure_configurable(&self) -> Result<(), Error> {
        ensure!(!self.is_finalized(), InvalidState, "stream finalized");
        ensure!(!self.started, InvalidState, mode = self.mode.name(), "configuration after update");
        Ok(())
    }

    /// Whether the latest complete block is held back for finalization.
    #[inline]
    const fn lookahead(&self) -> bool {
        match self.mode {
            Mode::Ecb | Mode::Cbc => self.padding && !self.direction.is_encrypt(),
            Mode::Cts | Mode::Xts => self.padding,
            _ => false
        }
    }

    /// Enables or disables PKCS#7 padding (ECB, CBC) or ciphertext stealing (CTS, XTS).
    ///
    /// # Errors
    ///
    /// `InvalidState` for any other mode, or after the first update.
    pub fn set_padding(&mut self, padding: bool) -> Result<(), Error> {
        self.ensure_configurable()?;
        ensure!(self.mode.has_padding(), InvalidState, mode = self.mode.name(), "mode has no padding");
        self.padding = padding;
        Ok(())
    }

    /// Supplies associated data for GCM or EAX. May be called repeatedly before the first update.
    ///
    /// # Errors
    ///
    /// `InvalidState` for any other mode, or after the first update.
    pub fn set_aad(&mut self, aad: &[u8]) -> Result<(), Error> {
        self.ensure_configurable()?;
        let mode = self.mode;
        let engine = self.engine()?;

        match &mut engine.state {
            State::Gcm(s) => s.aad(aad),
            State::Eax(s) => {
                s.aad(&engine.cipher, aad);
                Ok(())
            },
            _ => bail!(InvalidState, mode = mode.name(), "mode takes no aad")
        }
    }

    /// Declares the CCM message length, tag length, and associated data.
    ///
    /// Required exactly once, before the first update, for CCM.
    ///
    /// # Errors
    ///
    /// - `InvalidState` for any other mode, when called twice, or after the first update.
    /// - `InvalidParameters` for a tag length outside `{4, 6, ..., 16}`, or a message length the
    ///   nonce leaves no room to count.
    pub fn set_ccm(&mut self, msg_len: u64, tag_len: usize, aad: &[u8]) -> Result<(), Error> {
        self.ensure_configurable()?;
        let mode = self.mode;
        let engine = self.engine()?;

        match &mut engine.state {
            State::Ccm(s) => s.setup(&engine.cipher, msg_len, tag_len, aad),
            _ => bail!(InvalidState, mode = mode.name(), "set_ccm on a non ccm stream")
        }
    }

    /// Supplies the expected tag of an AEAD decryption, checked at finalization.
    ///
    /// GCM accepts 4, 8, or 12 to 16 bytes, EAX 1 up to the block size, and CCM exactly the
    /// length declared with [`set_ccm`](Self::set_ccm).
    ///
    /// # Errors
    ///
    /// - `InvalidState` when encrypting, for a non AEAD mode, after finalization, or for CCM
    ///   before `set_ccm`.
    /// - `InvalidLength` if the tag length is not accepted.
    pub fn set_tag(&mut self, tag: &[u8]) -> Result<(), Error> {
        ensure!(!self.is_finalized(), InvalidState, "stream finalized");
        ensure!(!self.direction.is_encrypt(), InvalidState, "set_tag while encrypting");

        let ok_len = match self.inner.as_ref().map(|e| &e.state) {
            Some(State::Gcm(_)) => matches!(tag.len(), 4 | 8 | 12..=16),
            Some(State::Eax(_)) => (1..=self.block_size).contains(&tag.len()),
            Some(State::Ccm(s)) => {
                ensure!(s.is_ready(), InvalidState, "set_tag before set_ccm");
                tag.len() == s.tag_len()
            },
            _ => bail!(InvalidState, mode = self.mode.name(), "mode has no tag")
        };

        ensure!(ok_len, InvalidLength, mode = self.mode.name(), tag_len = tag.len(), "tag length");

        self.tag[..tag.len()].copy_from_slice(tag);
        self.tag_len = tag.len();
        Ok(())
    }

    /// The tag produced by an AEAD encryption.
    ///
    /// # Errors
    ///
    /// `InvalidState` before finalization, when decrypting, or for a non AEAD mode.
    pub fn get_tag(&self) -> Result<&[u8], Error> {
        ensure!(self.is_finalized(), InvalidState, "get_tag before finalize");
        ensure!(self.direction.is_encrypt() && self.mode.is_aead(), InvalidState, "no tag");
        ensure!(self.tag_len != 0, InvalidState, "no tag");
        Ok(&self.tag[..self.tag_len])
    }

    /// The exact number of bytes the next [`update`](Self::update) of `len` bytes writes.
    ///
    /// Never exceeds [`max_update_size`]. Zero once finalized.
    pub fn update_size(&self, len: usize) -> usize {
        if self.is_finalized() {
            return 0;
        }

        if self.mode.is_stream() {
            return len;
        }

        let bs = self.block_size;
        let blocks = len / bs + (self.block_pos + len % bs) / bs;
        let held = usize::from(self.has_last);

        if self.lookahead() {
            let held_after = usize::from(self.has_last || blocks > 0);
            bs * (held + blocks - held_after)
        } else {
            bs * blocks
        }
    }

    /// The exact number of bytes [`finalize`](Self::finalize) writes in the current state,
    /// an upper bound for padded decryption.
    pub fn final_size(&self) -> usize {
        if self.is_finalized() || self.mode.is_stream() {
            return 0;
        }

        match self.mode {
            Mode::Ecb | Mode::Cbc if self.padding => self.block_size,
            Mode::Cts | Mode::Xts if self.padding && self.has_last => self.block_size + self.block_pos,
            _ => 0
        }
    }

    #[inline]
    fn begin(&mut self) -> Result<(), Error> {
        if let Some(Engine { state: State::Ccm(s), .. }) = self.inner.as_ref() {
            ensure!(s.is_ready(), InvalidState, "ccm stream without set_ccm");
        }

        self.started = true;
        Ok(())
    }

    /// Feeds `input` through the stream, writing the completed output to the front of `output`.
    ///
    /// Returns the number of bytes written, always [`update_size(input.len())`](Self::update_size).
    ///
    /// # Errors
    ///
    /// - `InvalidState` after finalization, for CCM without [`set_ccm`](Self::set_ccm), or for
    ///   CCM input past the declared message length.
    /// - `InvalidLength` if `output` is shorter than `update_size(input.len())`.
    pub fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, Error> {
        ensure!(!self.is_finalized(), InvalidState, "update after finalize");

        let need = self.update_size(input.len());
        ensure!(output.len() >= need, InvalidLength, need = need, output_len = output.len(), "update output");

        self.begin()?;

        let direction = self.direction;
        let bs = self.block_size;
        let lookahead = self.lookahead();
        let stream = self.mode.is_stream();

        let Some(engine) = self.inner.as_mut() else {
            bail!(InvalidState, "update after finalize")
        };

        if stream {
            let out = stage(input, output)?;
            engine.process(direction, out)?;
            return Ok(input.len());
        }

        let mut input = input;
        let mut written = 0;

        while !input.is_empty() {
            let take = (bs - self.block_pos).min(input.len());
            self.block[self.block_pos..self.block_pos + take].copy_from_slice(&input[..take]);
            self.block_pos += take;
            input = &input[take..];

            if self.block_pos < bs {
                break;
            }

            self.block_pos = 0;

            if lookahead {
                if self.has_last {
                    let out = &mut output[written..written + bs];
                    out.copy_from_slice(&self.last[..bs]);
                    if !direction.is_encrypt() {
                        engine.process(direction, out)?;
                    }
                    written += bs;
                }

                self.last = self.block;
                if direction.is_encrypt() {
                    engine.process(direction, &mut self.last[..bs])?;
                }
                self.has_last = true;
            } else {
                let out = &mut output[written..written + bs];
                out.copy_from_slice(&self.block[..bs]);
                engine.process(direction, out)?;
                written += bs;
            }
        }

        debug_assert_eq!(written, need);
        Ok(written)
    }

    /// Transforms `input` directly into `output` without buffering or padding.
    ///
    /// Only usable while nothing is buffered, block modes additionally require `input` to be a
    /// multiple of the block size.
    ///
    /// # Errors
    ///
    /// - `InvalidState` after finalization, while data is buffered, or under the CCM rules of
    ///   [`update`](Self::update).
    /// - `InvalidLength` if `input` is unaligned for a block mode or `output` is too short.
    pub fn crypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, Error> {
        ensure!(!self.is_finalized(), InvalidState, "crypt after finalize");
        ensure!(self.block_pos == 0 && !self.has_last, InvalidState, "crypt with buffered data");

        if !self.mode.is_stream() {
            ensure_aligned(input.len(), self.block_size)?;
        }

        let out = stage(input, output)?;
        self.begin()?;

        let direction = self.direction;
        self.engine()?.process(direction, out)?;
        Ok(input.len())
    }

    /// Completes the stream, writing any remaining output to the front of `output`.
    ///
    /// Encrypting with an AEAD mode computes the tag, available from
    /// [`get_tag`](Self::get_tag). Decrypting with an AEAD mode verifies the tag supplied with
    /// [`set_tag`](Self::set_tag).
    ///
    /// Apart from a too short `output`, which leaves the stream usable, the stream is finalized
    /// and wiped whether or not this succeeds.
    ///
    /// # Errors
    ///
    /// - `InvalidLength` if `output` is shorter than [`final_size`](Self::final_size), or the
    ///   buffered input cannot be completed (unaligned input without padding, or under one block
    ///   for CTS / XTS).
    /// - `PaddingError` if padded decryption finds a malformed pad or no complete block.
    /// - `InvalidState` if already finalized, for AEAD decryption without a tag, or for CCM
    ///   input shorter than declared.
    /// - `TagMismatch` if the AEAD tag does not verify.
    pub fn finalize(&mut self, output: &mut [u8]) -> Result<usize, Error> {
        ensure!(!self.is_finalized(), InvalidState, "finalize twice");

        let need = self.final_size();
        ensure!(output.len() >= need, InvalidLength, need = need, output_len = output.len(), "final output");

        let res = self.finish(output);
        self.wipe();

        if res.is_err() || !self.direction.is_encrypt() {
            self.tag.zeroize();
            self.tag_len = 0;
        }

        res
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<usize, Error> {
        let bs = self.block_size;
        let direction = self.direction;
        let padding = self.padding;

        let Some(engine) = self.inner.as_mut() else {
            bail!(InvalidState, "finalize twice")
        };

        match self.mode {
            Mode::Ctr | Mode::Cfb | Mode::Ofb => Ok(0),
            Mode::Gcm | Mode::Ccm | Mode::Eax => {
                if !direction.is_encrypt() {
                    ensure!(self.tag_len != 0, InvalidState, "decrypt finalize without a tag");
                }

                let (mut computed, len) = engine.digest()?;

                let res = if direction.is_encrypt() {
                    self.tag = computed;
                    self.tag[len..].fill(0);
                    self.tag_len = len;
                    Ok(0)
                } else if ct::ct_eq(&computed[..self.tag_len], &self.tag[..self.tag_len]) {
                    Ok(0)
                } else {
                    Err(Error::new(ErrorKind::TagMismatch))
                };

                computed.zeroize();
                res
            },
            Mode::Ecb | Mode::Cbc if padding => match direction {
                Direction::Encrypt => {
                    pkcs7::pad(&mut self.block[..bs], self.block_pos);
                    engine.process(direction, &mut self.block[..bs])?;
                    output[..bs].copy_from_slice(&self.block[..bs]);
                    Ok(bs)
                },
                Direction::Decrypt => {
                    ensure!(self.block_pos == 0 && self.has_last, PaddingError, "no complete final block");
                    engine.process(direction, &mut self.last[..bs])?;
                    let len = pkcs7::unpad(&self.last[..bs])?;
                    output[..len].copy_from_slice(&self.last[..len]);
                    Ok(len)
                }
            },
            Mode::Cts | Mode::Xts if padding => {
                if !self.has_last {
                    ensure!(self.block_pos == 0, InvalidLength, partial = self.block_pos, "under one block");
                    return Ok(0);
                }

                // aligned: the held block goes out unswapped, stealing only reorders a partial tail
                if self.block_pos == 0 {
                    if !direction.is_encrypt() {
                        engine.process(direction, &mut self.last[..bs])?;
                    }
                    output[..bs].copy_from_slice(&self.last[..bs]);
                    return Ok(bs);
                }

                let partial = self.block_pos;
                engine.steal(direction, &mut self.last[..bs], &mut self.block[..partial])?;
                output[..bs].copy_from_slice(&self.last[..bs]);
                output[bs..bs + partial].copy_from_slice(&self.block[..partial]);
                Ok(bs + partial)
            },
            _ => {
                ensure!(self.block_pos == 0, InvalidLength, partial = self.block_pos, "unaligned input without padding");
                Ok(0)
            }
        }
    }

    /// Drops the key schedule and mode state, and clears the buffers.
    fn wipe(&mut self) {
        self.inner = None;
        self.block.zeroize();
        self.last.zeroize();
        self.block_pos = 0;
        self.has_last = false;
    }
}

impl Zeroize for CipherStream {
    /// Finalizes the stream without output, wiping all state including the tag.
    #[inline]
    fn zeroize(&mut self) {
        self.wipe();
        self.tag.zeroize();
        self.tag_len = 0;
    }
}

impl Drop for CipherStream {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}
