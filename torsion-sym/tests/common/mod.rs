#![allow(dead_code)]

use torsion_sym::{CipherKind, CipherStream, Error, Mode};
use torsion_sym::stream::{Direction, max_update_size, MAX_FINAL_SIZE};

macro_rules! h {
    ($lit:literal) => {
        hex::decode($lit).expect("[HEX] invalid test vector")
    };
}

/// The key length the stream expects, doubled for XTS.
pub const fn key_len(kind: CipherKind, mode: Mode) -> usize {
    match mode {
        Mode::Xts => 2 * kind.key_size(),
        _ => kind.key_size()
    }
}

/// A valid IV length for the pair.
pub const fn iv_len(kind: CipherKind, mode: Mode) -> usize {
    match mode {
        Mode::Raw | Mode::Ecb => 0,
        Mode::Xts | Mode::Eax => 16,
        Mode::Gcm | Mode::Ccm => 12,
        _ => kind.block_size()
    }
}

/// Whether the pair can be constructed, XTS and the counter based AEADs need 16 byte blocks.
pub const fn supported(kind: CipherKind, mode: Mode) -> bool {
    match mode {
        Mode::Xts | Mode::Gcm | Mode::Ccm => kind.block_size() == 16,
        _ => true
    }
}

/// Whether `len` bytes of input can be completed with the default padding / stealing.
pub const fn completes(kind: CipherKind, mode: Mode, len: usize) -> bool {
    match mode {
        Mode::Raw => len % kind.block_size() == 0,
        Mode::Cts | Mode::Xts => len == 0 || len >= kind.block_size(),
        _ => true
    }
}

/// Deterministic key material, distinct per byte.
pub fn material(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

pub fn stream(kind: CipherKind, mode: Mode, direction: Direction, msg_len: usize) -> CipherStream {
    let key = material(key_len(kind, mode), 0x17);
    let iv = material(iv_len(kind, mode), 0x83);

    let mut stream = CipherStream::new(kind, mode, direction, &key, &iv)
        .unwrap_or_else(|err| panic!("{kind} / {mode}: {err:?}"));

    if mode == Mode::Ccm {
        stream.set_ccm(msg_len as u64, 16, b"header").unwrap();
    } else if matches!(mode, Mode::Gcm | Mode::Eax) {
        stream.set_aad(b"header").unwrap();
    }

    stream
}

/// Feeds `input` through `stream` in `chunk` sized pieces, checking every write against the
/// predicted size.
pub fn drive(stream: &mut CipherStream, input: &[u8], chunk: usize) -> Result<Vec<u8>, Error> {
    let mut out = vec![0u8; max_update_size(input.len()) + MAX_FINAL_SIZE];
    let mut len = 0;

    for piece in input.chunks(chunk.max(1)) {
        let expected = stream.update_size(piece.len());
        let written = stream.update(piece, &mut out[len..])?;
        assert_eq!(written, expected, "update_size mismatch for {} / {}", stream.kind(), stream.mode());
        len += written;
    }

    len += stream.finalize(&mut out[len..])?;
    out.truncate(len);
    Ok(out)
}

/// Encrypts then decrypts `msg` with different chunking, returning the ciphertext.
pub fn roundtrip(kind: CipherKind, mode: Mode, msg: &[u8], enc_chunk: usize, dec_chunk: usize) -> Vec<u8> {
    let mut enc = stream(kind, mode, Direction::Encrypt, msg.len());
    let ct = drive(&mut enc, msg, enc_chunk)
        .unwrap_or_else(|err| panic!("encrypt {kind} / {mode} len {}: {err:?}", msg.len()));

    let mut dec = stream(kind, mode, Direction::Decrypt, msg.len());
    if mode.is_aead() {
        dec.set_tag(enc.get_tag().unwrap()).unwrap();
    }

    let pt = drive(&mut dec, &ct, dec_chunk)
        .unwrap_or_else(|err| panic!("decrypt {kind} / {mode} len {}: {err:?}", msg.len()));

    assert_eq!(pt, msg, "{kind} / {mode} len {}", msg.len());
    ct
}
