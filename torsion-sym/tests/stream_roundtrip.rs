#[macro_use]
pub mod common;

use common::{completes, drive, material, roundtrip, stream, supported};
use proptest::prelude::*;
use torsion_sym::{CipherKind, CipherStream, ErrorKind, Mode};
use torsion_sym::stream::{static_decrypt, static_encrypt, Direction};

const LENGTHS: [usize; 9] = [0, 1, 7, 8, 15, 16, 17, 33, 100];

#[test]
fn every_pair_roundtrips() {
    for &kind in CipherKind::all() {
        for &mode in Mode::all() {
            if !supported(kind, mode) {
                assert_eq!(
                    CipherStream::new(kind, mode, Direction::Encrypt, &[0u8; 64], &[0u8; 16])
                        .unwrap_err()
                        .kind(),
                    ErrorKind::InvalidContext,
                    "{kind} / {mode}"
                );
                continue;
            }

            for len in LENGTHS {
                if !completes(kind, mode, len) {
                    continue;
                }

                let msg = material(len, 0x5a);
                let ct = roundtrip(kind, mode, &msg, 7, 5);

                if mode.is_stream() {
                    assert_eq!(ct.len(), len, "{kind} / {mode}");
                }
            }
        }
    }
}

#[test]
fn padded_modes_grow_to_next_block() {
    for kind in [CipherKind::Aes128, CipherKind::Des] {
        let bs = kind.block_size();

        for mode in [Mode::Ecb, Mode::Cbc] {
            for len in LENGTHS {
                let ct = roundtrip(kind, mode, &material(len, 1), 3, 11);
                assert_eq!(ct.len(), (len / bs + 1) * bs, "{kind} / {mode} len {len}");
            }
        }
    }
}

#[test]
fn stealing_keeps_length() {
    for mode in [Mode::Cts, Mode::Xts] {
        for len in [16, 17, 31, 32, 33, 100] {
            let ct = roundtrip(CipherKind::Aes256, mode, &material(len, 9), 4, 16);
            assert_eq!(ct.len(), len, "{mode} len {len}");
        }
    }
}

#[test]
fn stealing_needs_a_block() {
    for mode in [Mode::Cts, Mode::Xts] {
        let mut enc = stream(CipherKind::Aes128, mode, Direction::Encrypt, 0);
        assert_eq!(
            drive(&mut enc, &[1u8; 15], 15).unwrap_err().kind(),
            ErrorKind::InvalidLength,
            "{mode}"
        );
    }
}

#[test]
fn raw_rejects_partial_blocks() {
    let mut enc = stream(CipherKind::Twofish128, Mode::Raw, Direction::Encrypt, 0);
    assert_eq!(drive(&mut enc, &[0u8; 20], 20).unwrap_err().kind(), ErrorKind::InvalidLength);
}

#[test]
fn raw_and_ecb_take_no_iv() {
    for mode in [Mode::Raw, Mode::Ecb] {
        assert_eq!(
            CipherStream::new(CipherKind::Aes128, mode, Direction::Encrypt, &[0u8; 16], &[0u8; 16])
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidContext
        );
    }
}

#[test]
fn padded_decrypt_without_blocks() {
    for mode in [Mode::Ecb, Mode::Cbc] {
        let mut dec = stream(CipherKind::Camellia128, mode, Direction::Decrypt, 0);
        assert_eq!(drive(&mut dec, &[], 1).unwrap_err().kind(), ErrorKind::PaddingError);
    }
}

#[test]
fn tampered_aead_rejected() {
    for (kind, mode) in [
        (CipherKind::Aes128, Mode::Gcm),
        (CipherKind::Serpent256, Mode::Ccm),
        (CipherKind::Cast5, Mode::Eax),
        (CipherKind::Aes192, Mode::Eax)
    ] {
        let key = material(kind.key_size(), 3);
        let iv = [0x42u8; 12];

        let mut sealed = static_encrypt(kind, mode, &key, &iv, b"a fairly short message").unwrap();
        assert_eq!(
            static_decrypt(kind, mode, &key, &iv, &sealed).unwrap(),
            b"a fairly short message"
        );

        sealed[3] ^= 0x80;
        assert_eq!(
            static_decrypt(kind, mode, &key, &iv, &sealed).unwrap_err().kind(),
            ErrorKind::TagMismatch,
            "{kind} / {mode}"
        );
    }
}

#[test]
fn lifecycle_is_one_way() {
    let mut enc = stream(CipherKind::Aes128, Mode::Gcm, Direction::Encrypt, 0);
    let mut out = [0u8; 32];

    enc.update(b"data", &mut out).unwrap();
    assert_eq!(enc.set_aad(b"late").unwrap_err().kind(), ErrorKind::InvalidState);
    assert_eq!(enc.get_tag().unwrap_err().kind(), ErrorKind::InvalidState);

    enc.finalize(&mut out).unwrap();
    assert!(enc.is_finalized());
    assert_eq!(enc.get_tag().unwrap().len(), 16);
    assert_eq!(enc.update(b"more", &mut out).unwrap_err().kind(), ErrorKind::InvalidState);
    assert_eq!(enc.finalize(&mut out).unwrap_err().kind(), ErrorKind::InvalidState);
}

#[test]
fn short_final_output_keeps_stream() {
    let mut enc = stream(CipherKind::Aes128, Mode::Cbc, Direction::Encrypt, 0);
    let mut out = [0u8; 32];

    enc.update(b"twelve bytes", &mut out).unwrap();
    assert_eq!(enc.finalize(&mut out[..8]).unwrap_err().kind(), ErrorKind::InvalidLength);
    assert!(!enc.is_finalized());
    assert_eq!(enc.finalize(&mut out).unwrap(), 16);
}

#[test]
fn unpadded_cbc_is_plain_cbc() {
    let key = [9u8; 16];
    let iv = [4u8; 16];
    let msg = material(48, 2);

    let mut enc = CipherStream::new(CipherKind::Aes128, Mode::Cbc, Direction::Encrypt, &key, &iv).unwrap();
    enc.set_padding(false).unwrap();
    let ct = drive(&mut enc, &msg, 10).unwrap();
    assert_eq!(ct.len(), 48);

    let mut direct = CipherStream::new(CipherKind::Aes128, Mode::Cbc, Direction::Encrypt, &key, &iv).unwrap();
    direct.set_padding(false).unwrap();
    let mut out = [0u8; 48];
    assert_eq!(direct.crypt(&msg, &mut out).unwrap(), 48);
    assert_eq!(direct.finalize(&mut []).unwrap(), 0);

    assert_eq!(ct, out);
}

#[test]
fn gcm_hello_world_in_two_updates() {
    let key = [0u8; 32];
    let iv = [0u8; 12];

    let mut enc = CipherStream::new(CipherKind::Aes256, Mode::Gcm, Direction::Encrypt, &key, &iv).unwrap();
    let mut ct = [0u8; 11];
    let mut len = enc.update(b"hello ", &mut ct).unwrap();
    len += enc.update(b"world", &mut ct[len..]).unwrap();
    len += enc.finalize(&mut ct[len..]).unwrap();
    assert_eq!(len, 11);

    let mut tag = [0u8; 16];
    tag.copy_from_slice(enc.get_tag().unwrap());

    let mut dec = CipherStream::new(CipherKind::Aes256, Mode::Gcm, Direction::Decrypt, &key, &iv).unwrap();
    dec.set_tag(&tag).unwrap();
    let mut pt = [0u8; 11];
    let n = dec.update(&ct, &mut pt).unwrap();
    assert_eq!(dec.finalize(&mut pt[n..]).unwrap(), 0);
    assert_eq!(&pt, b"hello world");

    tag[5] ^= 1;
    let mut dec = CipherStream::new(CipherKind::Aes256, Mode::Gcm, Direction::Decrypt, &key, &iv).unwrap();
    dec.set_tag(&tag).unwrap();
    dec.update(&ct, &mut pt).unwrap();
    assert_eq!(dec.finalize(&mut []).unwrap_err().kind(), ErrorKind::TagMismatch);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn chunking_is_invisible(
        kind in prop::sample::select(CipherKind::all().as_slice()),
        mode in prop::sample::select(Mode::all().as_slice()),
        msg in prop::collection::vec(any::<u8>(), 0..200),
        chunk in 1usize..40
    ) {
        prop_assume!(supported(kind, mode) && completes(kind, mode, msg.len()));

        let mut whole = stream(kind, mode, Direction::Encrypt, msg.len());
        let expected = drive(&mut whole, &msg, msg.len()).unwrap();

        let ct = roundtrip(kind, mode, &msg, chunk, chunk + 3);
        prop_assert_eq!(ct, expected);
    }
}
