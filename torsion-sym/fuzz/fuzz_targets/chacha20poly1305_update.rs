#![no_main]

use libfuzzer_sys::fuzz_target;
use torsion_sym::aead::ChaCha20Poly1305;

fuzz_target!(|data: &[u8]| {
    let Some((&split, data)) = data.split_first() else { return };
    let data = &data[..data.len().min(4096)];
    let split = usize::from(split).min(data.len());

    let mut ct = [0u8; 4096];
    let mut enc = ChaCha20Poly1305::new(&[7u8; 32], &[42u8; 12]).unwrap();
    enc.aad(b"fuzz").unwrap();
    enc.encrypt(&data[..split], &mut ct[..split]).unwrap();
    enc.encrypt(&data[split..], &mut ct[split..data.len()]).unwrap();
    let tag = enc.finalize().unwrap();

    let mut pt = [0u8; 4096];
    let mut dec = ChaCha20Poly1305::new(&[7u8; 32], &[42u8; 12]).unwrap();
    dec.aad(b"fuzz").unwrap();
    dec.decrypt(&ct[..data.len()], &mut pt[..data.len()]).unwrap();

    let computed = dec.finalize().unwrap();
    assert!(ChaCha20Poly1305::verify(&computed, tag.as_slice()));
    assert_eq!(&pt[..data.len()], data);
});
