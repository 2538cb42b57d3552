#![no_main]

use libfuzzer_sys::fuzz_target;
use torsion_sym::{CipherKind, CipherStream, Mode};
use torsion_sym::stream::{Direction, max_update_size, MAX_FINAL_SIZE};

fn encrypt(kind: CipherKind, mode: Mode, data: &[u8], chunk: usize) -> Option<Vec<u8>> {
    let key = vec![3u8; if mode == Mode::Xts { 2 * kind.key_size() } else { kind.key_size() }];
    let iv = match mode {
        Mode::Raw | Mode::Ecb => vec![],
        Mode::Gcm | Mode::Ccm => vec![9u8; 12],
        Mode::Xts | Mode::Eax => vec![9u8; 16],
        _ => vec![9u8; kind.block_size()]
    };

    let mut stream = CipherStream::new(kind, mode, Direction::Encrypt, &key, &iv).ok()?;
    if mode == Mode::Ccm {
        stream.set_ccm(data.len() as u64, 16, &[]).ok()?;
    }

    let mut out = vec![0u8; max_update_size(data.len()) + MAX_FINAL_SIZE];
    let mut len = 0;

    for piece in data.chunks(chunk) {
        let predicted = stream.update_size(piece.len());
        let written = stream.update(piece, &mut out[len..]).unwrap();
        assert_eq!(written, predicted);
        len += written;
    }

    len += stream.finalize(&mut out[len..]).ok()?;
    out.truncate(len);
    Some(out)
}

fuzz_target!(|data: &[u8]| {
    let [kind, mode, chunk, data @ ..] = data else { return };

    let Ok(kind) = CipherKind::try_from(u32::from(*kind) % 24) else { return };
    let Ok(mode) = Mode::try_from(u32::from(*mode) % 11) else { return };
    let chunk = usize::from(*chunk).max(1);

    let whole = encrypt(kind, mode, data, data.len().max(1));
    let chunked = encrypt(kind, mode, data, chunk);

    assert_eq!(whole, chunked);
});
