//! Randomised round trips, streaming behaviour and register-file release.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sm4_accel::vfp::ThreadContext;
use sm4_accel::{AccelError, ContractViolation, Sm4Accel, Sm4Key};

fn random_key(rng: &mut impl RngCore) -> Sm4Key {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    Sm4Key::from(bytes)
}

fn random_bytes(rng: &mut impl RngCore, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    bytes
}

#[test]
fn block_modes_round_trip() {
    let accel = Sm4Accel::new();
    let mut rng = ChaCha20Rng::from_seed([11u8; 32]);
    for _ in 0..32 {
        let key = random_key(&mut rng);
        let enc = accel.derive_enc(&key).expect("enc");
        let dec = accel.derive_dec(&key).expect("dec");
        let blocks = rng.gen_range(1..=40);
        let plain = random_bytes(&mut rng, blocks * 16);
        let mut iv0 = [0u8; 16];
        rng.fill_bytes(&mut iv0);

        let mut buf = plain.clone();
        accel.ecb_in_place(&enc, &mut buf).expect("ecb enc");
        accel.ecb_in_place(&dec, &mut buf).expect("ecb dec");
        assert_eq!(buf, plain);

        let mut iv = iv0;
        accel.cbc_encrypt_in_place(&enc, &mut buf, &mut iv).expect("cbc enc");
        assert_eq!(iv[..], buf[buf.len() - 16..]);
        let last_cipher = iv;
        let mut iv = iv0;
        accel.cbc_decrypt_in_place(&dec, &mut buf, &mut iv).expect("cbc dec");
        assert_eq!(buf, plain);
        assert_eq!(iv, last_cipher);

        let mut counter = iv0;
        accel.ctr_crypt_in_place(&enc, &mut buf, &mut counter).expect("ctr");
        let mut counter = iv0;
        accel.ctr_crypt_in_place(&enc, &mut buf, &mut counter).expect("ctr again");
        assert_eq!(buf, plain);
    }
}

#[test]
fn xts_round_trip_for_ragged_lengths() {
    let accel = Sm4Accel::new();
    let mut rng = ChaCha20Rng::from_seed([12u8; 32]);
    for len in (16..=200).step_by(7) {
        let data_key = random_key(&mut rng);
        let tweak_key = random_key(&mut rng);
        let data_enc = accel.derive_enc(&data_key).expect("enc");
        let data_dec = accel.derive_dec(&data_key).expect("dec");
        let tweak = accel.derive_enc(&tweak_key).expect("tweak");
        let plain = random_bytes(&mut rng, len);
        let mut sector = [0u8; 16];
        sector[..8].copy_from_slice(&(len as u64).to_le_bytes());

        let mut buf = plain.clone();
        let mut iv = sector;
        accel
            .xts_encrypt_in_place(&data_enc, &tweak, &mut buf, &mut iv)
            .expect("xts enc");
        assert_ne!(buf, plain, "len {len}");
        let mut iv = sector;
        accel
            .xts_decrypt_in_place(&data_dec, &tweak, &mut buf, &mut iv)
            .expect("xts dec");
        assert_eq!(buf, plain, "len {len}");
    }
}

#[test]
fn streaming_in_pieces_matches_one_shot() {
    let accel = Sm4Accel::new();
    let mut rng = ChaCha20Rng::from_seed([13u8; 32]);
    let key = random_key(&mut rng);
    let enc = accel.derive_enc(&key).expect("enc");
    let plain = random_bytes(&mut rng, 16 * 24);
    let iv0 = [0x5cu8; 16];

    let mut whole = plain.clone();
    let mut iv = iv0;
    accel.cbc_encrypt_in_place(&enc, &mut whole, &mut iv).expect("cbc");
    let mut pieces = plain.clone();
    let mut iv = iv0;
    for piece in pieces.chunks_mut(16 * 5) {
        accel.cbc_encrypt_in_place(&enc, piece, &mut iv).expect("cbc piece");
    }
    assert_eq!(whole, pieces);

    let mut whole = plain.clone();
    let mut counter = iv0;
    accel.ctr_crypt_in_place(&enc, &mut whole, &mut counter).expect("ctr");
    let mut pieces = plain;
    let mut counter = iv0;
    for piece in pieces.chunks_mut(16 * 3) {
        accel.ctr_crypt_in_place(&enc, piece, &mut counter).expect("ctr piece");
    }
    assert_eq!(whole, pieces);
}

#[test]
fn zero_length_and_ragged_inputs_are_rejected() {
    let accel = Sm4Accel::new();
    let enc = accel.derive_enc(&Sm4Key::from([1u8; 16])).expect("enc");
    let dec = accel.derive_dec(&Sm4Key::from([1u8; 16])).expect("dec");
    let mut iv = [0u8; 16];
    let empty: &mut [u8] = &mut [];

    assert_eq!(
        accel.ecb_in_place(&enc, empty),
        Err(AccelError::Contract(ContractViolation::Empty))
    );
    assert_eq!(
        accel.cbc_decrypt_in_place(&dec, &mut [0u8; 33], &mut iv),
        Err(AccelError::Contract(ContractViolation::Misaligned { len: 33 }))
    );
    assert_eq!(
        accel.ctr_crypt(&enc, &[], &mut [], &mut iv),
        Err(AccelError::Contract(ContractViolation::Empty))
    );
    assert_eq!(
        accel.xts_decrypt_in_place(&dec, &enc, &mut [0u8; 0], &mut iv),
        Err(AccelError::Contract(ContractViolation::ShortXts { len: 0 }))
    );
    assert_eq!(iv, [0u8; 16]);
}

#[test]
fn register_file_is_free_after_every_operation() {
    let accel = Sm4Accel::new();
    let enc = accel.derive_enc(&Sm4Key::from([2u8; 16])).expect("enc");
    assert!(!ThreadContext::is_enabled());

    let mut buf = [0u8; 64];
    let mut iv = [0u8; 16];
    accel.ecb_in_place(&enc, &mut buf).expect("ecb");
    assert!(!ThreadContext::is_enabled());
    accel.ctr_crypt_in_place(&enc, &mut buf, &mut iv).expect("ctr");
    assert!(!ThreadContext::is_enabled());
    let _ = accel.ecb_in_place(&enc, &mut buf[..3]);
    assert!(!ThreadContext::is_enabled());

    // A later, unrelated acquisition starts from an idle register file.
    let guard = sm4_accel::vfp::VfpGuard::acquire(&ThreadContext).expect("acquire");
    drop(guard);
    assert!(!ThreadContext::is_enabled());
}

#[test]
fn operations_on_separate_threads_do_not_interfere() {
    let handles: Vec<_> = (0..4u8)
        .map(|seed| {
            std::thread::spawn(move || {
                let accel = Sm4Accel::new();
                let key = Sm4Key::from([seed; 16]);
                let enc = accel.derive_enc(&key).expect("enc");
                let dec = accel.derive_dec(&key).expect("dec");
                let plain = vec![seed; 16 * 64];
                let mut buf = plain.clone();
                for _ in 0..50 {
                    accel.ecb_in_place(&enc, &mut buf).expect("enc");
                    accel.ecb_in_place(&dec, &mut buf).expect("dec");
                }
                buf == plain && !ThreadContext::is_enabled()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().expect("join"));
    }
}
