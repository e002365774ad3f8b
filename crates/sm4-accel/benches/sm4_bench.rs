use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use sm4_accel::{Sm4Accel, Sm4Key};

const LEN: usize = 4096;

/// The selected kernel, plus the portable one when they differ.
fn kernels_under_test() -> Vec<Sm4Accel> {
    let selected = Sm4Accel::new();
    let portable = Sm4Accel::portable();
    if selected.kernel_name() == portable.kernel_name() {
        vec![selected]
    } else {
        vec![selected, portable]
    }
}

fn bench_modes(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
    let mut key_bytes = [0u8; 16];
    rng.fill_bytes(&mut key_bytes);
    let key = Sm4Key::from(key_bytes);

    for accel in kernels_under_test() {
        let enc = accel.derive_enc(&key).expect("enc");
        let dec = accel.derive_dec(&key).expect("dec");
        let tweak = accel.derive_enc(&Sm4Key::from([7u8; 16])).expect("tweak");
        let mut data = vec![0u8; LEN];
        rng.fill_bytes(&mut data);

        let mut group = c.benchmark_group(accel.kernel_name());
        group.throughput(Throughput::Bytes(LEN as u64));
        group.bench_function("ecb", |b| {
            b.iter(|| accel.ecb_in_place(&enc, &mut data).expect("ecb"));
        });
        group.bench_function("cbc_decrypt", |b| {
            let mut iv = [0u8; 16];
            b.iter(|| accel.cbc_decrypt_in_place(&dec, &mut data, &mut iv).expect("cbc"));
        });
        group.bench_function("ctr", |b| {
            let mut iv = [0u8; 16];
            b.iter(|| accel.ctr_crypt_in_place(&enc, &mut data, &mut iv).expect("ctr"));
        });
        group.bench_function("xts_encrypt", |b| {
            b.iter(|| {
                let mut iv = [0u8; 16];
                accel
                    .xts_encrypt_in_place(&enc, &tweak, &mut data, &mut iv)
                    .expect("xts")
            });
        });
        group.finish();
    }
}

fn bench_key_schedule(c: &mut Criterion) {
    let accel = Sm4Accel::new();
    let key = Sm4Key::from([0u8; 16]);
    let mut group = c.benchmark_group("key_schedule");
    group.bench_function("setkey_enc", |b| {
        b.iter(|| accel.derive_enc(&key).expect("enc"));
    });
    group.finish();
}

criterion_group!(benches, bench_modes, bench_key_schedule);
criterion_main!(benches);
