use secrecy::SecretString;
use sprefs_crypto::{decrypt, derive_key_pair, encrypt, KdfParams, SecretKeyPair};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

fn bench_keys() -> SecretKeyPair {
    SecretKeyPair::from_bytes([0xABu8; 32], [0xCDu8; 32])
}

#[divan::bench(args = [16, 1024, 65536])]
fn bench_encrypt(bencher: divan::Bencher, size: usize) {
    let keys = bench_keys();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| encrypt(divan::black_box(&data), divan::black_box(&keys)).unwrap());
}

#[divan::bench(args = [16, 1024, 65536])]
fn bench_decrypt(bencher: divan::Bencher, size: usize) {
    let keys = bench_keys();
    let record = encrypt(&make_data(size), &keys).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| decrypt(divan::black_box(&record), divan::black_box(&keys)).unwrap());
}

/// Default Argon2id cost, i.e. what opening a store costs.
#[divan::bench(sample_count = 5)]
fn bench_derive_default_params() {
    let passphrase = SecretString::from("benchmark passphrase");
    derive_key_pair(
        divan::black_box(&passphrase),
        divan::black_box(&[7u8; 16]),
        &KdfParams::default(),
    )
    .unwrap();
}

fn main() {
    divan::main();
}
