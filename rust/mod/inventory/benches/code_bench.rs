use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use granthalaya_inventory::code::{classify, encode, generate_code, Key, ProductType, ScanClassifier, ScanKind};

fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_code", |b| {
        let mut seq = 0u64;
        b.iter(|| {
            seq += 1;
            generate_code(
                black_box(ProductType::Samagri),
                black_box("Panchagavya Puja Kit (Large)"),
                Some(seq),
            )
            .unwrap()
        });
    });
}

fn bench_classify(c: &mut Criterion) {
    let qr = encode(ScanKind::Product, "GG-BK-GITA-00101");
    c.bench_function("classify_plain_code", |b| {
        b.iter(|| classify(black_box("gg-bk-gita-00101")))
    });
    c.bench_function("classify_qr_payload", |b| b.iter(|| classify(black_box(&qr))));
}

fn bench_scanner_burst(c: &mut Criterion) {
    let qr = encode(ScanKind::Product, "GG-SM-PANCHAGAVYA-KIT-00012");
    c.bench_function("scanner_burst_qr", |b| {
        let mut scanner = ScanClassifier::default();
        b.iter(|| {
            let mut at = Instant::now();
            for ch in qr.chars() {
                scanner.handle_key(Key::Char(ch), at);
                at += Duration::from_millis(2);
            }
            scanner.handle_key(Key::Enter, at).unwrap()
        });
    });
}

criterion_group!(benches, bench_generate, bench_classify, bench_scanner_burst);
criterion_main!(benches);
