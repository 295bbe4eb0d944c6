use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use handwave_gesture::{BBox, BufferConfig, Gesture, HandObservation, ObservationBuffer};

fn bench_buffer(c: &mut Criterion) {
    c.bench_function("swipe_left_roundtrip", |b| {
        b.iter(|| {
            let mut buf = ObservationBuffer::new(&BufferConfig::default());
            buf.append(HandObservation::new(
                Some(BBox::new(0.0, 0.0, 10.0, 10.0)),
                Some(Gesture::HandRight),
            ));
            for _ in 0..19 {
                buf.append(HandObservation::miss());
            }
            black_box(buf.append(HandObservation::new(
                Some(BBox::new(20.0, 0.0, 30.0, 10.0)),
                Some(Gesture::HandLeft),
            )))
        })
    });

    c.bench_function("miss_append_full_buffer", |b| {
        let mut buf = ObservationBuffer::new(&BufferConfig::default());
        for _ in 0..30 {
            buf.append(HandObservation::miss());
        }
        b.iter(|| black_box(buf.append(HandObservation::miss())))
    });
}

criterion_group!(benches, bench_buffer);
criterion_main!(benches);
