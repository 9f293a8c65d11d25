use classifier::{ImagePreprocessor, LabelSet, RawScores, assemble};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Encoded gradient image for benchmarking
fn create_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut bytes, format)
        .unwrap();
    bytes.into_inner()
}

fn benchmark_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocess");

    let resolutions = [(224, 224), (640, 480), (1280, 720), (1920, 1080)];
    let preprocessor = ImagePreprocessor::default();

    for (width, height) in resolutions.iter() {
        for format in [ImageFormat::Jpeg, ImageFormat::Png] {
            let bytes = create_test_image(*width, *height, format);

            group.bench_with_input(
                BenchmarkId::new(
                    format!("{:?}", format).to_lowercase(),
                    format!("{}x{}", width, height),
                ),
                &bytes,
                |b, bytes| b.iter(|| preprocessor.preprocess(black_box(bytes)).unwrap()),
            );
        }
    }

    group.finish();
}

fn benchmark_assemble(c: &mut Criterion) {
    let labels = LabelSet::new(["cardboard", "glass", "metal", "paper", "plastic", "trash"])
        .unwrap();
    let scores = RawScores::from(vec![0.01, 0.7, 0.05, 0.04, 0.15, 0.05]);

    c.bench_function("assemble_6_classes", |b| {
        b.iter(|| assemble(black_box(&scores), black_box(&labels)).unwrap())
    });
}

criterion_group!(benches, benchmark_preprocess, benchmark_assemble);
criterion_main!(benches);
