//! Sample range regression test
//!
//! 12-bit data is stored in 16-bit samples, so values of 4096 and above
//! can appear. With checking on they are reported; with checking off they
//! are left out of the counts.

use histoscan_core::{
    Error, HistogramRequest, ImageView, MaskView, RayonPool, ScanOptions, Sequential, histogram,
};
use histoscan_test::{RegParams, random_samples};

fn unchecked() -> ScanOptions {
    ScanOptions {
        check_samples: false,
        ..ScanOptions::default()
    }
}

#[test]
fn range_check_reg() {
    let mut rp = RegParams::new("range_check");

    let mut data = random_samples(10 * 10, 4095u16, 91).unwrap();
    data[3 * 10 + 7] = 5000;
    let image = ImageView::from_shape(&data, &[10, 10]).unwrap();

    eprintln!("=== checked ===");
    let err = HistogramRequest::new(image).bits(12).compute(&Sequential);
    let expected_err = Error::SampleOutOfRange {
        value: 5000,
        bits: 12,
        row: 3,
        col: 7,
        component: 0,
    };
    rp.compare_values(1.0, (err == Err(expected_err)) as u8 as f64, 0.0);

    eprintln!("=== offending pixel masked out ===");
    let mut keep = vec![1u8; 100];
    keep[37] = 0;
    let mask = MaskView::new(&keep, 10, 10).unwrap();
    let hist = HistogramRequest::new(image)
        .bits(12)
        .mask(mask)
        .compute(&Sequential)
        .unwrap();
    rp.compare_values(99.0, hist.total(0) as f64, 0.0);

    eprintln!("=== unchecked drops the sample ===");
    let hist = HistogramRequest::new(image)
        .bits(12)
        .options(unchecked())
        .compute(&Sequential)
        .unwrap();
    rp.compare_values(99.0, hist.total(0) as f64, 0.0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(2)
        .build()
        .unwrap();
    let threaded = ScanOptions {
        parallel_threshold: 0,
        ..unchecked()
    };
    let hist_mt = HistogramRequest::new(image)
        .bits(12)
        .options(threaded)
        .compute(&RayonPool::new(&pool))
        .unwrap();
    rp.compare_histograms(&hist, &hist_mt);

    eprintln!("=== unselected component ===");
    let mut rgb = random_samples(6 * 6 * 3, 4095u16, 92).unwrap();
    rgb[(2 * 6 + 4) * 3 + 2] = u16::MAX;
    let image = ImageView::from_shape(&rgb, &[6, 6, 3]).unwrap();
    let ok = HistogramRequest::new(image)
        .bits(12)
        .components(&[0, 1])
        .compute(&Sequential);
    rp.compare_values(1.0, ok.is_ok() as u8 as f64, 0.0);
    let err = HistogramRequest::new(image)
        .bits(12)
        .components(&[0, 2])
        .compute(&Sequential);
    rp.compare_values(
        1.0,
        matches!(
            err,
            Err(Error::SampleOutOfRange {
                row: 2,
                col: 4,
                component: 2,
                ..
            })
        ) as u8 as f64,
        0.0,
    );

    eprintln!("=== full-range depths never fail ===");
    let data = [u16::MAX; 8];
    let image = ImageView::from_shape(&data, &[2, 4]).unwrap();
    let hist = histogram(image, 16).unwrap();
    rp.compare_values(8.0, hist[65535] as f64, 0.0);
    let bytes = [u8::MAX; 8];
    let image = ImageView::from_shape(&bytes, &[8]).unwrap();
    let hist = histogram(image, 8).unwrap();
    rp.compare_values(8.0, hist[255] as f64, 0.0);

    assert!(rp.cleanup());
}
