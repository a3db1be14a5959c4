//! Conservation and mask partition regression test
//!
//! Every counted row sums to the number of included pixels, and the
//! histograms under a mask and its complement add up to the unmasked one.

use histoscan_core::{HistogramRequest, ImageView, MaskView, Sequential};
use histoscan_test::{RegParams, random_mask, random_samples, reference_histogram};

const H: usize = 53;
const W: usize = 71;

#[test]
fn conservation_reg() {
    let mut rp = RegParams::new("conservation");

    eprintln!("=== unmasked RGB ===");
    let data = random_samples(H * W * 3, 255u8, 11).unwrap();
    let image = ImageView::from_shape(&data, &[H, W, 3]).unwrap();
    let hist = HistogramRequest::new(image).compute(&Sequential).unwrap();
    for row in 0..3 {
        rp.compare_values((H * W) as f64, hist.total(row) as f64, 0.0);
    }
    let expected = reference_histogram(&image, None, &[0, 1, 2], 256);
    rp.compare_counts(&expected, hist.counts());

    eprintln!("=== masked RGB ===");
    let keep = random_mask(H * W, 0.3, 12).unwrap();
    let mask = MaskView::new(&keep, W, H).unwrap();
    let included = mask.count_included();
    eprintln!("  included pixels: {included}");
    let hist = HistogramRequest::new(image)
        .mask(mask)
        .compute(&Sequential)
        .unwrap();
    for row in 0..3 {
        rp.compare_values(included as f64, hist.total(row) as f64, 0.0);
    }
    let expected = reference_histogram(&image, Some(&mask), &[0, 1, 2], 256);
    rp.compare_counts(&expected, hist.counts());

    eprintln!("=== masked 12-bit mono ===");
    let data = random_samples(H * W, 4095u16, 13).unwrap();
    let image = ImageView::from_shape(&data, &[H, W]).unwrap();
    let hist = HistogramRequest::new(image)
        .bits(12)
        .mask(mask)
        .compute(&Sequential)
        .unwrap();
    rp.compare_values(included as f64, hist.total(0) as f64, 0.0);
    let expected = reference_histogram(&image, Some(&mask), &[0], 4096);
    rp.compare_counts(&expected, hist.counts());

    assert!(rp.cleanup());
}

#[test]
fn mask_partition_reg() {
    let mut rp = RegParams::new("mask_partition");

    let keep = random_mask(H * W, 0.5, 21).unwrap();
    let complement: Vec<u8> = keep.iter().map(|&m| u8::from(m == 0)).collect();
    let mask = MaskView::new(&keep, W, H).unwrap();
    let mask_c = MaskView::new(&complement, W, H).unwrap();

    eprintln!("=== 8-bit RGB ===");
    let data = random_samples(H * W * 3, 255u8, 22).unwrap();
    let image = ImageView::from_shape(&data, &[H, W, 3]).unwrap();
    let full = HistogramRequest::new(image).compute(&Sequential).unwrap();
    let mut parts = HistogramRequest::new(image)
        .mask(mask)
        .compute(&Sequential)
        .unwrap();
    let other = HistogramRequest::new(image)
        .mask(mask_c)
        .compute(&Sequential)
        .unwrap();
    parts.add_assign(&other).unwrap();
    rp.compare_histograms(&full, &parts);

    eprintln!("=== 16-bit RGBX, first three components ===");
    let data = random_samples(H * W * 4, u16::MAX, 23).unwrap();
    let image = ImageView::from_shape(&data, &[H, W, 4]).unwrap();
    let request = HistogramRequest::new(image).components(&[0, 1, 2]);
    let full = request.compute(&Sequential).unwrap();
    let mut parts = request.clone().mask(mask).compute(&Sequential).unwrap();
    let other = request.mask(mask_c).compute(&Sequential).unwrap();
    parts.add_assign(&other).unwrap();
    rp.compare_histograms(&full, &parts);

    assert!(rp.cleanup());
}
