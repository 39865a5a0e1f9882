use ankitex_core::mips::{is_pow2, plan_mip_chain};
use ankitex_core::prelude::*;

#[test]
fn chain_length_matches_log2_of_quarter_size() {
    for shift in 2..=12u32 {
        let s = 1u32 << shift;
        let levels = plan_mip_chain(s, s, u32::MAX).expect("plan");
        assert_eq!(levels.len() as u32, shift - 2 + 1, "size {s}");
    }
}

#[test]
fn chain_256_stops_at_4() {
    let levels = plan_mip_chain(256, 256, 0xFFFF).unwrap();
    let sizes: Vec<u32> = levels.iter().map(|l| l.width).collect();
    assert_eq!(sizes, vec![256, 128, 64, 32, 16, 8, 4]);
    for (i, l) in levels.iter().enumerate() {
        assert_eq!(l.index, i as u32);
        assert_eq!(l.width, l.height);
    }
}

#[test]
fn cap_truncates_chain() {
    let levels = plan_mip_chain(256, 256, 3).unwrap();
    assert_eq!(levels.len(), 3);
    assert_eq!(levels[2], MipLevel::new(2, 64, 64));

    // A cap larger than the natural chain changes nothing.
    assert_eq!(plan_mip_chain(256, 256, 9).unwrap().len(), 7);
}

#[test]
fn rectangular_chain_stops_on_shorter_edge() {
    let levels = plan_mip_chain(64, 16, u32::MAX).unwrap();
    let sizes: Vec<(u32, u32)> = levels.iter().map(|l| (l.width, l.height)).collect();
    assert_eq!(sizes, vec![(64, 16), (32, 8), (16, 4)]);
}

#[test]
fn non_power_of_two_is_rejected() {
    match plan_mip_chain(100, 128, 4) {
        Err(AnkiTexError::NotPowerOfTwo { width, height }) => {
            assert_eq!((width, height), (100, 128));
        }
        other => panic!("expected NotPowerOfTwo, got {other:?}"),
    }
    assert!(matches!(
        plan_mip_chain(0, 0, 4),
        Err(AnkiTexError::NotPowerOfTwo { .. })
    ));
}

#[test]
fn below_block_size_is_rejected() {
    let err = plan_mip_chain(2, 8, 4).unwrap_err();
    assert!(matches!(err, AnkiTexError::TooSmall { width: 2, height: 8 }));
    assert_eq!(err.category(), ErrorCategory::Validation);
}

#[test]
fn pow2_helper() {
    assert!(is_pow2(1));
    assert!(is_pow2(4096));
    assert!(!is_pow2(0));
    assert!(!is_pow2(12));
}
