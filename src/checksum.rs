//! 체크섬 계산과 손상 시뮬레이션

use std::num::FpCategory;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 페이로드 체크섬 (CRC-32)
///
/// `corrupt`가 true면 CRC의 비트 반전을 반환하므로 절대 검증을 통과하지 못함
pub fn checksum(payload: &[u8], corrupt: bool) -> u32 {
    let crc = crc32fast::hash(payload);
    if corrupt {
        !crc
    } else {
        crc
    }
}

/// 체크섬 검증
pub fn validate(payload: &[u8], checksum: u32) -> bool {
    crc32fast::hash(payload) == checksum
}

/// 확률 기반 손상 결정기
#[derive(Debug)]
pub struct CorruptionOracle {
    rng: StdRng,
}

impl CorruptionOracle {
    /// 엔트로피 기반 RNG
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// 재현 가능한 RNG
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `probability` 확률로 true
    ///
    /// 0.0은 난수를 뽑지 않고 항상 false
    pub fn should_corrupt(&mut self, probability: f32) -> bool {
        if probability.classify() == FpCategory::Zero {
            return false;
        }

        self.rng.gen::<f32>() <= probability
    }
}

impl Default for CorruptionOracle {
    fn default() -> Self {
        Self::new()
    }
}
