//! Pairing code generator backed by the OS random source.

use rand::{Rng, rngs::OsRng};

use crate::domain::{
    CodeGenerator, PairingCode, value_object::PAIRING_CODE_SPACE,
};

/// Uniform over `000000..=999999`
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl RandomCodeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> PairingCode {
        PairingCode::from_number(OsRng.gen_range(0..PAIRING_CODE_SPACE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_six_digits() {
        // テスト項目: 生成されたコードは常に 6 桁の数字
        let generator = RandomCodeGenerator::new();

        for _ in 0..1000 {
            let code = generator.generate();
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }
}
