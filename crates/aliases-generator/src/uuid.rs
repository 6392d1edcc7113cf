use crate::Generator;
use aliases_core::Alias;

/// Generates random UUID v4 aliases in hyphenated lowercase form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl Generator for UuidGenerator {
    type Output = Alias;

    fn generate(&self) -> Self::Output {
        Alias::new(uuid::Uuid::new_v4().to_string())
    }
}
