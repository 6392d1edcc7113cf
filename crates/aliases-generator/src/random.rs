use crate::Generator;
use aliases_core::Alias;
use rand::Rng;

/// Generates `prefix` followed by `minlen` characters drawn uniformly, with
/// replacement, from a character set.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    prefix: String,
    chars: Vec<char>,
    minlen: usize,
}

impl RandomGenerator {
    /// Creates a generator. With an empty `chars` every alias is just
    /// `prefix`.
    pub fn new(prefix: impl Into<String>, chars: &str, minlen: usize) -> Self {
        Self {
            prefix: prefix.into(),
            chars: chars.chars().collect(),
            minlen,
        }
    }

    /// Generates an alias from the given random source.
    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> Alias {
        let mut alias = String::with_capacity(self.prefix.len() + self.minlen);
        alias.push_str(&self.prefix);
        if self.chars.is_empty() {
            return Alias::new(alias);
        }

        for _ in 0..self.minlen {
            alias.push(self.chars[rng.gen_range(0..self.chars.len())]);
        }

        Alias::new(alias)
    }
}

impl Generator for RandomGenerator {
    type Output = Alias;

    fn generate(&self) -> Self::Output {
        self.generate_with(&mut rand::thread_rng())
    }
}
