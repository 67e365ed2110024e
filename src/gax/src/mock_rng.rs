// Copyright 2025 Basecamp SDK Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A deterministic RNG for pinning backoff jitter in tests.
//!
//! The jitter draw maps one random word onto `[0, maximum_jitter]`, so a
//! fixed word pins the draw: small words yield no jitter, `u64::MAX` the
//! full jitter, and words in between scale linearly.

pub(crate) struct MockRng {
    words: Vec<u64>,
    next: usize,
}

impl MockRng {
    /// Returns `word` on every draw.
    pub fn new(word: u64) -> Self {
        Self::sequence([word])
    }

    /// Cycles through `words`, one per draw.
    pub fn sequence<I: IntoIterator<Item = u64>>(words: I) -> Self {
        let words = words.into_iter().collect::<Vec<_>>();
        assert!(!words.is_empty(), "at least one word is required");
        Self { words, next: 0 }
    }

    fn next_word(&mut self) -> u64 {
        let word = self.words[self.next % self.words.len()];
        self.next += 1;
        word
    }
}

impl rand::RngCore for MockRng {
    fn next_u32(&mut self) -> u32 {
        self.next_word() as u32
    }
    fn next_u64(&mut self) -> u64 {
        self.next_word()
    }
    fn fill_bytes(&mut self, dst: &mut [u8]) {
        rand::rand_core::impls::fill_bytes_via_next(self, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::TryRngCore;

    #[test]
    fn repeats_a_single_word() {
        let mut rng = MockRng::new(7);
        assert_eq!(rng.try_next_u64(), Ok(7));
        assert_eq!(rng.try_next_u64(), Ok(7));
    }

    #[test]
    fn cycles_through_the_sequence() {
        let mut rng = MockRng::sequence([1, u64::MAX]);
        assert_eq!(rng.try_next_u64(), Ok(1));
        assert_eq!(rng.try_next_u64(), Ok(u64::MAX));
        assert_eq!(rng.try_next_u64(), Ok(1));
    }
}
