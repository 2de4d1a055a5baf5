use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded shuffler for reproducible sample games
#[derive(Clone)]
pub struct ShuffleRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl ShuffleRng {
    /// Create a new ShuffleRng with an optional seed
    /// If seed is None, generates a random seed
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        ShuffleRng { rng: ChaCha8Rng::seed_from_u64(seed), seed }
    }

    /// Generator for game number `game` of a run started from `base_seed`
    pub fn for_game(base_seed: u64, game: usize) -> Self {
        Self::new(Some(base_seed.wrapping_add(game as u64)))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Random integer in [0, max)
    pub fn random_range(&mut self, max: usize) -> usize {
        self.rng.gen_range(0..max)
    }

    /// Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, cards: &mut [T]) {
        for i in (1..cards.len()).rev() {
            let j = self.random_range(i + 1);
            cards.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shuffle_reproducibility() {
        let mut library1: Vec<usize> = (0..60).collect();
        let mut library2: Vec<usize> = (0..60).collect();

        ShuffleRng::new(Some(42)).shuffle(&mut library1);
        ShuffleRng::new(Some(42)).shuffle(&mut library2);

        assert_eq!(library1, library2, "Same seed should produce same shuffle");
    }

    #[test]
    fn test_games_get_distinct_shuffles() {
        let mut first: Vec<usize> = (0..60).collect();
        let mut second: Vec<usize> = (0..60).collect();
        ShuffleRng::for_game(7, 0).shuffle(&mut first);
        ShuffleRng::for_game(7, 1).shuffle(&mut second);
        assert_ne!(first, second);
        assert_eq!(ShuffleRng::for_game(7, 3).seed(), 10);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut library: Vec<usize> = (0..40).collect();
        ShuffleRng::new(Some(123)).shuffle(&mut library);
        library.sort();
        assert_eq!(library, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn test_random_range() {
        let mut rng = ShuffleRng::new(Some(123));
        for _ in 0..1000 {
            assert!(rng.random_range(10) < 10, "random_range should be in [0, max)");
        }
    }
}
