/// Seed libtorch's generators
///
/// Without an explicit seed one is drawn from `1..10000` so the run can be
/// reproduced from the logged value.
pub fn seed_everything(seed: Option<i64>) -> i64 {
    let seed = seed.unwrap_or_else(|| rand::random_range(1..10000));
    log::info!("Random Seed: {}", seed);
    tch::manual_seed(seed);
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_seed_is_kept() {
        assert_eq!(seed_everything(Some(42)), 42);
    }

    #[test]
    fn test_drawn_seed_in_range() {
        let seed = seed_everything(None);
        assert!((1..10000).contains(&seed));
    }
}
