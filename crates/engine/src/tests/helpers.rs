use crate::Engine;
use block::Score;

pub fn s(v: i64) -> Score {
    Score::new(v).unwrap()
}

pub fn ip(text: &str) -> u32 {
    addr::parse_ipv4(text).unwrap()
}

/// Small stripe count so tests exercise stripe sharing.
pub fn engine() -> Engine {
    Engine::with_stripes(4).unwrap()
}

/// Collects every non-zero entry, sorted by address.
pub fn snapshot(engine: &Engine) -> Vec<(u32, i16)> {
    engine.scores().map(|(a, sc)| (a, sc.get())).collect()
}

/// `count()` must always equal the number of non-zero entries.
pub fn assert_count_consistent(engine: &Engine) {
    assert_eq!(engine.count(), engine.scores().count() as u64);
}
