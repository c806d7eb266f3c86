//! Avatar gradient assignment.
//!
//! Purely decorative: each user gets a fixed gradient pair picked from a
//! curated palette by hashing a stable seed (the username), so the same
//! user always renders the same colors. No process-global randomness.

/// Curated gradient pairs from the reference design.
const PALETTE: &[(&str, &str)] = &[
    ("#FFA500", "#FF4500"),
    ("#87CEEB", "#1E90FF"),
    ("#FFD700", "#32CD32"),
    ("#FFDAB9", "#FF6347"),
    ("#FFB6C1", "#8A2BE2"),
    ("#FFD700", "#FF4500"),
    ("#B0C4DE", "#708090"),
    ("#00CED1", "#20B2AA"),
    ("#DDA0DD", "#4169E1"),
    ("#00FFFF", "#3CB371"),
    ("#FFFACD", "#9370DB"),
    ("#4169E1", "#FF8C00"),
];

/// Deterministic gradient pair for a seed string.
pub fn gradient_for_seed(seed: &str) -> (&'static str, &'static str) {
    let mut hash: usize = 0;
    for c in seed.chars() {
        hash = (hash.wrapping_mul(31).wrapping_add(c as usize)) % PALETTE.len();
    }
    PALETTE[hash % PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_gradient() {
        assert_eq!(gradient_for_seed("alice"), gradient_for_seed("alice"));
    }

    #[test]
    fn gradient_comes_from_the_palette() {
        let pair = gradient_for_seed("bob");
        assert!(PALETTE.contains(&pair));
    }
}
