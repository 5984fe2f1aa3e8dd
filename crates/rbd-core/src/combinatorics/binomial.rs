//! Binomial table (C5): exact 64-bit `C(n, k)` via the symmetry `C(n,k) =
//! C(n, n-k)` and interleaved GCD-factor division, so the running product
//! never carries more magnitude than the final result needs.

/// `C(n, k)`, or `0` if the true value overflows `u64` (§4.5.4). `N <= 255`
/// in this engine's regime, so overflow only ever fires as a defensive
/// check, never in practice.
pub fn binomial(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    if k == 0 {
        return 1;
    }

    // The product n*(n-1)*...*(n-k+1) divided by k! , computed by keeping a
    // mutable list of the divisors 1..=k and cancelling factors against each
    // new numerator term as we go, rather than multiplying the whole
    // numerator out first and dividing once at the end.
    let mut divisors: Vec<u64> = (1..=k).collect();
    let mut result: u64 = 1;

    for i in 0..k {
        let mut term = n - i;
        for d in divisors.iter_mut() {
            if *d <= 1 {
                continue;
            }
            let g = gcd(term, *d);
            if g > 1 {
                term /= g;
                *d /= g;
            }
        }
        result = match result.checked_mul(term) {
            Some(v) => v,
            None => return 0,
        };
    }

    result
}

fn gcd(a: u64, b: u64) -> u64 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// `[C(n, k_eff), C(n, k_eff+1), ..., C(n, n)]`. `None` if any entry
/// overflows (§4.5.4's invariant: every table value must be `> 0`).
pub fn binomial_table(n: usize, k_eff: usize) -> Option<Vec<u64>> {
    if k_eff > n {
        return Some(Vec::new());
    }
    let mut table = Vec::with_capacity(n - k_eff + 1);
    for i in k_eff..=n {
        let c = binomial(n as u64, i as u64);
        if c == 0 {
            return None;
        }
        table.push(c);
    }
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_small_values() {
        assert_eq!(binomial(5, 0), 1);
        assert_eq!(binomial(5, 5), 1);
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(5, 3), 10);
        assert_eq!(binomial(10, 3), 120);
        assert_eq!(binomial(255, 1), 255);
    }

    #[test]
    fn k_greater_than_n_is_zero() {
        assert_eq!(binomial(3, 4), 0);
    }

    #[test]
    fn is_symmetric() {
        for n in 0..20u64 {
            for k in 0..=n {
                assert_eq!(binomial(n, k), binomial(n, n - k));
            }
        }
    }

    #[test]
    fn table_covers_k_eff_through_n() {
        let table = binomial_table(5, 2).unwrap();
        assert_eq!(table, vec![binomial(5, 2), binomial(5, 3), binomial(5, 4), binomial(5, 5)]);
    }

    #[test]
    fn every_table_entry_is_nonzero_when_terms_fit_in_u64() {
        let table = binomial_table(40, 30).unwrap();
        assert!(table.iter().all(|&c| c > 0));
    }

    #[test]
    fn overflowing_terms_are_reported_as_zero() {
        // C(255, 127) vastly exceeds u64::MAX; binomial() must signal that
        // rather than silently wrapping.
        assert_eq!(binomial(255, 127), 0);
    }

    #[test]
    fn table_construction_aborts_if_any_term_overflows() {
        assert_eq!(binomial_table(255, 0), None);
    }
}
