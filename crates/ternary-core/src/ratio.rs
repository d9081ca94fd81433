//! 整数配比
//!
//! 把组成分数转换为最简整数比（如 0.5 / 0.25 / 0.25 -> 2:1:1）。
//!
//! 采用分级搜索：先用小分母逼近（过滤 0.500005 这类噪声），
//! 精度不够时逐级放宽分母上限，最后退化为定倍数缩放取整。

use crate::math::EPSILON_ZERO;

/// 重新计算的比例与原值的最大允许偏差
pub const RATIO_TOLERANCE: f64 = 1e-4;

/// 分母上限的分级
const DENOMINATOR_TIERS: [u64; 3] = [100, 10_000, 1_000_000];

/// 兜底缩放倍数
const FALLBACK_SCALE: f64 = 100_000.0;

/// 求最简整数比
///
/// 空输入返回空；全零（或和为零）返回同长度的零。
pub fn find_integer_ratio(values: &[f64]) -> Vec<u64> {
    if values.is_empty() {
        return Vec::new();
    }

    let total: f64 = values.iter().map(|v| v.abs()).sum();
    if !total.is_finite() || total < EPSILON_ZERO {
        return vec![0; values.len()];
    }

    let normalized: Vec<f64> = values.iter().map(|v| v.abs() / total).collect();

    for limit in DENOMINATOR_TIERS {
        if let Some(ratio) = ratio_with_limit(&normalized, limit) {
            if matches_within_tolerance(&normalized, &ratio) {
                return ratio;
            }
        }
    }

    fallback_scaling(&normalized)
}

fn ratio_with_limit(normalized: &[f64], limit: u64) -> Option<Vec<u64>> {
    let fractions: Vec<(u64, u64)> = normalized
        .iter()
        .map(|v| limit_denominator(*v, limit))
        .collect();

    let common = fractions
        .iter()
        .try_fold(1u64, |acc, (_, den)| lcm(acc, *den))?;

    let integers = fractions
        .iter()
        .map(|(num, den)| num.checked_mul(common / den))
        .collect::<Option<Vec<u64>>>()?;

    if integers.iter().all(|i| *i == 0) {
        return None;
    }
    Some(reduce(integers))
}

fn matches_within_tolerance(normalized: &[f64], ratio: &[u64]) -> bool {
    let sum: u64 = ratio.iter().sum();
    if sum == 0 {
        return false;
    }
    normalized
        .iter()
        .zip(ratio)
        .all(|(orig, int)| (orig - *int as f64 / sum as f64).abs() <= RATIO_TOLERANCE)
}

fn fallback_scaling(normalized: &[f64]) -> Vec<u64> {
    let mut ints: Vec<i64> = normalized
        .iter()
        .map(|v| (v * FALLBACK_SCALE).round() as i64)
        .collect();

    // 取整后总和可能不是 SCALE，差值补到最大的分量上
    let diff = FALLBACK_SCALE as i64 - ints.iter().sum::<i64>();
    if diff != 0 {
        if let Some(max) = ints.iter_mut().max_by_key(|v| **v) {
            *max = (*max + diff).max(0);
        }
    }

    reduce(ints.into_iter().map(|v| v.max(0) as u64).collect())
}

/// 最佳有理逼近（连分数），分母不超过 `max_den`
fn limit_denominator(value: f64, max_den: u64) -> (u64, u64) {
    let (mut p0, mut q0, mut p1, mut q1) = (0u64, 1u64, 1u64, 0u64);
    let mut x = value;

    loop {
        let a = x.floor() as u64;
        let Some(q2) = a.checked_mul(q1).and_then(|v| v.checked_add(q0)) else {
            break;
        };
        if q2 > max_den {
            break;
        }
        let Some(p2) = a.checked_mul(p1).and_then(|v| v.checked_add(p0)) else {
            break;
        };
        (p0, q0, p1, q1) = (p1, q1, p2, q2);

        let frac = x - x.floor();
        if frac < 1e-12 {
            return (p1, q1);
        }
        x = 1.0 / frac;
    }

    if q1 == 0 {
        return (0, 1);
    }

    // 半收敛项与最后一个收敛项中取更接近的
    let k = (max_den - q0) / q1;
    let (bn, bd) = (p0 + k * p1, q0 + k * q1);
    let err_last = (p1 as f64 / q1 as f64 - value).abs();
    let err_semi = (bn as f64 / bd as f64 - value).abs();
    if err_last <= err_semi {
        (p1, q1)
    } else {
        (bn, bd)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: u64, b: u64) -> Option<u64> {
    if a == 0 || b == 0 {
        return Some(a.max(b));
    }
    (a / gcd(a, b)).checked_mul(b)
}

/// 除以所有非零项的最大公约数
fn reduce(ints: Vec<u64>) -> Vec<u64> {
    let common = ints.iter().filter(|v| **v != 0).fold(0, |acc, v| gcd(acc, *v));
    if common > 1 {
        ints.into_iter().map(|v| v / common).collect()
    } else {
        ints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_ratios() {
        assert_eq!(find_integer_ratio(&[0.5, 0.5]), vec![1, 1]);
        assert_eq!(find_integer_ratio(&[0.5, 0.25, 0.25]), vec![2, 1, 1]);
        assert_eq!(find_integer_ratio(&[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]), vec![1, 1, 1]);
        assert_eq!(find_integer_ratio(&[0.6, 0.4, 0.0]), vec![3, 2, 0]);
    }

    #[test]
    fn test_noise_is_simplified() {
        assert_eq!(find_integer_ratio(&[0.500005, 0.499995]), vec![1, 1]);
    }

    #[test]
    fn test_precise_ratio() {
        // 200:1
        assert_eq!(find_integer_ratio(&[200.0 / 201.0, 1.0 / 201.0]), vec![200, 1]);
    }

    #[test]
    fn test_unnormalized_input() {
        assert_eq!(find_integer_ratio(&[2.0, 4.0, 6.0]), vec![1, 2, 3]);
    }

    #[test]
    fn test_edge_cases() {
        assert!(find_integer_ratio(&[]).is_empty());
        assert_eq!(find_integer_ratio(&[0.0, 0.0, 0.0]), vec![0, 0, 0]);
    }

    #[test]
    fn test_limit_denominator() {
        assert_eq!(limit_denominator(0.5, 100), (1, 2));
        assert_eq!(limit_denominator(0.0, 100), (0, 1));
        assert_eq!(limit_denominator(1.0, 100), (1, 1));
        let (num, den) = limit_denominator(std::f64::consts::PI - 3.0, 1000);
        assert_eq!((num, den), (16, 113));
    }
}
