use rand::Rng;

/// Scales each component by a random factor in `[1 - degree, 1 + degree)`,
/// i.e. `x + x * u` with `u` uniform in `[-degree, degree)`. Zero components
/// stay zero.
pub fn perturb<R: Rng + ?Sized>(input: &[f64], degree: f64, rng: &mut R) -> Vec<f64> {
    input
        .iter()
        .map(|&x| x + x * (degree * 2.0 * rng.gen::<f64>() - degree))
        .collect()
}
