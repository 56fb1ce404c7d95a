use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use ndarray::linalg::general_mat_vec_mul;
use rand::{Rng, RngExt};
use rand::distr::Uniform;
use serde::{Deserialize, Serialize};
use sprs::CsMat;

/// Leaky-integrator echo state reservoir.
///
/// The weights are fixed after construction. State lives outside the struct so
/// that a trained reservoir can be shared read-only between predictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservoir {
    pub w_in: Array2<f64>,
    pub w_res: CsMat<f64>,
    pub leaking_rate: f64,
    pub noise_amplitude: f64,
}

impl Reservoir {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input_dim: usize,
        reservoir_size: usize,
        spectral_radius: f64,
        sparsity: f64,
        input_scaling: f64,
        leaking_rate: f64,
        noise_amplitude: f64,
        rng: &mut impl Rng,
    ) -> Self {
        // W_in: dense, Uniform[-input_scaling, +input_scaling]
        let w_in = match Uniform::new_inclusive(-input_scaling.abs(), input_scaling.abs()) {
            Ok(dist_in) => {
                Array2::from_shape_fn((reservoir_size, input_dim), |_| rng.sample(dist_in))
            }
            Err(_) => Array2::zeros((reservoir_size, input_dim)),
        };

        // W_res: sparse (sparsity fraction of zeros), non-zeros Uniform[-1, 1]
        let mut w_res =
            Array2::from_shape_fn((reservoir_size, reservoir_size), |_| {
                if rng.random::<f64>() < sparsity {
                    0.0
                } else {
                    rng.random::<f64>() * 2.0 - 1.0
                }
            });

        // Scale W_res by spectral_radius / estimated_rho (on dense matrix)
        let rho = power_iteration(&w_res, rng);
        if rho > 1e-10 {
            w_res.mapv_inplace(|x| x * spectral_radius / rho);
        }

        let n = reservoir_size;
        let mut tri = sprs::TriMat::new((n, n));
        for i in 0..n {
            for j in 0..n {
                let v = w_res[[i, j]];
                if v != 0.0 {
                    tri.add_triplet(i, j, v);
                }
            }
        }

        Reservoir {
            w_in,
            w_res: tri.to_csr(),
            leaking_rate,
            noise_amplitude,
        }
    }

    pub fn size(&self) -> usize {
        self.w_in.nrows()
    }

    pub fn input_dim(&self) -> usize {
        self.w_in.ncols()
    }

    /// Single step: h(t) = (1-a)*h(t-1) + a*tanh(W_in*x + W_res*h(t-1)).
    /// `buf` is scratch space of the reservoir size.
    pub fn step(&self, state: &mut Array1<f64>, buf: &mut Array1<f64>, input: ArrayView1<f64>) {
        general_mat_vec_mul(1.0, &self.w_in, &input, 0.0, buf);

        for (row, row_vec) in self.w_res.outer_iterator().enumerate() {
            for (col, &val) in row_vec.iter() {
                buf[row] += val * state[col];
            }
        }

        let a = self.leaking_rate;
        state.zip_mut_with(buf, |h, &pre| {
            *h = *h * (1.0 - a) + pre.tanh() * a;
        });
    }

    fn add_noise(&self, state: &mut Array1<f64>, rng: &mut impl Rng) {
        if self.noise_amplitude <= 0.0 {
            return;
        }
        if let Ok(noise) = Uniform::new_inclusive(-self.noise_amplitude, self.noise_amplitude) {
            for v in state.iter_mut() {
                *v += rng.sample(noise);
            }
        }
    }

    /// Drive a fresh (zero) state through every row of `context` and return the
    /// final state. Noise is injected only when an RNG is supplied, which the
    /// training path does and inference does not.
    pub fn final_state<R: Rng>(
        &self,
        context: ArrayView2<f64>,
        mut noise: Option<&mut R>,
    ) -> Array1<f64> {
        let mut state = Array1::zeros(self.size());
        let mut buf = Array1::zeros(self.size());
        for input in context.rows() {
            self.step(&mut state, &mut buf, input);
            if let Some(rng) = noise.as_deref_mut() {
                self.add_noise(&mut state, rng);
            }
        }
        state
    }
}

/// Estimate the spectral radius of a matrix via power iteration.
pub fn power_iteration(w: &Array2<f64>, rng: &mut impl Rng) -> f64 {
    let n = w.nrows();
    if n == 0 {
        return 0.0;
    }

    let Ok(dist) = Uniform::new_inclusive(-1.0, 1.0) else {
        return 0.0;
    };
    let mut v: Array1<f64> = Array1::from_shape_fn(n, |_| rng.sample(dist));
    let norm = v.dot(&v).sqrt();
    if norm < 1e-15 {
        return 0.0;
    }
    v /= norm;

    let mut lambda = 0.0;

    for _ in 0..200 {
        let w_v: Array1<f64> = w.dot(&v);
        let new_lambda = w_v.dot(&w_v).sqrt();
        if new_lambda < 1e-15 {
            return 0.0;
        }
        v = &w_v / new_lambda;

        if (new_lambda - lambda).abs() < 1e-10 {
            return new_lambda;
        }
        lambda = new_lambda;
    }

    lambda
}

#[cfg(test)]
fn w_res_dense(sparse: &CsMat<f64>) -> Array2<f64> {
    let (rows, cols) = sparse.shape();
    let mut dense = Array2::zeros((rows, cols));
    for (row, row_vec) in sparse.outer_iterator().enumerate() {
        for (col, &val) in row_vec.iter() {
            dense[[row, col]] = val;
        }
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_matrix_shapes() {
        let mut rng = StdRng::seed_from_u64(42);
        let r = Reservoir::new(52, 100, 0.95, 0.9, 0.1, 0.3, 1e-4, &mut rng);
        assert_eq!(r.w_in.shape(), &[100, 52]);
        assert_eq!(r.w_res.shape(), (100, 100));
        assert_eq!(r.size(), 100);
        assert_eq!(r.input_dim(), 52);
    }

    #[test]
    fn test_spectral_radius_within_tolerance() {
        let mut rng = StdRng::seed_from_u64(42);
        let target_rho = 0.95;
        let r = Reservoir::new(10, 50, target_rho, 0.8, 0.1, 0.3, 0.0, &mut rng);
        let dense = w_res_dense(&r.w_res);
        let rho = power_iteration(&dense, &mut rng);
        assert!(
            (rho - target_rho).abs() / target_rho < 0.05,
            "rho={rho}, target={target_rho}"
        );
    }

    #[test]
    fn test_sparsity() {
        let mut rng = StdRng::seed_from_u64(42);
        let sparsity = 0.9;
        let r = Reservoir::new(10, 200, 0.95, sparsity, 0.1, 0.3, 0.0, &mut rng);
        let total = (200 * 200) as f64;
        let actual_sparsity = (total - r.w_res.nnz() as f64) / total;
        assert!(
            (actual_sparsity - sparsity).abs() < 0.05,
            "actual_sparsity={actual_sparsity}, target={sparsity}"
        );
    }

    #[test]
    fn test_deterministic_seed() {
        let mut rng1 = StdRng::seed_from_u64(42);
        let r1 = Reservoir::new(10, 50, 0.95, 0.9, 0.1, 0.3, 0.0, &mut rng1);
        let mut rng2 = StdRng::seed_from_u64(42);
        let r2 = Reservoir::new(10, 50, 0.95, 0.9, 0.1, 0.3, 0.0, &mut rng2);

        assert_eq!(r1.w_in, r2.w_in);
        assert_eq!(w_res_dense(&r1.w_res), w_res_dense(&r2.w_res));
    }

    #[test]
    fn test_leaking_rate_one_full_update() {
        let mut rng = StdRng::seed_from_u64(42);
        let r = Reservoir::new(10, 20, 0.95, 0.5, 0.1, 1.0, 0.0, &mut rng);
        let context = Array2::ones((1, 10));
        let state = r.final_state(context.view(), None::<&mut StdRng>);
        // With alpha=1 from a zero state: h = tanh(W_in*x)
        let expected = r.w_in.dot(&Array1::<f64>::ones(10)).mapv(f64::tanh);
        for i in 0..20 {
            assert!((state[i] - expected[i]).abs() < 1e-12, "state[{i}]");
        }
    }

    #[test]
    fn test_leaking_rate_zero_no_update() {
        let mut rng = StdRng::seed_from_u64(42);
        let r = Reservoir::new(10, 20, 0.95, 0.5, 0.1, 0.0, 0.0, &mut rng);
        let state = r.final_state(Array2::ones((4, 10)).view(), None::<&mut StdRng>);
        assert!(state.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_final_state_is_repeatable_without_noise() {
        let mut rng = StdRng::seed_from_u64(1);
        let r = Reservoir::new(10, 30, 0.9, 0.8, 0.5, 0.3, 1e-2, &mut rng);
        let context = Array2::from_shape_fn((6, 10), |(i, j)| ((i * 10 + j) % 3) as f64);
        let a = r.final_state(context.view(), None::<&mut StdRng>);
        let b = r.final_state(context.view(), None::<&mut StdRng>);
        assert_eq!(a, b);

        let mut noise_rng = StdRng::seed_from_u64(2);
        let noisy = r.final_state(context.view(), Some(&mut noise_rng));
        assert_ne!(a, noisy);
    }

    #[test]
    fn test_sparse_step_matches_dense() {
        let mut rng = StdRng::seed_from_u64(42);
        let r = Reservoir::new(10, 50, 0.95, 0.9, 0.1, 0.3, 0.0, &mut rng);

        let context = Array2::from_shape_fn((10, 10), |(i, j)| (i * 10 + j) as f64 * 0.01);
        let sparse_state = r.final_state(context.view(), None::<&mut StdRng>);

        let w_res_d = w_res_dense(&r.w_res);
        let mut state = Array1::zeros(50);
        let a = r.leaking_rate;
        for input in context.rows() {
            let pre = r.w_in.dot(&input) + w_res_d.dot(&state);
            state = &state * (1.0 - a) + &pre.mapv(f64::tanh) * a;
        }

        for j in 0..50 {
            assert!((sparse_state[j] - state[j]).abs() < 1e-12, "dim {j}");
        }
    }

    #[test]
    fn test_power_iteration_scaled_identity() {
        let mut rng = StdRng::seed_from_u64(42);
        let rho = power_iteration(&(Array2::eye(5) * 3.0), &mut rng);
        assert!((rho - 3.0).abs() < 0.01, "rho={rho}");
    }

    #[test]
    fn test_serde_roundtrip_keeps_weights() {
        let mut rng = StdRng::seed_from_u64(3);
        let r = Reservoir::new(8, 16, 0.9, 0.7, 0.1, 0.3, 0.0, &mut rng);
        let json = serde_json::to_string(&r).unwrap();
        let back: Reservoir = serde_json::from_str(&json).unwrap();
        assert_eq!(back.w_in, r.w_in);
        assert_eq!(w_res_dense(&back.w_res), w_res_dense(&r.w_res));
    }
}
