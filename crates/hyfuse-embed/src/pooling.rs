//! Vector pooling helpers.

use ndarray::ArrayViewD;

/// L2 normalize a vector in place. Zero vectors are left untouched.
pub fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Mean pooling over the sequence axis of a `[batch, seq, hidden]` tensor,
/// counting only positions whose attention mask is set.
///
/// `masks` holds one row of `seq` mask values per batch entry.
pub(crate) fn mean_pool(tensor: &ArrayViewD<'_, f32>, masks: &[Vec<i64>]) -> Vec<Vec<f32>> {
    let shape = tensor.shape();
    let (seq_len, hidden_dim) = (shape[1], shape[2]);

    masks
        .iter()
        .enumerate()
        .map(|(i, mask)| {
            let mut sum = vec![0.0f32; hidden_dim];
            let mut count = 0usize;

            for (j, &m) in mask.iter().take(seq_len).enumerate() {
                if m == 0 {
                    continue;
                }
                count += 1;
                for (k, slot) in sum.iter_mut().enumerate() {
                    *slot += tensor[[i, j, k]];
                }
            }

            if count == 0 {
                return sum;
            }
            let mean = sum.into_iter().map(|s| s / count as f32).collect();
            l2_normalize(mean)
        })
        .collect()
}
