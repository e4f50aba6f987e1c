use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::{BouquetFlower, FlowerId};

/// A single rendered flower. `order` is the visual sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowerInstance {
    pub flower_id: FlowerId,
    pub group: usize,
    pub instance: usize,
    pub order: usize,
}

/// Uniformly random permutation of `[0, n)`. Not reproducible across calls.
pub fn shuffle_order(n: usize) -> Vec<usize> {
    shuffle_with(n, &mut rand::thread_rng())
}

/// Same permutation algorithm driven by a seeded generator.
pub fn shuffle_order_seeded(n: usize, seed: u64) -> Vec<usize> {
    shuffle_with(n, &mut StdRng::seed_from_u64(seed))
}

fn shuffle_with<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.gen_range(0..=i);
        order.swap(i, j);
    }
    order
}

/// Visual position of the instance at type-major index `natural`. Falls back
/// to the natural index when no order exists or it is too short.
pub fn display_order(order: &[usize], natural: usize) -> usize {
    order.get(natural).copied().unwrap_or(natural)
}

/// Expands selection entries into per-instance flowers, sorted by display
/// order. Ties keep natural order.
pub fn arrange(flowers: &[BouquetFlower], order: &[usize]) -> Vec<FlowerInstance> {
    let mut instances = Vec::new();
    let mut natural = 0usize;
    for (group, flower) in flowers.iter().enumerate() {
        for instance in 0..flower.count as usize {
            instances.push(FlowerInstance {
                flower_id: flower.id,
                group,
                instance,
                order: display_order(order, natural),
            });
            natural += 1;
        }
    }
    instances.sort_by_key(|instance| instance.order);
    instances
}
