use tmcmc_core::derive_substream_seed;

/// Seed of the prior draw for population member `index` of stage 0.
pub fn population_seed(master_seed: u64, index: usize) -> u64 {
    derive_substream_seed(master_seed ^ 0x5A5A_5A5A_5A5A_5A5A, index as u64)
}

/// Seed of the Markov chain grown from leader `chain` during `stage`.
pub fn chain_seed(master_seed: u64, stage: usize, chain: usize) -> u64 {
    derive_substream_seed(master_seed, (stage as u64) << 32 | chain as u64)
}

/// Seed of the multinomial selection closing `stage`.
pub fn resample_seed(master_seed: u64, stage: usize) -> u64 {
    derive_substream_seed(master_seed ^ 0xA5A5_A5A5_A5A5_A5A5, stage as u64)
}
