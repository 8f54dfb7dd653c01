//! Numeric constants of the target hardware profile
//!
//! Sizes are in bytes unless the name says otherwise.

/// Size of a machine word
pub const BYTES_PER_WORD: u64 = 4;

/// Width of the fixed-point weight mantissa
pub const WEIGHT_FIXED_POINT_BITS: i32 = 16;

/// Microseconds per second
pub const MICRO_TO_SECOND_CONVERSION: f64 = 1_000_000.0;

/// Standard deviations above the mean at which the Poisson summation is cut
pub const POISSON_SIGMA_SUMMATION_LIMIT: f64 = 3.0;

/// Bound on the log-ratio in the gamma variance term; outside
/// `(-LIMIT, LIMIT)` the term is dropped.
pub const GAMMA_LOG_RATIO_LIMIT: f64 = 701.0;

/// Simulation control header every core carries
pub const SYSTEM_BYTES_REQUIREMENT: u64 = 4 * BYTES_PER_WORD;

/// Fixed DTCM per neuron core
pub const NEURON_BASE_DTCM_USAGE_IN_BYTES: u64 = 9 * BYTES_PER_WORD;

/// Fixed cycles per timer tick
pub const NEURON_BASE_N_CPU_CYCLES: u64 = 10;

/// Cycles per neuron per timer tick on top of the model cost
pub const NEURON_BASE_N_CPU_CYCLES_PER_NEURON: u64 = 22;

/// has key, key, n atoms, n synapse types, incoming spike buffer size
pub const BYTES_TILL_START_OF_GLOBAL_PARAMETERS: u64 = 5 * BYTES_PER_WORD;

/// Words of time-division multiplexing parameters in the neuron region
pub const TDMA_N_ELEMENTS: u64 = 7;

/// Words of provenance every core writes regardless of its binary
pub const PROVENANCE_SYSTEM_WORDS: u64 = 5;

/// Longest delay in timer ticks a core can apply without delay stages
pub const MAX_SUPPORTED_DELAY_TICS: u32 = 16;

/// Header words at the start of every synaptic row
pub const N_SYNAPSE_ROW_HEADER_WORDS: u64 = 3;

/// Fixed size of one on-core generator entry
pub const GENERATOR_BASE_SIZE: u64 = 17 * BYTES_PER_WORD;

/// Shared generator setup cost paid once per core
pub const SYNAPSES_BASE_GENERATOR_SDRAM_USAGE_IN_BYTES: u64 = 3 * BYTES_PER_WORD;

/// Header words before the first synaptic matrix
pub const SYNAPTIC_MATRIX_HEADER_BYTES: u64 = 2 * BYTES_PER_WORD;

/// Allocation granularity of matrix addresses in the master population table
pub const MASTER_POP_ADDRESS_SCALE: u64 = 16;

/// key, mask, start and count of one master population table entry
pub const MASTER_POP_ENTRY_SIZE_BYTES: u64 = 3 * BYTES_PER_WORD;

/// One address-list entry per matrix
pub const ADDRESS_LIST_ENTRY_SIZE_BYTES: u64 = BYTES_PER_WORD;

/// n_entries and n_addresses
pub const MASTER_POP_HEADER_BYTES: u64 = 2 * BYTES_PER_WORD;

/// Rate per tick below which a Poisson source emits at most one spike
pub const SLOW_RATE_PER_TICK_CUTOFF: f64 = 0.01;

/// One saturation in this many ticks is accepted for Poisson sources
pub const POISSON_CHANCE_TICKS: f64 = 1000.0;

/// Number of bits held per bit-field word
pub const BITS_PER_WORD: u64 = 32;

/// Round `n_bytes` up to a whole number of words
pub const fn round_up_to_words(n_bytes: u64) -> u64 {
    n_bytes.div_ceil(BYTES_PER_WORD) * BYTES_PER_WORD
}

/// Words needed to hold `n_bits` bits
pub const fn n_words_for_bits(n_bits: u64) -> u64 {
    n_bits.div_ceil(BITS_PER_WORD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up_to_words() {
        assert_eq!(round_up_to_words(0), 0);
        assert_eq!(round_up_to_words(1), 4);
        assert_eq!(round_up_to_words(4), 4);
        assert_eq!(round_up_to_words(6), 8);
    }

    #[test]
    fn test_bit_words() {
        assert_eq!(n_words_for_bits(0), 0);
        assert_eq!(n_words_for_bits(32), 1);
        assert_eq!(n_words_for_bits(33), 2);
    }
}
