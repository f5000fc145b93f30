// Smallest table size exponent handed to halo2 (`2^k` rows)
pub(crate) const MIN_K_TABLE_SIZE: u32 = 4;

// Rows halo2 keeps for blinding factors at the end of every column, with headroom
pub(crate) const RESERVED_ROWS: usize = 10;
