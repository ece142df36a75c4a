//! Encoder configuration: parameter setters, validation, and the derived fields
//! (`partition_order`, `verbatim_subframe_len`) every other module reads.

use super::error::{config_error, EncodeError};
use super::Result;

/// Bytes of caller-supplied working memory an encoder configured for `blocksize` needs, aligned
/// so the five residual buffers each start on a 16-byte boundary.
pub fn size_memory(blocksize: u32) -> usize {
    let res_len = ((15u32 + blocksize * 8) & 0xFFFF_FFF0) as usize;
    15 + 5 * res_len
}

/// Worst-case number of bytes a single frame can occupy: 18 bytes of header/footer overhead,
/// the raw sample payload, and one subframe-header byte per channel.
pub fn size_frame(blocksize: u32, channels: u32, bitdepth: u32) -> usize {
    let bits = blocksize as u64 * channels as u64 * bitdepth as u64;
    18 + (bits / 8) as usize + if bits % 8 != 0 { 1 } else { 0 } + channels as usize
}

/// STREAMINFO is always exactly 38 bytes: 4 of metadata-block header, 34 of payload.
pub fn size_streaminfo() -> usize {
    38
}

fn verbatim_subframe_len(blocksize: u32, bitdepth: u32) -> u32 {
    let bits = blocksize as u64 * bitdepth as u64;
    (1 + bits / 8 + if bits % 8 != 0 { 1 } else { 0 }) as u32
}

/// Encoder configuration. Setters are cheap field assignments; ranges are only enforced when
/// [`Config::validate`] is called, mirroring the split between plain setters and a single
/// validating entry point this encoder's lineage already uses.
#[derive(Debug, Clone)]
pub struct Config {
    pub blocksize: u32,
    pub samplerate: u32,
    pub channels: u32,
    pub bitdepth: u32,
    pub min_partition_order: u8,
    pub max_partition_order: u8,
    pub max_rice_value: u8,
    pub enable_constant_subframe: bool,
    pub enable_fixed_subframe: bool,
    pub enable_md5: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            blocksize: 4096,
            samplerate: 44100,
            channels: 2,
            bitdepth: 16,
            min_partition_order: 0,
            max_partition_order: 6,
            max_rice_value: 0,
            enable_constant_subframe: true,
            enable_fixed_subframe: true,
            enable_md5: true,
        }
    }
}

/// Parameters derived from a validated [`Config`]; recomputed whenever the block size a caller
/// passes to an `encode_*` call differs from the one last validated against.
#[derive(Debug, Clone, Copy)]
pub struct Derived {
    pub partition_order: u8,
    pub verbatim_subframe_len: u32,
    pub res_len: usize,
    pub cur_blocksize: u32,
}

impl Config {
    /// Validates all ranges, resolves `max_rice_value`'s default, and computes the derived
    /// fields for `self.blocksize`. Does not touch `working_memory` beyond checking its length;
    /// layout of the residual scratch buffers within it is the caller's (the encoder's) concern.
    pub fn validate(&mut self, working_memory_len: usize) -> Result<Derived> {
        if self.blocksize < 16 || self.blocksize > 65535 {
            return config_error("blocksize must be in 16..=65535");
        }
        if self.samplerate == 0 || self.samplerate > 655_350 {
            return config_error("samplerate must be in 1..=655350");
        }
        if self.channels == 0 || self.channels > 8 {
            return config_error("channels must be in 1..=8");
        }
        if self.bitdepth == 0 || self.bitdepth > 32 {
            return config_error("bitdepth must be in 1..=32");
        }
        if self.max_rice_value == 0 {
            self.max_rice_value = if self.bitdepth <= 16 { 14 } else { 30 };
        } else if self.max_rice_value > 30 {
            return config_error("max_rice_value must be <= 30");
        }
        if self.max_partition_order > 15 {
            return config_error("max_partition_order must be <= 15");
        }
        if self.min_partition_order > self.max_partition_order {
            return config_error("min_partition_order must be <= max_partition_order");
        }
        if working_memory_len < size_memory(self.blocksize) {
            return Err(EncodeError::InvalidConfiguration(
                "working memory smaller than size_memory(blocksize)",
            ));
        }

        Ok(self.derive_for(self.blocksize))
    }

    pub(crate) fn derive_for(&self, blocksize: u32) -> Derived {
        let mut partition_order = self.min_partition_order;
        while blocksize % (1 << (partition_order + 1)) == 0 && partition_order < self.max_partition_order {
            partition_order += 1;
        }
        let res_len = ((15u32 + blocksize * 8) & 0xFFFF_FFF0) as usize;
        Derived {
            partition_order,
            verbatim_subframe_len: verbatim_subframe_len(blocksize, self.bitdepth),
            res_len,
            cur_blocksize: blocksize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_memory_matches_formula() {
        // blocksize 4096: res_len = (15 + 32768) & !15 = 32775 & !15 = 32768
        assert_eq!(size_memory(4096), 15 + 5 * 32768);
    }

    #[test]
    fn size_frame_matches_formula() {
        assert_eq!(size_frame(4096, 2, 16), 18 + (4096 * 2 * 16) / 8 + 2);
    }

    #[test]
    fn default_rice_value_resolved_on_validate() {
        let mut c = Config {
            bitdepth: 16,
            ..Config::default()
        };
        let mut mem = vec![0u8; size_memory(c.blocksize)];
        c.validate(mem.len()).unwrap();
        assert_eq!(c.max_rice_value, 14);

        mem.clear();
        let mut c2 = Config {
            bitdepth: 24,
            max_rice_value: 0,
            ..Config::default()
        };
        let mem2 = vec![0u8; size_memory(c2.blocksize)];
        c2.validate(mem2.len()).unwrap();
        assert_eq!(c2.max_rice_value, 30);
    }

    #[test]
    fn rejects_bad_ranges() {
        let mut c = Config {
            blocksize: 4,
            ..Config::default()
        };
        assert!(c.validate(1 << 20).is_err());

        let mut c = Config {
            min_partition_order: 5,
            max_partition_order: 2,
            ..Config::default()
        };
        assert!(c.validate(1 << 20).is_err());
    }

    #[test]
    fn partition_order_search_matches_reference() {
        let c = Config {
            blocksize: 4096,
            min_partition_order: 0,
            max_partition_order: 6,
            ..Config::default()
        };
        let derived = c.derive_for(4096);
        // 4096 is divisible by 2^7=128, so the search climbs to the max allowed, 6.
        assert_eq!(derived.partition_order, 6);
    }

    #[test]
    fn partition_order_search_stops_at_non_divisor() {
        let c = Config {
            blocksize: 17,
            min_partition_order: 0,
            max_partition_order: 6,
            ..Config::default()
        };
        let derived = c.derive_for(17);
        assert_eq!(derived.partition_order, 0);
    }
}
