//! Recording channels of a neuron core and what they cost

use std::collections::BTreeMap;

use log::debug;

use crate::constants::{n_words_for_bits, round_up_to_words, BYTES_PER_WORD};
use crate::error::{PlanError, Result};

/// Name of the spike recording channel
pub const SPIKES: &str = "spikes";

/// Name of the packets-per-timestep recording channel
pub const PACKETS: &str = "packets-per-timestep";

/// Words of the recording region header
const RECORDING_HEADER_WORDS: u64 = 2;

/// Words the recording header keeps per channel
const RECORDING_HEADER_WORDS_PER_CHANNEL: u64 = 2;

/// Words of metadata per channel: sampling rate and number of atoms recorded
const CHANNEL_METADATA_WORDS: u64 = 2;

/// Time stamp written with every sample
const TIMESTAMP_BYTES: u64 = BYTES_PER_WORD;

/// Cycles per recorded atom per channel per tick
const N_CPU_CYCLES_PER_NEURON: u64 = 8;

/// Cycles per enabled channel per tick
const N_CPU_CYCLES_PER_CHANNEL: u64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelKind {
    Spikes,
    Packets,
    Variable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Channel {
    kind: ChannelKind,
    sampling_interval: Option<u32>,
}

/// Recording state of a neuron population
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeuronRecorder {
    channels: BTreeMap<String, Channel>,
}

impl NeuronRecorder {
    /// Create a recorder for spikes, packet counts and `variables`, all off
    pub fn new<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut channels = BTreeMap::new();
        let off = |kind| Channel {
            kind,
            sampling_interval: None,
        };
        channels.insert(SPIKES.to_string(), off(ChannelKind::Spikes));
        channels.insert(PACKETS.to_string(), off(ChannelKind::Packets));
        for v in variables {
            channels.insert(v.into(), off(ChannelKind::Variable));
        }
        Self { channels }
    }

    /// Turn recording of `name` on (every `sampling_interval` ticks) or off
    pub fn set_recording(&mut self, name: &str, enabled: bool, sampling_interval: u32) -> Result<()> {
        if enabled && sampling_interval == 0 {
            return Err(PlanError::invalid_parameter(
                "sampling_interval",
                "0",
                ">= 1 tick",
            ));
        }
        let channel = self.channels.get_mut(name).ok_or_else(|| {
            PlanError::invalid_parameter("recording", name, "a recordable variable")
        })?;
        channel.sampling_interval = enabled.then_some(sampling_interval);
        debug!("Recording of {} set to {:?}", name, channel.sampling_interval);
        Ok(())
    }

    /// Whether `name` is being recorded
    pub fn is_recording(&self, name: &str) -> bool {
        self.channels
            .get(name)
            .is_some_and(|c| c.sampling_interval.is_some())
    }

    /// Names of all channels
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    fn enabled(&self) -> impl Iterator<Item = (&Channel, u32)> {
        self.channels
            .values()
            .filter_map(|c| c.sampling_interval.map(|i| (c, i)))
    }

    fn n_enabled(&self) -> u64 {
        self.enabled().count() as u64
    }

    /// Bytes of one sample of a channel for `n_atoms` atoms
    fn sample_bytes(kind: ChannelKind, n_atoms: u32) -> u64 {
        let data = match kind {
            ChannelKind::Spikes => n_words_for_bits(u64::from(n_atoms)) * BYTES_PER_WORD,
            ChannelKind::Packets => BYTES_PER_WORD,
            ChannelKind::Variable => u64::from(n_atoms) * BYTES_PER_WORD,
        };
        TIMESTAMP_BYTES + data
    }

    /// Bytes of the recording header and per-channel metadata
    pub fn static_sdram_usage(&self, n_atoms: u32) -> u64 {
        let n_channels = self.channels.len() as u64;
        let header = (RECORDING_HEADER_WORDS + RECORDING_HEADER_WORDS_PER_CHANNEL * n_channels)
            * BYTES_PER_WORD;
        let per_channel = CHANNEL_METADATA_WORDS * BYTES_PER_WORD + round_up_to_words(u64::from(n_atoms));
        header + per_channel * n_channels
    }

    /// Bytes of recorded data over a run of `n_machine_time_steps` ticks
    pub fn variable_sdram_usage(&self, n_atoms: u32, n_machine_time_steps: u64) -> u64 {
        self.enabled()
            .map(|(c, interval)| {
                let n_samples = n_machine_time_steps.div_ceil(u64::from(interval));
                Self::sample_bytes(c.kind, n_atoms) * n_samples
            })
            .sum()
    }

    /// Working memory holding one sample of every enabled channel
    pub fn dtcm_usage_in_bytes(&self, n_atoms: u32) -> u64 {
        self.enabled()
            .map(|(c, _)| Self::sample_bytes(c.kind, n_atoms))
            .sum()
    }

    /// Cycles per tick spent recording
    pub fn n_cpu_cycles(&self, n_atoms: u32) -> u64 {
        let n = self.n_enabled();
        n * (N_CPU_CYCLES_PER_CHANNEL + N_CPU_CYCLES_PER_NEURON * u64::from(n_atoms))
    }
}
