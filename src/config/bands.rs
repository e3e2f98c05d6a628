//! Medium-wave carrier table.
//!
//! The beacon transmits upper sideband, so the carrier the delay line has to
//! hit sits half a sample rate below the station frequency the receiver is
//! tuned to. `FrequencyTable` keeps the station list untouched and applies
//! the shift on lookup.

/// Station frequencies the calibration may land on, in Hz.
///
/// Nothing special about these, they are channels a domestic AM receiver
/// tunes without trouble. Order matters: earlier entries win ties.
pub static MW_CARRIERS: [f32; 80] = [
    531_000.0, 540_000.0, 549_000.0, 558_000.0, 567_000.0, 576_000.0, 585_000.0, 594_000.0,
    603_000.0, 612_000.0, 621_000.0, 630_000.0, 639_000.0, 648_000.0, 651_000.0, 666_000.0,
    675_000.0, 684_000.0, 693_000.0, 702_000.0, 711_000.0, 720_000.0, 729_000.0, 738_000.0,
    747_000.0, 756_000.0, 765_000.0, 774_000.0, 783_000.0, 792_000.0, 801_000.0, 810_000.0,
    819_000.0, 828_000.0, 837_000.0, 846_000.0, 855_000.0, 864_000.0, 873_000.0, 882_000.0,
    891_000.0, 900_000.0, 909_000.0, 918_000.0, 927_000.0, 936_000.0, 945_000.0, 954_000.0,
    963_000.0, 972_000.0, 981_000.0, 981_000.0, 989_000.0, 990_000.0, 999_000.0, 1_008_000.0,
    1_017_000.0, 1_026_000.0, 1_035_000.0, 1_044_000.0, 1_053_000.0, 1_062_000.0, 1_071_000.0, 1_080_000.0,
    1_089_000.0, 1_098_000.0, 1_107_000.0, 1_115_000.0, 1_116_000.0, 1_125_000.0, 1_134_000.0, 1_143_000.0,
    1_152_000.0, 1_161_000.0, 1_170_000.0, 1_179_000.0, 1_188_000.0, 1_197_000.0, 1_206_000.0, 1_215_000.0,
];

/// Ordered carrier targets with the sideband shift applied.
#[derive(Clone, Copy, Debug)]
pub struct FrequencyTable<'a> {
    carriers: &'a [f32],
    shift_hz: f32,
}

impl<'a> FrequencyTable<'a> {
    /// Table for a given sample rate (targets sit `sample_rate / 2` below
    /// each carrier).
    pub fn new(carriers: &'a [f32], sample_rate: u32) -> Self {
        Self::with_shift(carriers, sample_rate as f32 / 2.0)
    }

    /// Table with an explicit shift. A shift of zero means the entries are
    /// already targets.
    pub const fn with_shift(carriers: &'a [f32], shift_hz: f32) -> Self {
        Self { carriers, shift_hz }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.carriers.len()
    }

    /// True if the table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty()
    }

    /// Shift subtracted from every carrier.
    #[inline]
    pub fn shift_hz(&self) -> f32 {
        self.shift_hz
    }

    /// Station frequency at `index`, as listed.
    #[inline]
    pub fn carrier(&self, index: usize) -> Option<f32> {
        self.carriers.get(index).copied()
    }

    /// Frequency the delay line has to produce for entry `index`.
    #[inline]
    pub fn target(&self, index: usize) -> Option<f32> {
        self.carrier(index).map(|f| f - self.shift_hz)
    }

    /// All targets in table order.
    pub fn targets(&self) -> impl Iterator<Item = f32> + '_ {
        self.carriers.iter().map(move |f| f - self.shift_hz)
    }
}
