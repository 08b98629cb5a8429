use serde::Serialize;

/// Stage reached by the octave driver.
///
/// A run moves `Uninitialized → Blurred` once, then loops
/// `Scheduled → Stacked → Extracted → Refined → Shrunk` per octave. An octave
/// run without shrinking leaves the driver in `Refined`, which is final.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OctaveState {
    Uninitialized,
    /// Initial blur from `cur_sigma` to `init_sigma` applied.
    Blurred,
    Scheduled,
    /// DoG stack built.
    Stacked,
    /// Candidates extracted.
    Extracted,
    /// Keypoints of the octave appended.
    Refined,
    /// Image and mask halved, ready for the next octave.
    Shrunk,
}

impl OctaveState {
    /// Whether another octave may start from this state.
    pub fn can_start_octave(self) -> bool {
        matches!(self, Self::Uninitialized | Self::Blurred | Self::Shrunk)
    }
}
