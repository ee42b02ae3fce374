/// Number of receive polls a blocking wait may spend.
///
/// This is an iteration count, not wall-clock time: how long it lasts
/// depends on how fast the device can be polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    limit: u32,
}

impl PollBudget {
    pub const fn iterations(limit: u32) -> Self {
        PollBudget { limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl From<u32> for PollBudget {
    fn from(limit: u32) -> Self {
        PollBudget::iterations(limit)
    }
}
