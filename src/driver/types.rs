/// Where the poll loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Created, loop not started yet
    Initializing,
    /// Waiting for the next tick
    Idle,
    /// Reading status and energy from the meter
    Fetching,
    /// Turning the reading into an output frame
    Mapping,
    /// Writing the frame to the bus
    Publishing,
    /// Loop has been asked to stop
    ShuttingDown,
}

/// Result of one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Frame published with this update index
    Published(u8),
    /// Meter could not be read; nothing was published
    FetchFailed,
    /// Unexpected failure caught at the cycle boundary
    Aborted,
}

/// Counters since start, reported with the sign of life
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub total_cycles: u64,
    pub published: u64,
    pub fetch_failures: u64,
    pub aborted: u64,
    /// Cycles that took longer than the poll interval
    pub overruns: u64,
}
