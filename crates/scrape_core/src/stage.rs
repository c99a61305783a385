/// Worker state machine. A worker cycles
/// `Idle -> Dequeuing -> RateLimitWait -> Fetching -> Extracting -> Recording -> Idle`
/// and exits once the queue is closed and drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Dequeuing,
    RateLimitWait,
    Fetching,
    Extracting,
    Recording,
    Exited,
}
