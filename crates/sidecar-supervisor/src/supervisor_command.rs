/// Commands from the health monitor to the supervisor's command handler.
///
/// The monitor cannot restart the server itself: stopping the server
/// cancels the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorCommand {
    /// Restart after `failures` consecutive failed health checks
    Restart { failures: u32 },
}
