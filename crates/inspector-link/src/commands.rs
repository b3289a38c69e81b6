//! Command method names the engine issues over the link.

/// Mandatory: subscribe the target's network event channel.
pub const NETWORK_ENABLE: &str = "net.enable";
/// Begin trace capture.
pub const TRACE_START: &str = "trace.start";
/// End trace capture; trailing `trace.data` events may still arrive.
pub const TRACE_END: &str = "trace.end";
/// Cache-bypassing reload.
pub const RELOAD_BYPASS_CACHE: &str = "page.hardReload";
/// Plain reload, the coarser fallback.
pub const RELOAD: &str = "page.reload";
/// Query the target's current URL and title.
pub const PAGE_INFO: &str = "page.info";
