//! Ambient behaviors exposed as commands: scripted line playback in the
//! current channel, and a periodic conversation starter. Both are thin
//! start/stop wrappers around an [`router_core::AmbientSupervisor`].

mod attract;
mod playback;

pub use attract::Attract;
pub use playback::Playback;

/// Shared `<start|stop>` argument parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    Stop,
}

impl Action {
    fn parse(args: &str) -> Option<Self> {
        match args.trim() {
            "" | "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}
