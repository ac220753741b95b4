//! Event delivery to registered listeners.
//!
//! The engine publishes an [`EngineEvent`] for every mutation category.
//! Listeners are registered explicitly on the engine and called in
//! registration order, synchronously, after the mutation completes. A
//! listener must not call back into the engine.

use std::sync::mpsc::{self, Receiver, Sender};

use litany_types::EngineEvent;
use tracing::{debug, info};

/// Receives engine events.
pub trait EngineListener {
    /// Called once per event, after the state change it describes.
    fn on_event(&mut self, event: &EngineEvent);
}

/// Forwards events into a standard channel.
///
/// A dropped receiver is not an error; events are simply discarded.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    sender: Sender<EngineEvent>,
}

impl ChannelListener {
    /// A listener and the receiving end of its channel.
    pub fn channel() -> (Self, Receiver<EngineEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl EngineListener for ChannelListener {
    fn on_event(&mut self, event: &EngineEvent) {
        // A send only fails once the receiver is gone.
        let _ = self.sender.send(event.clone());
    }
}

/// Writes events to the `tracing` log.
///
/// Milestone events go to `info`, frequent ones to `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl EngineListener for TracingListener {
    fn on_event(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::ResourcesChanged => {}
            EngineEvent::BuffStarted { recipe } => debug!(%recipe, "Buff started"),
            EngineEvent::BuffExpired { recipe } => debug!(%recipe, "Buff expired"),
            EngineEvent::WeatherChanged { weather } => debug!(?weather, "Weather changed"),
            EngineEvent::RecipeUnlocked { recipe } => info!(%recipe, "Recipe unlocked"),
            EngineEvent::FollowerGained { follower } => info!(%follower, "Follower gained"),
            EngineEvent::SeasonChanged { season } => info!(%season, "Season changed"),
            EngineEvent::SkillLevelUp { skill, level } => info!(%skill, level, "Skill level up"),
            EngineEvent::UpgradePurchased { upgrade, level } => {
                info!(%upgrade, level, "Upgrade purchased");
            }
            EngineEvent::MemorySlotGranted { milestone, slots } => {
                info!(%milestone, slots, "Memory slot granted");
            }
        }
    }
}

/// Ordered set of listeners.
#[derive(Default)]
pub struct Listeners {
    listeners: Vec<Box<dyn EngineListener>>,
}

impl Listeners {
    /// Register a listener. It receives every event published afterwards.
    pub fn register(&mut self, listener: Box<dyn EngineListener>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `events` to every listener, in order.
    pub fn publish(&mut self, events: &[EngineEvent]) {
        for event in events {
            for listener in &mut self.listeners {
                listener.on_event(event);
            }
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}
