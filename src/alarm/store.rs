//! In-memory alarm collection.
//!
//! Alarms live only for the lifetime of the process. Insertion order is
//! display order and also decides which alarm wins when several share a
//! minute.

use super::model::{Alarm, AlarmId, AlarmTime};

/// Ordered, in-memory set of alarms.
#[derive(Debug, Clone, Default)]
pub struct AlarmStore {
    alarms: Vec<Alarm>,
    next_id: u64,
}

impl AlarmStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new active alarm and return a copy of it.
    pub fn add(&mut self, time: AlarmTime, label: impl Into<String>) -> Alarm {
        self.next_id += 1;
        let alarm = Alarm {
            id: AlarmId::new(self.next_id),
            time,
            label: label.into(),
            is_active: true,
        };
        log::info!("Added alarm {} at {} ({})", alarm.id, alarm.time, alarm.label);
        self.alarms.push(alarm.clone());
        alarm
    }

    /// Flip the active flag. Returns the new state, or `None` if no alarm
    /// has that id.
    pub fn toggle(&mut self, id: AlarmId) -> Option<bool> {
        let alarm = self.alarms.iter_mut().find(|a| a.id == id)?;
        alarm.is_active = !alarm.is_active;
        log::debug!(
            "Alarm {} is now {}",
            alarm.id,
            if alarm.is_active { "on" } else { "off" }
        );
        Some(alarm.is_active)
    }

    /// Delete an alarm.
    pub fn remove(&mut self, id: AlarmId) -> Option<Alarm> {
        let index = self.alarms.iter().position(|a| a.id == id)?;
        let removed = self.alarms.remove(index);
        log::info!("Removed alarm {} at {}", removed.id, removed.time);
        Some(removed)
    }

    #[must_use]
    pub fn get(&self, id: AlarmId) -> Option<&Alarm> {
        self.alarms.iter().find(|a| a.id == id)
    }

    /// Alarms in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Alarm> {
        self.alarms.iter()
    }

    /// Active alarms in insertion order.
    pub fn active(&self) -> impl Iterator<Item = &Alarm> {
        self.alarms.iter().filter(|a| a.is_active)
    }

    /// Alarm at a display position.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Alarm> {
        self.alarms.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }
}
