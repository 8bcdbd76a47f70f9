#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{bail, Result};

use deimos::{HeadlessAllocator, HeadlessTexture, ResourceAllocator, TextureDescriptor};

/// Something observable that happened while a graph executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Create(String),
    Destroy(String),
    Execute(String),
}

pub fn create(name: &str) -> Event {
    Event::Create(name.to_owned())
}

pub fn destroy(name: &str) -> Event {
    Event::Destroy(name.to_owned())
}

pub fn execute(name: &str) -> Event {
    Event::Execute(name.to_owned())
}

/// Shared, ordered log of events. Cloning gives another handle to the same log, so pass callbacks
/// and the allocator can write to it at the same time.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == event)
    }

    pub fn contains(&self, event: &Event) -> bool {
        self.position(event).is_some()
    }

    /// Returns true if both events happened and `first` happened before `second`.
    pub fn before(&self, first: &Event, second: &Event) -> bool {
        match (self.position(first), self.position(second)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Headless allocator that records every texture it creates and destroys, and can be told to fail.
#[derive(Debug)]
pub struct RecordingAllocator {
    pub inner: HeadlessAllocator,
    log: EventLog,
    names: HashMap<u64, String>,
    fail_on: Option<String>,
}

impl RecordingAllocator {
    pub fn new(log: &EventLog) -> Self {
        Self {
            inner: HeadlessAllocator::new(),
            log: log.clone(),
            names: HashMap::new(),
            fail_on: None,
        }
    }

    /// Make creating the texture with this name fail.
    pub fn failing_on(mut self, name: &str) -> Self {
        self.fail_on = Some(name.to_owned());
        self
    }

    pub fn live_count(&self) -> usize {
        self.inner.live_count()
    }
}

impl ResourceAllocator for RecordingAllocator {
    type Texture = HeadlessTexture;

    fn create_texture(&mut self, name: &str, desc: &TextureDescriptor) -> Result<Self::Texture> {
        if self.fail_on.as_deref() == Some(name) {
            bail!("out of memory creating {}", name);
        }
        let texture = self.inner.create_texture(name, desc)?;
        self.names.insert(texture.id, name.to_owned());
        self.log.push(create(name));
        Ok(texture)
    }

    fn destroy_texture(&mut self, texture: Self::Texture) -> Result<()> {
        let name = self.names.remove(&texture.id).unwrap_or_default();
        self.inner.destroy_texture(texture)?;
        self.log.push(destroy(&name));
        Ok(())
    }
}

/// Enable log output for tests. Safe to call from every test.
pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}
