//! Example Trellis component.
//!
//! `cargo build -p trellis-greeter` produces the platform library for
//! `greeter` (`libgreeter.so`, `libgreeter.dylib` or `greeter.dll`). Copy it
//! next to `component.json`, then `trellis list --dir plugins/examples` loads it.
use std::sync::Arc;

use log::info;
use trellis_core::{ComponentLifecycle, ObjectRegistry};

/// Message the greeter publishes while it is loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting(pub String);

/// Example component: publishes a [`Greeting`] on initialize and withdraws
/// it again on finalize.
#[derive(Default)]
pub struct Greeter {
    published: Option<Arc<Greeting>>,
}

impl ComponentLifecycle for Greeter {
    fn initialize(&mut self, objects: &mut ObjectRegistry) {
        let greeting = Arc::new(Greeting("Hello from Greeter".to_string()));
        objects.add(greeting.clone());
        self.published = Some(greeting);
        info!("Greeter initialized");
    }

    fn initialization_finished(&mut self, objects: &mut ObjectRegistry) {
        info!("Greeter sees {} registered object(s)", objects.len());
    }

    fn finalize(&mut self, objects: &mut ObjectRegistry) {
        if let Some(greeting) = self.published.take() {
            objects.remove(&greeting);
        }
        info!("Greeter finalized");
    }
}

trellis_core::export_component!(Greeter);
