//! fOS Events - namespaced, delegated event handling
//!
//! A registry on top of `fos-dom` that lets components attach, detach and
//! fire events on elements:
//!
//! - namespaces (`click.dropdown`) so a component removes only its own
//!   handlers
//! - CSS selector delegation from an ancestor, re-evaluated on every dispatch
//! - `mouseenter` / `mouseleave` emulated over `mouseover` / `mouseout`
//! - one-shot handlers
//!
//! One native listener is installed per (element, native type); it fans out
//! to the stored records in registration order.
//!
//! ```rust,ignore
//! use fos_dom::Document;
//! use fos_events::{EventRegistry, Handler};
//!
//! let document = Document::default();
//! let menu = document.create_element("ul");
//! document.append_child(document.body(), menu)?;
//!
//! let events = EventRegistry::new(&document);
//! let select = Handler::new(|_, event| println!("picked {:?}", event.delegate_target));
//! events.on_delegated(menu, "click.menu", "li", &select);
//! // ...
//! events.off(menu, ".menu");
//! ```

mod config;
mod event_spec;
mod handler;
mod registry;
mod store;

pub use config::RegistryConfig;
pub use event_spec::{EventSpec, EventTable, NATIVE_EVENTS, SpecError};
pub use handler::Handler;
pub use registry::{EventArgs, EventRegistry};
