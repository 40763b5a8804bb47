//! Registry Configuration

/// Event registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Emulate `mouseenter` / `mouseleave` on top of `mouseover` / `mouseout`.
    ///
    /// When off, both names are treated as custom events.
    pub emulate_enter_leave: bool,

    /// Host-specific event names to treat as native in addition to the
    /// built-in table
    pub extra_native_events: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            emulate_enter_leave: true,
            extra_native_events: Vec::new(),
        }
    }
}
