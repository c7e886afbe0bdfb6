use breakwater_core::KeyScope;

/// Configuration for the registration/dispatch layer.
///
/// Deliberately small: the layer itself has no timeouts, thresholds, or
/// pool sizes — those belong to the resilience engine behind it.
#[derive(Debug, Clone, Default)]
pub struct DispatchConfig {
    /// How command keys treat same-named operations on different receivers.
    /// The default shares keys by name; call sites may rely on that sharing.
    pub key_scope: KeyScope,
}
