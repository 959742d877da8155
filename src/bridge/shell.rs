//! Announces the modern shell to the legacy layer and loads it without
//! blocking the rest of the UI.
//!
//! Activation publishes a readiness record in two global slots; the legacy
//! side feature-detects it instead of depending on the shell directly.
//! Loading happens on a worker thread and any failure leaves the legacy path
//! running on its own.

use std::sync::OnceLock;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::bridge::document::NodeId;
use crate::bridge::window::HostWindow;
use crate::error::{Result, ShellError};

pub const BRIDGE_VERSION: &str = "0.1.0";
pub const GLOBAL_SLOT: &str = "__paintShellBridge";
pub const NAMESPACE: &str = "paintshell";
pub const NAMESPACE_SLOT: &str = "shellBridge";
pub const HOST_CONTAINER_ID: &str = "paint-shell-root";

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Pin the monotonic clock origin.  Called early from `main`; otherwise the
/// first readiness record sets it.
pub fn mark_process_start() {
    PROCESS_START.get_or_init(Instant::now);
}

pub fn monotonic_now() -> Duration {
    PROCESS_START.get_or_init(Instant::now).elapsed()
}

fn as_millis<S: Serializer>(value: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64() * 1000.0)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeReadiness {
    pub version: String,
    #[serde(serialize_with = "as_millis")]
    pub ready_at: Duration,
}

impl BridgeReadiness {
    pub fn now() -> Self {
        Self {
            version: BRIDGE_VERSION.to_string(),
            ready_at: monotonic_now(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

// ============================================================================
// BRIDGE
// ============================================================================

#[derive(Debug, Default)]
pub struct ShellBridge {
    published: Option<Value>,
    created_namespace: bool,
}

impl ShellBridge {
    pub fn is_active(&self) -> bool {
        self.published.is_some()
    }

    /// Publish readiness.  Activating an active bridge changes nothing and
    /// returns `None`.
    pub fn activate(&mut self, window: &mut HostWindow) -> Option<BridgeReadiness> {
        if self.published.is_some() {
            return None;
        }
        let readiness = BridgeReadiness::now();
        let value = readiness.to_value();
        window.set_global(GLOBAL_SLOT, value.clone());
        match window.globals_mut().get_mut(NAMESPACE) {
            Some(Value::Object(namespace)) => {
                namespace.insert(NAMESPACE_SLOT.to_string(), value.clone());
            }
            Some(_) => {
                log::warn!("Global `{}` is not an object; skipping {}", NAMESPACE, NAMESPACE_SLOT);
            }
            None => {
                let mut namespace = Map::new();
                namespace.insert(NAMESPACE_SLOT.to_string(), value.clone());
                window.set_global(NAMESPACE, Value::Object(namespace));
                self.created_namespace = true;
            }
        }
        log::info!("Shell bridge {} ready at {:?}", readiness.version, readiness.ready_at);
        self.published = Some(value);
        Some(readiness)
    }

    /// Remove what `activate` published.  Slots that now hold another
    /// bridge's record, and any other namespace fields, are left alone.
    pub fn deactivate(&mut self, window: &mut HostWindow) -> bool {
        let Some(published) = self.published.take() else {
            return false;
        };
        if window.global(GLOBAL_SLOT) == Some(&published) {
            window.remove_global(GLOBAL_SLOT);
        }
        let mut namespace_empty = false;
        if let Some(Value::Object(namespace)) = window.globals_mut().get_mut(NAMESPACE) {
            if namespace.get(NAMESPACE_SLOT) == Some(&published) {
                namespace.remove(NAMESPACE_SLOT);
            }
            namespace_empty = namespace.is_empty();
        }
        if self.created_namespace && namespace_empty {
            window.remove_global(NAMESPACE);
        }
        self.created_namespace = false;
        log::debug!("Shell bridge deactivated");
        true
    }
}

// ============================================================================
// LOADER
// ============================================================================

/// Produces the bridge implementation.  Runs on a worker thread.
pub trait ShellFactory: Send {
    fn name(&self) -> &str;
    fn resolve(&self) -> Result<ShellBridge>;
}

pub struct DefaultShellFactory;

impl ShellFactory for DefaultShellFactory {
    fn name(&self) -> &str {
        "builtin"
    }

    fn resolve(&self) -> Result<ShellBridge> {
        Ok(ShellBridge::default())
    }
}

/// A mounted shell, stored on its container and reused across bootstraps.
#[derive(Debug)]
pub struct ShellRoot {
    bridge: ShellBridge,
    renders: usize,
}

impl ShellRoot {
    fn new(bridge: ShellBridge) -> Self {
        Self { bridge, renders: 0 }
    }

    pub fn renders(&self) -> usize {
        self.renders
    }

    pub fn is_active(&self) -> bool {
        self.bridge.is_active()
    }

    fn render(&mut self, window: &mut HostWindow) {
        self.renders += 1;
        self.bridge.activate(window);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShellMount {
    Idle,
    Pending,
    Mounted { container: NodeId, reused: bool },
    LegacyOnly { reason: String },
}

pub struct ShellLoader {
    container_id: String,
    container: Option<NodeId>,
    receiver: Option<mpsc::Receiver<Result<ShellBridge>>>,
    mount: ShellMount,
}

impl Default for ShellLoader {
    fn default() -> Self {
        Self::new(HOST_CONTAINER_ID)
    }
}

impl ShellLoader {
    pub fn new(container_id: &str) -> Self {
        Self {
            container_id: container_id.to_string(),
            container: None,
            receiver: None,
            mount: ShellMount::Idle,
        }
    }

    pub fn mount(&self) -> &ShellMount {
        &self.mount
    }

    /// Start resolving the bridge.  Never fails: a missing host container or
    /// factory degrades to the legacy path.
    pub fn bootstrap(
        &mut self,
        window: &mut HostWindow,
        factory: Option<Box<dyn ShellFactory>>,
    ) -> &ShellMount {
        let Some(container) = window.container(&self.container_id) else {
            self.degrade(ShellError::MissingHost(self.container_id.clone()));
            return &self.mount;
        };
        let Some(factory) = factory else {
            self.degrade(ShellError::MissingFactory(format!(
                "nothing registered for `{}`",
                self.container_id
            )));
            return &self.mount;
        };

        log::debug!("Resolving shell bridge via `{}`", factory.name());
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(factory.resolve());
        });
        self.container = Some(container);
        self.receiver = Some(rx);
        self.mount = ShellMount::Pending;
        &self.mount
    }

    /// Collect a finished resolution, if any.
    pub fn poll(&mut self, window: &mut HostWindow) -> &ShellMount {
        let outcome = match &self.receiver {
            Some(rx) => match rx.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(mpsc::TryRecvError::Empty) => None,
                Err(mpsc::TryRecvError::Disconnected) => Some(Err(ShellError::BridgeResolution(
                    "resolver exited without a result".to_string(),
                ))),
            },
            None => None,
        };
        if let Some(outcome) = outcome {
            self.finish(window, outcome);
        }
        &self.mount
    }

    /// Block up to `timeout` for the resolution.
    pub fn wait(&mut self, window: &mut HostWindow, timeout: Duration) -> &ShellMount {
        let outcome = self.receiver.as_ref().map(|rx| {
            rx.recv_timeout(timeout).map_err(|err| ShellError::BridgeResolution(err.to_string()))
        });
        if let Some(outcome) = outcome {
            self.finish(window, outcome.and_then(|resolved| resolved));
        }
        &self.mount
    }

    /// Tear down the root stored on the container, as before a hot reload
    /// swaps the code underneath.
    pub fn hot_dispose(&mut self, window: &mut HostWindow) -> bool {
        self.receiver = None;
        self.mount = ShellMount::Idle;
        let Some(container) = self.container.take() else {
            return false;
        };
        match window.take_shell_root(container) {
            Some(mut root) => {
                root.bridge.deactivate(window);
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, window: &mut HostWindow, outcome: Result<ShellBridge>) {
        self.receiver = None;
        let Some(container) = self.container else {
            return;
        };
        let bridge = match outcome {
            Ok(bridge) => bridge,
            Err(err) => {
                self.degrade(err);
                return;
            }
        };
        if window.container(&self.container_id) != Some(container) {
            self.degrade(ShellError::MissingHost(self.container_id.clone()));
            return;
        }
        let (mut root, reused) = match window.take_shell_root(container) {
            Some(root) => (root, true),
            None => (ShellRoot::new(bridge), false),
        };
        root.render(window);
        window.put_shell_root(container, root);
        self.mount = ShellMount::Mounted { container, reused };
    }

    fn degrade(&mut self, err: ShellError) {
        log::warn!("Shell not mounted, continuing with the legacy UI: {}", err);
        self.receiver = None;
        self.mount = ShellMount::LegacyOnly {
            reason: err.to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FailingFactory;

    impl ShellFactory for FailingFactory {
        fn name(&self) -> &str {
            "failing"
        }

        fn resolve(&self) -> Result<ShellBridge> {
            Err(ShellError::BridgeResolution("module not found".to_string()))
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_activate_publishes_both_slots() {
        let mut window = HostWindow::default();
        let mut bridge = ShellBridge::default();
        let readiness = bridge.activate(&mut window).expect("first activation publishes");

        assert_eq!(readiness.version, "0.1.0");
        let slot = window.global(GLOBAL_SLOT).cloned().expect("global slot");
        assert_eq!(slot["version"], json!("0.1.0"));
        assert!(slot["readyAt"].is_number());
        assert_eq!(window.global(NAMESPACE).map(|ns| &ns[NAMESPACE_SLOT]), Some(&slot));
        assert!(bridge.activate(&mut window).is_none());
    }

    #[test]
    fn test_deactivate_keeps_foreign_namespace_fields() {
        let mut window = HostWindow::default();
        window.set_global(NAMESPACE, json!({ "theme": "classic" }));
        let mut bridge = ShellBridge::default();
        bridge.activate(&mut window);

        assert!(bridge.deactivate(&mut window));
        assert!(!bridge.deactivate(&mut window));
        assert!(window.global(GLOBAL_SLOT).is_none());
        assert_eq!(window.global(NAMESPACE), Some(&json!({ "theme": "classic" })));
    }

    #[test]
    fn test_deactivate_removes_created_namespace_only_when_empty() {
        let mut window = HostWindow::default();
        let mut bridge = ShellBridge::default();
        bridge.activate(&mut window);
        bridge.deactivate(&mut window);
        assert!(window.globals().is_empty());

        bridge.activate(&mut window);
        if let Some(Value::Object(ns)) = window.globals_mut().get_mut(NAMESPACE) {
            ns.insert("added".to_string(), json!(true));
        }
        bridge.deactivate(&mut window);
        assert_eq!(window.global(NAMESPACE), Some(&json!({ "added": true })));
    }

    #[test]
    fn test_missing_host_degrades_to_legacy() {
        let mut window = HostWindow::default();
        let mut loader = ShellLoader::default();
        let mount = loader.bootstrap(&mut window, Some(Box::new(DefaultShellFactory)));
        assert!(matches!(mount, ShellMount::LegacyOnly { .. }));
        assert!(window.globals().is_empty());
    }

    #[test]
    fn test_missing_factory_and_failed_resolution_degrade() {
        let mut window = HostWindow::default();
        window.add_container(HOST_CONTAINER_ID);
        let mut loader = ShellLoader::default();
        assert!(matches!(loader.bootstrap(&mut window, None), ShellMount::LegacyOnly { .. }));

        loader.bootstrap(&mut window, Some(Box::new(FailingFactory)));
        let ShellMount::LegacyOnly { reason } = loader.wait(&mut window, WAIT).clone() else {
            panic!("failed resolution should degrade");
        };
        assert!(reason.contains("module not found"));
        assert!(window.global(GLOBAL_SLOT).is_none());
    }

    #[test]
    fn test_root_is_reused_until_hot_dispose() {
        let mut window = HostWindow::default();
        let container = window.add_container(HOST_CONTAINER_ID);
        let mut loader = ShellLoader::default();

        loader.bootstrap(&mut window, Some(Box::new(DefaultShellFactory)));
        assert_eq!(
            loader.wait(&mut window, WAIT),
            &ShellMount::Mounted { container, reused: false }
        );
        let first = window.global(GLOBAL_SLOT).cloned();
        assert!(first.is_some());

        loader.bootstrap(&mut window, Some(Box::new(DefaultShellFactory)));
        assert_eq!(
            loader.wait(&mut window, WAIT),
            &ShellMount::Mounted { container, reused: true }
        );
        assert_eq!(window.shell_root(container).map(ShellRoot::renders), Some(2));
        // The reused root is already active, so the slot is untouched.
        assert_eq!(window.global(GLOBAL_SLOT).cloned(), first);

        assert!(loader.hot_dispose(&mut window));
        assert!(!window.has_shell_root(container));
        assert!(window.globals().is_empty());
        assert!(!loader.hot_dispose(&mut window));
    }
}
