//! The validation controller: binding policy and event dispatch.

use std::sync::Arc;
use std::time::Duration;

use oxide_page::{Document, NodeId, Selector, SharedDocument};
use tracing::{debug, info, warn};

use crate::backend::{lock_page, Backend, Pipeline};
use crate::error::{Result, ValidationError};
use crate::options::Options;
use crate::queue::QueueRegistry;
use crate::render::ErrorRenderer;
use crate::scheduler::Scheduler;
use crate::transport::Transport;

/// Class marking the roots [`InlineValidation::scan`] binds to.
pub const PATTERN_CLASS: &str = "pat-inlinevalidation";

/// Controls validated when they lose focus.
pub const BLUR_SELECTOR: &str = concat!(
    r#"input[type="text"]:not(.pattern-pickadate-date, .pattern-pickadate-time), "#,
    r#"input[type="password"], "#,
    r#"input[type="checkbox"], "#,
    "select, ",
    "textarea",
);

/// Related-items widgets, validated when their value changes.
pub const RELATED_ITEMS_SELECTOR: &str = "input.pat-relateditems.text-widget";

/// Date and time pickers, validated a settle delay after they change.
pub const PICKER_SELECTOR: &str = "input.pattern-pickadate-date, input.pattern-pickadate-time";

/// Events the controller listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The control lost focus.
    Blur,
    /// The control's value changed.
    Change,
}

/// When a bound event dispatches its validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Right away.
    Immediate,
    /// After the given delay, through the scheduler.
    Deferred(Duration),
}

/// One event listener installed at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// The bound control.
    pub node: NodeId,
    /// The event listened to.
    pub event: EventKind,
    /// When the validation is dispatched.
    pub trigger: Trigger,
}

/// An unbound controller: the collaborators a bound instance will use.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use oxide_inline_validation::{
///     BoxFuture, EventKind, InlineValidation, Options, QueueRegistry, Request, Response,
///     Scheduler, Transport, TransportError,
/// };
/// use oxide_page::{el, Document, ElementBuilder};
///
/// struct Offline;
///
/// impl Transport for Offline {
///     fn send(&self, _req: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
///         Box::pin(async { Err(TransportError::Connection("offline".into())) })
///     }
/// }
///
/// struct Inline;
///
/// impl Scheduler for Inline {
///     fn spawn(&self, task: BoxFuture<'static, ()>) {
///         futures::executor::block_on(task);
///     }
///
///     fn spawn_after(&self, _delay: std::time::Duration, task: BoxFuture<'static, ()>) {
///         futures::executor::block_on(task);
///     }
/// }
///
/// let (doc, form) = Document::build(
///     el("form").attr("action", "/edit").child(
///         el("div")
///             .class("field")
///             .attr("data-fieldname", "title")
///             .child(ElementBuilder::input("text").id("title")),
///     ),
/// );
/// let page = doc.into_shared();
///
/// let bound = InlineValidation::new(Arc::new(Offline), Arc::new(Inline))
///     .queues(QueueRegistry::new())
///     .options(Options::new().backend_type("formlib"))
///     .bind(&page, form)
///     .unwrap();
///
/// let title = page.lock().unwrap().by_id("title").unwrap();
/// assert!(bound.is_bound(title, EventKind::Blur));
/// bound.handle_event(title, EventKind::Blur);
/// ```
#[derive(Clone)]
pub struct InlineValidation {
    transport: Arc<dyn Transport>,
    scheduler: Arc<dyn Scheduler>,
    queues: QueueRegistry,
    renderer: ErrorRenderer,
    options: Option<Options>,
}

impl std::fmt::Debug for InlineValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineValidation")
            .field("queues", &self.queues)
            .field("renderer", &self.renderer)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl InlineValidation {
    /// Creates a controller using the process-wide queue registry.
    pub fn new(transport: Arc<dyn Transport>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            transport,
            scheduler,
            queues: QueueRegistry::global().clone(),
            renderer: ErrorRenderer::default(),
            options: None,
        }
    }

    /// Uses a specific queue registry.
    #[must_use]
    pub fn queues(mut self, queues: QueueRegistry) -> Self {
        self.queues = queues;
        self
    }

    /// Uses a specific error renderer.
    #[must_use]
    pub fn renderer(mut self, renderer: ErrorRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Uses these options instead of reading them from each root.
    #[must_use]
    pub fn options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Binds to the controls under `root`.
    ///
    /// Binding happens even when the options name no recognized backend;
    /// events then dispatch to nothing.
    pub fn bind(&self, page: &SharedDocument, root: NodeId) -> Result<BoundValidation> {
        let (options, bindings) = {
            let doc = lock_page(page);
            doc.element(root)
                .map_err(|_| ValidationError::RootNotFound(root))?;
            let options = match &self.options {
                Some(options) => options.clone(),
                None => Options::from_root(&doc, root)?,
            };
            let bindings = binding_table(&doc, root, options.settle_delay_duration())?;
            (options, bindings)
        };

        let backend = options.backend();
        info!(
            root = %root,
            backend = backend.map_or("none", |b| b.as_str()),
            bindings = bindings.len(),
            "inline validation bound"
        );
        if backend.is_none() {
            debug!(
                root = %root,
                configured = options.backend_type.as_deref().unwrap_or(""),
                "no recognized backend type, events will not validate"
            );
        }

        let pipeline = Arc::new(Pipeline {
            page: Arc::clone(page),
            transport: Arc::clone(&self.transport),
            scheduler: Arc::clone(&self.scheduler),
            queues: self.queues.clone(),
            queue_name: options.queue.clone(),
            renderer: self.renderer.clone(),
        });

        Ok(BoundValidation {
            root,
            backend,
            options,
            bindings,
            pipeline,
        })
    }

    /// Binds to every element of the page carrying [`PATTERN_CLASS`].
    ///
    /// Each root binds on its own: a root that fails to bind is logged and
    /// skipped, the others are returned in document order.
    pub fn scan(&self, page: &SharedDocument) -> Vec<BoundValidation> {
        let roots = lock_page(page).query_all(&Selector::class(PATTERN_CLASS));
        roots
            .into_iter()
            .filter_map(|root| match self.bind(page, root) {
                Ok(bound) => Some(bound),
                Err(err) => {
                    warn!(root = %root, error = %err, "cannot bind inline validation, root skipped");
                    None
                }
            })
            .collect()
    }
}

fn binding_table(doc: &Document, root: NodeId, settle: Duration) -> Result<Vec<Binding>> {
    let policy = [
        (BLUR_SELECTOR, EventKind::Blur, Trigger::Immediate),
        (RELATED_ITEMS_SELECTOR, EventKind::Change, Trigger::Immediate),
        (PICKER_SELECTOR, EventKind::Change, Trigger::Deferred(settle)),
    ];

    let mut bindings = Vec::new();
    for (selector, event, trigger) in policy {
        let selector = Selector::parse(selector)?;
        bindings.extend(doc.find(root, &selector).into_iter().map(|node| Binding {
            node,
            event,
            trigger,
        }));
    }
    Ok(bindings)
}

/// A controller bound to one root. There is no unbinding.
pub struct BoundValidation {
    root: NodeId,
    backend: Option<Backend>,
    options: Options,
    bindings: Vec<Binding>,
    pipeline: Arc<Pipeline>,
}

impl std::fmt::Debug for BoundValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundValidation")
            .field("root", &self.root)
            .field("backend", &self.backend)
            .field("options", &self.options)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl BoundValidation {
    /// Returns the bound root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the active backend, if the options named a recognized one.
    pub fn backend(&self) -> Option<Backend> {
        self.backend
    }

    /// Returns the options in effect.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the installed listeners, in binding order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Returns whether `node` listens to `event`.
    pub fn is_bound(&self, node: NodeId, event: EventKind) -> bool {
        self.bindings
            .iter()
            .any(|b| b.node == node && b.event == event)
    }

    /// Delivers an event fired on `target`.
    ///
    /// Every listener of `target` for `event` fires once. Must not be called
    /// while holding the page lock.
    pub fn handle_event(&self, target: NodeId, event: EventKind) {
        let listeners = self
            .bindings
            .iter()
            .filter(|b| b.node == target && b.event == event);

        for binding in listeners {
            match binding.trigger {
                Trigger::Immediate => self.validate(target),
                Trigger::Deferred(delay) => {
                    debug!(input = %target, delay = ?delay, "deferring validation");
                    let pipeline = Arc::clone(&self.pipeline);
                    let backend = self.backend;
                    self.pipeline.scheduler.spawn_after(
                        delay,
                        Box::pin(async move { dispatch(&pipeline, backend, target) }),
                    );
                }
            }
        }
    }

    /// Validates `input` now with the configured backend.
    pub fn validate(&self, input: NodeId) {
        dispatch(&self.pipeline, self.backend, input);
    }
}

fn dispatch(pipeline: &Arc<Pipeline>, backend: Option<Backend>, input: NodeId) {
    match backend {
        Some(backend) => pipeline.validate(backend, input),
        None => debug!(input = %input, "no backend configured, event ignored"),
    }
}
