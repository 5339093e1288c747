#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::channel::oneshot;
use oxide_inline_validation::{
    BoundValidation, BoxFuture, InlineValidation, Options, QueueRegistry, Request, Response,
    Scheduler, Transport, TransportError,
};
use oxide_page::{el, Document, ElementBuilder, NodeId, SharedDocument};

pub type Reply = Result<Response, TransportError>;

enum Scripted {
    Ready(Reply),
    Gated(oneshot::Receiver<Reply>),
}

/// Records every request and answers from a script.
///
/// Unscripted requests get a valid answer (`errmsg: ""`).
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<Request>>,
    script: Mutex<VecDeque<Scripted>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answers the next unanswered request with `response`.
    pub fn reply(&self, response: Response) {
        self.push(Scripted::Ready(Ok(response)));
    }

    /// Fails the next unanswered request.
    pub fn fail(&self, error: TransportError) {
        self.push(Scripted::Ready(Err(error)));
    }

    /// Holds the next unanswered request until the returned sender fires.
    pub fn gate(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.push(Scripted::Gated(rx));
        tx
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Returns the `fname` of every request, from its query or body.
    pub fn fnames(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|req| {
                req.query_pairs()
                    .into_iter()
                    .chain(req.form_pairs())
                    .find(|(name, _)| name == "fname")
                    .map(|(_, value)| value)
            })
            .collect()
    }

    fn push(&self, scripted: Scripted) {
        self.script.lock().unwrap().push_back(scripted);
    }
}

impl Transport for MockTransport {
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
        self.requests.lock().unwrap().push(request);
        let scripted = self.script.lock().unwrap().pop_front();
        Box::pin(async move {
            match scripted {
                None => Ok(Response::errmsg("")),
                Some(Scripted::Ready(reply)) => reply,
                Some(Scripted::Gated(rx)) => rx
                    .await
                    .unwrap_or_else(|_| Err(TransportError::Connection("gate dropped".into()))),
            }
        })
    }
}

struct Slot {
    due: Duration,
    task: BoxFuture<'static, ()>,
}

#[derive(Default)]
struct Timeline {
    now: Duration,
    slots: Vec<Slot>,
    spawned: usize,
}

/// A scheduler driven by hand, on a virtual clock.
#[derive(Default)]
pub struct ManualScheduler {
    timeline: Mutex<Timeline>,
}

impl ManualScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Polls every due task until none can make progress.
    pub fn run_until_stalled(&self) {
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);

        loop {
            let (due, spawned_before) = {
                let mut timeline = self.timeline.lock().unwrap();
                let now = timeline.now;
                let (due, later) = std::mem::take(&mut timeline.slots)
                    .into_iter()
                    .partition::<Vec<_>, _>(|slot| slot.due <= now);
                timeline.slots = later;
                (due, timeline.spawned)
            };

            let mut completed = 0;
            let mut still_pending = Vec::new();
            for mut slot in due {
                match slot.task.as_mut().poll(&mut cx) {
                    Poll::Ready(()) => completed += 1,
                    Poll::Pending => still_pending.push(slot),
                }
            }

            let mut timeline = self.timeline.lock().unwrap();
            let spawned_meanwhile = timeline.spawned != spawned_before;
            still_pending.append(&mut timeline.slots);
            timeline.slots = still_pending;
            if completed == 0 && !spawned_meanwhile {
                break;
            }
        }
    }

    /// Moves the clock forward and runs whatever became due.
    pub fn advance_time(&self, by: Duration) {
        self.timeline.lock().unwrap().now += by;
        self.run_until_stalled();
    }

    /// Returns the number of tasks not yet finished.
    pub fn outstanding(&self) -> usize {
        self.timeline.lock().unwrap().slots.len()
    }

    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        let mut timeline = self.timeline.lock().unwrap();
        let due = timeline.now + delay;
        timeline.slots.push(Slot { due, task });
        timeline.spawned += 1;
    }
}

impl Scheduler for ManualScheduler {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.schedule(Duration::ZERO, task);
    }

    fn spawn_after(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        self.schedule(delay, task);
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A page, its mocks, and a controller wired to a private queue registry.
pub struct Harness {
    pub page: SharedDocument,
    pub transport: Arc<MockTransport>,
    pub scheduler: Arc<ManualScheduler>,
    pub queues: QueueRegistry,
}

impl Harness {
    pub fn new(doc: Document) -> Self {
        init_tracing();
        Self {
            page: doc.into_shared(),
            transport: MockTransport::new(),
            scheduler: ManualScheduler::new(),
            queues: QueueRegistry::new(),
        }
    }

    pub fn controller(&self) -> InlineValidation {
        InlineValidation::new(self.transport.clone(), self.scheduler.clone())
            .queues(self.queues.clone())
    }

    /// Binds with options read from the root.
    pub fn bind(&self, root: NodeId) -> BoundValidation {
        self.controller().bind(&self.page, root).unwrap()
    }

    pub fn bind_with(&self, root: NodeId, options: Options) -> BoundValidation {
        self.controller()
            .options(options)
            .bind(&self.page, root)
            .unwrap()
    }

    pub fn node(&self, id: &str) -> NodeId {
        self.page
            .lock()
            .unwrap()
            .by_id(id)
            .unwrap_or_else(|| panic!("no element #{id}"))
    }

    pub fn set_value(&self, id: &str, value: &str) {
        let node = self.node(id);
        self.page.lock().unwrap().set_value(node, value).unwrap();
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        let node = self.node(id);
        self.page.lock().unwrap().element(node).unwrap().has_class(class)
    }

    /// Returns the content of the error region inside the field box `id`.
    pub fn error_text(&self, id: &str) -> String {
        let node = self.node(id);
        let doc = self.page.lock().unwrap();
        let region = doc
            .find(node, &oxide_page::Selector::class("fieldErrorBox"))
            .into_iter()
            .next()
            .unwrap_or_else(|| panic!("#{id} has no error box"));
        doc.element(region).unwrap().content().to_string()
    }
}

/// A field box for the form backends: `div.field[data-fieldname]` holding
/// a text input `#<name>` and an error region.
pub fn text_field(name: &str) -> ElementBuilder {
    el("div")
        .class("field")
        .id(format!("{name}-field"))
        .attr("data-fieldname", name)
        .children([
            ElementBuilder::input("text").id(name).name(name),
            el("div").class("fieldErrorBox"),
        ])
}

/// A form with the given action, method and fields, marked for binding.
pub fn form(action: &str, method: &str, options: &str, fields: Vec<ElementBuilder>) -> ElementBuilder {
    el("form")
        .id("form")
        .class("pat-inlinevalidation")
        .attr("data-pat-inlinevalidation", options)
        .attr("action", action)
        .attr("method", method)
        .children(fields)
}

/// An Archetypes edit page with a `<base>` and the given fields.
pub fn archetypes_page(base: &str, fields: Vec<ElementBuilder>) -> (Document, NodeId) {
    let mut doc = Document::new();
    let root = doc.root();
    doc.append(root, el("base").attr("href", base)).unwrap();
    let form = doc
        .append(
            root,
            el("form")
                .id("form")
                .class("pat-inlinevalidation")
                .attr("data-pat-inlinevalidation", r#"{"type": "archetypes"}"#)
                .children(fields),
        )
        .unwrap();
    (doc, form)
}

/// An Archetypes field box: `div.field[data-uid][data-fieldname]`.
pub fn archetypes_field(uid: &str, name: &str, control: ElementBuilder) -> ElementBuilder {
    el("div")
        .class("field")
        .id(format!("{name}-field"))
        .attr("data-uid", uid)
        .attr("data-fieldname", name)
        .children([control, el("div").class("fieldErrorBox")])
}
