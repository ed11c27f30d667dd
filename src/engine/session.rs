use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::orchestrator::{FetchTicket, QueryOrchestrator, build_query};
use crate::export;
use crate::filters::{FilterState, FilterStore, PageSize, SortDir, SortKey};
use crate::market_data::{FetchError, Listing, LogoMap, QueryClient};
use crate::metrics;
use crate::state::Accumulator;
use crate::timing::{Debounced, Throttle};

pub const DEFAULT_FILTER_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_SCROLL_THROTTLE: Duration = Duration::from_millis(1000);

/// Completed fetches waiting to be applied.
const FETCH_CHANNEL_BUFFER: usize = 64;
/// Throttled near-bottom signals; extra signals are dropped when full.
const LOAD_MORE_BUFFER: usize = 4;

/// Everything a user can do to the listing.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SetMinMarketCap(f64),
    /// `None` removes the price ceiling.
    SetMaxPrice(Option<f64>),
    SetSortKey(SortKey),
    SetSortDir(SortDir),
    /// Column header click: the active column flips direction, another
    /// column becomes active in descending order.
    SortBy(SortKey),
    SetPageSize(PageSize),
    NextPage,
    PreviousPage,
    /// The viewport came within reach of the bottom of the table.
    ScrolledNearBottom,
    Reset,
    Export,
}

/// Snapshot of what the front end should render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub filters: FilterState,
    pub location: String,
    pub rows: Vec<Listing>,
    pub logos: LogoMap,
    pub loading: bool,
    pub error: Option<String>,
    pub status: Option<String>,
}

impl View {
    /// Previous/next controls only exist in paged mode.
    pub fn shows_pagination(&self) -> bool {
        !self.filters.page_size.is_all()
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub defaults: FilterState,
    pub filter_debounce: Duration,
    pub scroll_throttle: Duration,
    pub export_dir: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            defaults: FilterState::default(),
            filter_debounce: DEFAULT_FILTER_DEBOUNCE,
            scroll_throttle: DEFAULT_SCROLL_THROTTLE,
            export_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug)]
enum FetchOutcome {
    Listings {
        generation: u64,
        page_size: PageSize,
        result: Result<Vec<Listing>, FetchError>,
    },
    Logos {
        generation: u64,
        logos: LogoMap,
    },
}

/// Receivers the event loop selects over alongside UI events.
pub struct SessionInbox {
    fetch_rx: mpsc::Receiver<FetchOutcome>,
    load_more_rx: mpsc::Receiver<()>,
    min_market_cap_rx: watch::Receiver<f64>,
    max_price_rx: watch::Receiver<Option<f64>>,
}

/// State of one listing session: filters mirrored into the location,
/// debounced bounds, throttled infinite scroll, and the displayed rows.
///
/// Dropping the session aborts pending debounce and throttle timers and any
/// fetch still running.
pub struct Session {
    settings: SessionSettings,
    store: FilterStore,
    min_market_cap: Debounced<f64>,
    max_price: Debounced<Option<f64>>,
    scroll: Throttle<()>,
    orchestrator: QueryOrchestrator,
    accumulator: Accumulator,
    client: QueryClient,
    logos: LogoMap,
    error: Option<FetchError>,
    status: Option<String>,
    fetches: JoinSet<()>,
    fetch_tx: mpsc::Sender<FetchOutcome>,
    view_tx: watch::Sender<View>,
}

impl Session {
    pub fn new(settings: SessionSettings, client: QueryClient, location: Url) -> (Self, SessionInbox) {
        let store = FilterStore::new(location, settings.defaults.clone());
        let state = store.state().clone();

        let min_market_cap = Debounced::new(state.min_market_cap, settings.filter_debounce);
        let max_price = Debounced::new(state.max_price, settings.filter_debounce);

        let (load_more_tx, load_more_rx) = mpsc::channel(LOAD_MORE_BUFFER);
        let scroll = Throttle::new(settings.scroll_throttle, move |()| {
            let _ = load_more_tx.try_send(());
        });

        let (fetch_tx, fetch_rx) = mpsc::channel(FETCH_CHANNEL_BUFFER);
        let (view_tx, _) = watch::channel(View::default());

        let inbox = SessionInbox {
            fetch_rx,
            load_more_rx,
            min_market_cap_rx: min_market_cap.subscribe(),
            max_price_rx: max_price.subscribe(),
        };

        let session = Self {
            settings,
            store,
            min_market_cap,
            max_price,
            scroll,
            orchestrator: QueryOrchestrator::new(),
            accumulator: Accumulator::new(&state),
            client,
            logos: LogoMap::new(),
            error: None,
            status: None,
            fetches: JoinSet::new(),
            fetch_tx,
            view_tx,
        };
        session.publish();
        (session, inbox)
    }

    pub fn subscribe_view(&self) -> watch::Receiver<View> {
        self.view_tx.subscribe()
    }

    pub fn subscribe_location(&self) -> watch::Receiver<Url> {
        self.store.subscribe()
    }

    pub fn handle_event(&mut self, event: UiEvent) {
        debug!(?event, "ui event");
        self.status = None;
        let page = self.store.state().page;

        match event {
            UiEvent::SetMinMarketCap(value) => self.store.set_min_market_cap(value),
            UiEvent::SetMaxPrice(value) => self.store.set_max_price(value),
            UiEvent::SetSortKey(key) => self.store.set_sort_key(key),
            UiEvent::SetSortDir(dir) => self.store.set_sort_dir(dir),
            UiEvent::SortBy(key) => {
                let (current_key, current_dir) = {
                    let state = self.store.state();
                    (state.sort_key, state.sort_dir)
                };
                if current_key == key {
                    self.store.set_sort_dir(current_dir.toggled());
                } else {
                    self.store.set_sort(key, SortDir::Desc);
                }
            }
            UiEvent::SetPageSize(page_size) => self.store.set_page_size(page_size),
            UiEvent::NextPage | UiEvent::PreviousPage if self.store.state().page_size.is_all() => {
                debug!("page buttons are hidden in infinite-scroll mode");
                return;
            }
            UiEvent::NextPage => self.store.set_page(page.saturating_add(1)),
            UiEvent::PreviousPage => self.store.set_page(page.saturating_sub(1).max(1)),
            UiEvent::ScrolledNearBottom => {
                if self.store.state().page_size.is_all() {
                    self.scroll.call(());
                }
                return;
            }
            UiEvent::Reset => self.store.reset(),
            UiEvent::Export => {
                self.export();
                return;
            }
        }

        self.after_filter_change();
    }

    fn after_filter_change(&mut self) {
        let state = self.store.state().clone();
        self.accumulator.observe(&state);
        self.min_market_cap.update(state.min_market_cap);
        self.max_price.update(state.max_price);
        self.sync_query();
    }

    /// Issue a fetch if the effective query changed.
    pub fn sync_query(&mut self) {
        let state = self.store.state();
        let query = build_query(state, self.min_market_cap.get(), self.max_price.get());
        if let Some(ticket) = self.orchestrator.plan(query, state.page_size) {
            self.error = None;
            self.accumulator.begin_query();
            self.spawn_fetch(ticket);
        }
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        while self.fetches.try_join_next().is_some() {}

        let client = self.client.clone();
        let tx = self.fetch_tx.clone();
        self.fetches.spawn(async move {
            let FetchTicket {
                generation,
                page_size,
                query,
            } = ticket;

            let result = client.listings(&query).await;
            let ids: Vec<u64> = match &result {
                Ok(rows) => rows.iter().map(|row| row.id).collect(),
                Err(_) => Vec::new(),
            };

            let outcome = FetchOutcome::Listings {
                generation,
                page_size,
                result,
            };
            if tx.send(outcome).await.is_err() || ids.is_empty() {
                return;
            }

            let logos = client.logos(&ids).await;
            let _ = tx.send(FetchOutcome::Logos { generation, logos }).await;
        });
    }

    fn handle_fetch(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Listings {
                generation,
                page_size,
                result,
            } => {
                if !self.orchestrator.complete(generation) {
                    metrics::record_stale_response();
                    debug!(
                        generation,
                        current = self.orchestrator.generation(),
                        "discarding stale listings response"
                    );
                    return;
                }
                match result {
                    Ok(rows) => {
                        debug!(generation, rows = rows.len(), "listings applied");
                        if !page_size.is_all() {
                            self.logos.clear();
                        }
                        self.accumulator.apply(page_size, rows);
                    }
                    Err(err) => {
                        warn!(error = %err, generation, "listings fetch failed");
                        self.error = Some(err);
                    }
                }
            }
            FetchOutcome::Logos { generation, logos } => {
                // A logo belongs to its id, so a lookup issued for an earlier
                // window still applies to rows that remain on screen.
                let shown: HashSet<u64> = self
                    .accumulator
                    .rows(self.store.state().page_size)
                    .iter()
                    .map(|row| row.id)
                    .collect();
                let before = self.logos.len();
                self.logos
                    .extend(logos.into_iter().filter(|(id, _)| shown.contains(id)));
                debug!(generation, added = self.logos.len() - before, "logos applied");
            }
        }
    }

    /// Advance to the next infinite-scroll window unless a fetch is running.
    fn load_more(&mut self) {
        let state = self.store.state();
        if !state.page_size.is_all() {
            return;
        }
        if self.orchestrator.is_fetching() {
            debug!("fetch in flight, ignoring load-more signal");
            return;
        }
        let next = state.page.saturating_add(1);
        self.store.set_page(next);
        self.after_filter_change();
    }

    fn export(&mut self) {
        let rows = self.accumulator.rows(self.store.state().page_size);
        match export::export_to_dir(&self.settings.export_dir, rows) {
            Ok(path) => {
                info!(rows = rows.len(), path = %path.display(), "listings exported");
                self.status = Some(format!("Exported {} rows to {}", rows.len(), path.display()));
            }
            Err(err) => {
                warn!(error = %err, "export failed");
                self.status = Some(format!("Export failed: {err}"));
            }
        }
    }

    fn view(&self) -> View {
        let filters = self.store.state().clone();
        let rows = match self.error {
            Some(_) => Vec::new(),
            None => self.accumulator.rows(filters.page_size).to_vec(),
        };
        let logos = rows
            .iter()
            .filter_map(|row| self.logos.get(&row.id).map(|logo| (row.id, logo.clone())))
            .collect();

        View {
            location: self.store.location().to_string(),
            rows,
            logos,
            loading: self.orchestrator.is_fetching(),
            error: self.error.as_ref().map(ToString::to_string),
            status: self.status.clone(),
            filters,
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }
}

/// Drive a session until the event channel closes.
pub async fn run_session(mut session: Session, inbox: SessionInbox, mut events: mpsc::Receiver<UiEvent>) {
    let SessionInbox {
        mut fetch_rx,
        mut load_more_rx,
        mut min_market_cap_rx,
        mut max_price_rx,
    } = inbox;

    info!(location = %session.store.location(), "session started");
    session.sync_query();
    session.publish();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => session.handle_event(event),
                None => break,
            },
            Some(outcome) = fetch_rx.recv() => session.handle_fetch(outcome),
            Some(()) = load_more_rx.recv() => session.load_more(),
            Ok(()) = min_market_cap_rx.changed() => session.sync_query(),
            Ok(()) = max_price_rx.changed() => session.sync_query(),
        }
        session.publish();
    }

    info!("event channel closed, session shutting down");
}

pub struct SessionHandle {
    pub events: mpsc::Sender<UiEvent>,
    pub view: watch::Receiver<View>,
    /// The location, rewritten on every filter change.
    pub location: watch::Receiver<Url>,
    pub task: tokio::task::JoinHandle<()>,
}

/// Spawn a session on the current runtime.
pub fn spawn_session(
    settings: SessionSettings,
    client: QueryClient,
    location: Url,
    event_buffer: usize,
) -> SessionHandle {
    let (session, inbox) = Session::new(settings, client, location);
    let view = session.subscribe_view();
    let location = session.subscribe_location();
    let (events, events_rx) = mpsc::channel(event_buffer);
    let task = tokio::spawn(run_session(session, inbox, events_rx));
    SessionHandle {
        events,
        view,
        location,
        task,
    }
}
