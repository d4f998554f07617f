//! Client sync controller.
//!
//! Keeps the locally accumulated list of todos in step with the server while
//! the user filters, scrolls and mutates. Modeled as a reducer: every request
//! is an `Effect::Future` whose result comes back as an action.
//!
//! # Generations
//!
//! Each initial fetch (mount, filter change, refetch after a mutation) bumps
//! `generation`, and every list request carries the generation that issued
//! it. A page whose generation is no longer current is dropped, so the last
//! issued fetch always wins regardless of the order responses arrive in.
//!
//! # Paging
//!
//! `has_more` is `page.len() == PAGE_SIZE` for every page, first or appended.
//! Load more is ignored unless `has_more` holds, something is loaded, and no
//! list fetch is in flight.
//!
//! # Failures
//!
//! The in-flight list fetch and the last failure are tracked separately. A
//! create or complete that fails while a page is loading records the error
//! but leaves the fetch in flight, so load more stays gated until that page
//! lands. A failure is cleared only when a new list request is issued.

use crate::api::TodoApi;
use crate::error::ClientError;
use mood_todos_core::todo::{ListQuery, Mood, PAGE_SIZE, Todo, TodoId};
use mood_todos_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use mood_todos_runtime::Store;
use std::sync::Arc;

/// Where the controller is, as derived by [`SyncState::phase`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in flight
    #[default]
    Idle,
    /// First page requested, accumulated todos already discarded
    LoadingInitial,
    /// Next page requested with the last id as cursor
    LoadingMore,
    /// Nothing in flight and the last request failed; accumulated todos are kept
    Error,
}

/// Kind of list request in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fetch {
    /// First page for the current filter
    Initial,
    /// Page after the last accumulated todo
    More,
}

impl Fetch {
    const fn appends(self) -> bool {
        matches!(self, Self::More)
    }
}

/// Filter the accumulated todos were produced by.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    /// Only open todos
    pub unaccomplished_only: bool,
    /// Case-insensitive substring; empty means no filter
    pub search_text: String,
}

impl Filter {
    fn to_query(&self, cursor: Option<TodoId>) -> ListQuery {
        ListQuery::new()
            .unaccomplished_only(self.unaccomplished_only)
            .search(self.search_text.clone())
            .before(cursor)
    }
}

/// Controller state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncState {
    /// List request in flight for the current generation
    pub in_flight: Option<Fetch>,
    /// Pages accumulated for `filter`, newest first
    pub todos: Vec<Todo>,
    /// Active filter
    pub filter: Filter,
    /// Whether another page may exist
    pub has_more: bool,
    /// Tag of the current initial fetch
    pub generation: u64,
    /// Most recent failure since the last list request was issued
    pub last_error: Option<ClientError>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            in_flight: None,
            todos: Vec::new(),
            filter: Filter::default(),
            has_more: true,
            generation: 0,
            last_error: None,
        }
    }
}

impl SyncState {
    /// Whether a list fetch is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Current phase. An in-flight fetch takes precedence over a recorded failure.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match (self.in_flight, &self.last_error) {
            (Some(Fetch::Initial), _) => Phase::LoadingInitial,
            (Some(Fetch::More), _) => Phase::LoadingMore,
            (None, Some(_)) => Phase::Error,
            (None, None) => Phase::Idle,
        }
    }

    /// Cursor for the next page: the id of the last accumulated todo.
    #[must_use]
    pub fn cursor(&self) -> Option<TodoId> {
        self.todos.last().map(|todo| todo.id)
    }

    /// Whether a load-more request would be issued now.
    #[must_use]
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.todos.is_empty() && !self.is_loading()
    }
}

/// Inputs to the controller: user intents and request results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncAction {
    /// View appeared; fetch the first page
    Mount,
    /// Toggle the completion filter
    SetUnaccomplishedOnly(bool),
    /// Change the search text
    SetSearchText(String),
    /// User scrolled to the end
    LoadMore,
    /// Create a todo, then refetch
    CreateTodo {
        /// Mood tag
        mood: Mood,
        /// Text
        text: String,
    },
    /// Complete a todo, then refetch
    CompleteTodo(TodoId),

    /// A list request finished
    PageLoaded {
        /// Generation that issued the request
        generation: u64,
        /// Whether the page extends the accumulated todos
        append: bool,
        /// Page or failure
        result: Result<Vec<Todo>, ClientError>,
    },
    /// A create request finished
    TodoCreated(Result<Todo, ClientError>),
    /// A completion request finished
    TodoCompleted(Result<Todo, ClientError>),
}

/// Dependencies of the controller.
#[derive(Clone)]
pub struct SyncEnvironment {
    /// Collection API
    pub api: Arc<dyn TodoApi>,
}

impl SyncEnvironment {
    /// Create an environment around an API client.
    #[must_use]
    pub fn new(api: Arc<dyn TodoApi>) -> Self {
        Self { api }
    }
}

impl std::fmt::Debug for SyncEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEnvironment").finish_non_exhaustive()
    }
}

/// Reducer driving [`SyncState`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SyncReducer;

/// Store running the controller.
pub type SyncStore = Store<SyncState, SyncAction, SyncEnvironment, SyncReducer>;

/// Create a controller store in its initial state.
#[must_use]
pub fn sync_store(api: Arc<dyn TodoApi>) -> SyncStore {
    Store::new(SyncState::default(), SyncReducer, SyncEnvironment::new(api))
}

impl SyncReducer {
    /// Create a new reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Discard the accumulated todos and request the first page under a new generation.
    fn start_initial_fetch(
        state: &mut SyncState,
        env: &SyncEnvironment,
    ) -> SmallVec<[Effect<SyncAction>; 4]> {
        state.generation += 1;
        state.in_flight = Some(Fetch::Initial);
        state.todos.clear();
        state.has_more = true;
        state.last_error = None;

        tracing::debug!(generation = state.generation, "Starting initial fetch");
        smallvec![fetch_page(env, state.filter.to_query(None), state.generation, false)]
    }

    fn fail(state: &mut SyncState, error: ClientError) {
        tracing::warn!(error = %error, "Sync request failed");
        state.last_error = Some(error);
    }
}

fn fetch_page(
    env: &SyncEnvironment,
    query: ListQuery,
    generation: u64,
    append: bool,
) -> Effect<SyncAction> {
    let api = Arc::clone(&env.api);
    Effect::future(async move {
        let result = api.list_todos(query).await;
        Some(SyncAction::PageLoaded {
            generation,
            append,
            result,
        })
    })
}

impl Reducer for SyncReducer {
    type State = SyncState;
    type Action = SyncAction;
    type Environment = SyncEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SyncAction::Mount => Self::start_initial_fetch(state, env),

            SyncAction::SetUnaccomplishedOnly(only) => {
                if state.filter.unaccomplished_only == only {
                    return SmallVec::new();
                }
                state.filter.unaccomplished_only = only;
                Self::start_initial_fetch(state, env)
            },

            SyncAction::SetSearchText(text) => {
                if state.filter.search_text == text {
                    return SmallVec::new();
                }
                state.filter.search_text = text;
                Self::start_initial_fetch(state, env)
            },

            SyncAction::LoadMore => {
                if !state.can_load_more() {
                    tracing::trace!(
                        in_flight = ?state.in_flight,
                        has_more = state.has_more,
                        "Load more ignored"
                    );
                    return SmallVec::new();
                }
                state.in_flight = Some(Fetch::More);
                state.last_error = None;
                let query = state.filter.to_query(state.cursor());

                tracing::debug!(
                    generation = state.generation,
                    cursor = ?query.cursor,
                    "Loading more"
                );
                smallvec![fetch_page(env, query, state.generation, true)]
            },

            SyncAction::CreateTodo { mood, text } => {
                let api = Arc::clone(&env.api);
                smallvec![Effect::future(async move {
                    Some(SyncAction::TodoCreated(api.create_todo(mood, text).await))
                })]
            },

            SyncAction::CompleteTodo(id) => {
                let api = Arc::clone(&env.api);
                smallvec![Effect::future(async move {
                    Some(SyncAction::TodoCompleted(api.accomplish_todo(id).await))
                })]
            },

            SyncAction::PageLoaded {
                generation,
                append,
                result,
            } => {
                if generation != state.generation {
                    tracing::debug!(
                        stale = generation,
                        current = state.generation,
                        "Discarding superseded page"
                    );
                    return SmallVec::new();
                }
                if state.in_flight.map(Fetch::appends) != Some(append) {
                    tracing::warn!(
                        append,
                        in_flight = ?state.in_flight,
                        "Discarding unrequested page"
                    );
                    return SmallVec::new();
                }
                state.in_flight = None;

                match result {
                    Ok(page) => {
                        state.has_more = page.len() == PAGE_SIZE;
                        if append {
                            state.todos.extend(page);
                        } else {
                            state.todos = page;
                        }
                    },
                    Err(error) => Self::fail(state, error),
                }
                SmallVec::new()
            },

            SyncAction::TodoCreated(Ok(_)) | SyncAction::TodoCompleted(Ok(_)) => {
                Self::start_initial_fetch(state, env)
            },

            SyncAction::TodoCreated(Err(error)) | SyncAction::TodoCompleted(Err(error)) => {
                Self::fail(state, error);
                SmallVec::new()
            },
        }
    }
}
