//! Application state management for the admin console.
//!
//! This module contains the core `App` struct: UI state, the cache
//! coherence manager, the mutation ledger and background task coordination.
//!
//! Remote calls run in spawned Tokio tasks and report back over an `mpsc`
//! channel. Results are applied between frames by `check_background_tasks`,
//! one at a time, so a mutation's invalidation is never seen half-done.

use std::future::Future;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use courseadmin_core::api::ApiClient;
use courseadmin_core::cache::{CacheKey, CacheManager, FetchTicket, MutationKind};
use courseadmin_core::catalog::{self, keys, Query};
use courseadmin_core::config::Config;
use courseadmin_core::models::{
    ContentItem, ContentItemInput, EnrollmentProgress, LessonProgress, ListParams, Page,
    ProgressSummary, TopicProgress, UserProgress, VideoAsset, VideoInput,
};
use courseadmin_core::mutation::{
    MutationFailure, MutationLedger, MutationOutcome, Notification,
};

use crate::ui::confirm::{ConfirmDialog, PendingDelete};
use crate::ui::prompt::{Prompt, PromptAction};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 64;

/// Maximum concurrent API requests when refetching invalidated views.
const MAX_CONCURRENT_REQUESTS: usize = 6;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Progress,
    Content,
    Videos,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Progress => "Progress",
            Tab::Content => "Content",
            Tab::Videos => "Videos",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Progress => Tab::Content,
            Tab::Content => Tab::Videos,
            Tab::Videos => Tab::Progress,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Progress => Tab::Videos,
            Tab::Content => Tab::Progress,
            Tab::Videos => Tab::Content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    Confirming(ConfirmDialog),
    Prompting(Prompt),
    ConfirmingQuit,
    Quitting,
}

/// Message sent from background tasks to the UI loop.
#[derive(Debug)]
pub enum BackgroundResult {
    Query {
        ticket: FetchTicket,
        result: Result<Value, String>,
    },
    Mutation(MutationOutcome),
}

/// A cached view decoded for rendering.
#[derive(Debug, Clone)]
pub struct View<T> {
    pub data: Option<T>,
    pub stale: bool,
    pub pending: bool,
    pub error: Option<String>,
    pub age: String,
}

impl<T> View<T> {
    fn missing() -> Self {
        Self {
            data: None,
            stale: true,
            pending: false,
            error: None,
            age: "never".to_string(),
        }
    }

    /// Short marker for block titles.
    pub fn status_label(&self) -> Option<&'static str> {
        if self.pending {
            Some("refreshing")
        } else if self.error.is_some() {
            Some("error")
        } else if self.stale {
            Some("stale")
        } else {
            None
        }
    }
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub config: Config,
    api: ApiClient,
    pub cache: CacheManager,
    pub ledger: MutationLedger,

    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,

    pub progress_params: ListParams,
    pub video_params: ListParams,
    pub section_id: Option<String>,

    pub progress_selection: usize,
    pub lesson_selection: usize,
    pub content_selection: usize,
    pub video_selection: usize,

    pub notification: Option<Notification>,

    refresh_rx: mpsc::Receiver<BackgroundResult>,
    refresh_tx: mpsc::Sender<BackgroundResult>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Result<Self> {
        let mut api = ApiClient::new(&config.api_base_url)?;
        match config.api_token {
            Some(ref token) => api.set_token(token.clone()),
            None => warn!("No API token configured, requests will be anonymous"),
        }

        let mut cache = CacheManager::new(config.stale_after());
        catalog::register_defaults(&mut cache);
        debug!(rules = cache.rules().len(), "Invalidation rules registered");

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let page_size = config.page_size;

        Ok(Self {
            section_id: config.default_section_id.clone(),
            config,
            api,
            cache,
            ledger: MutationLedger::new(),

            state: AppState::Normal,
            current_tab: Tab::Progress,
            focus: Focus::List,

            progress_params: ListParams::default().with_limit(page_size),
            video_params: ListParams::default().with_limit(page_size),

            progress_selection: 0,
            lesson_selection: 0,
            content_selection: 0,
            video_selection: 0,

            notification: None,

            refresh_rx: rx,
            refresh_tx: tx,
        })
    }

    // =========================================================================
    // Cached views
    // =========================================================================

    fn view<T: DeserializeOwned>(&self, key: &CacheKey) -> View<T> {
        let Some(entry) = self.cache.read(key) else {
            return View::missing();
        };
        let data = match entry.decode::<T>() {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %key, error = %e, "Cached value has unexpected shape");
                None
            }
        };
        View {
            data,
            stale: entry.is_stale(),
            pending: entry.is_pending(),
            error: entry.error().map(str::to_string),
            age: entry.age_display(),
        }
    }

    pub fn progress_view(&self) -> View<Page<UserProgress>> {
        self.view(&keys::progress_users(&self.progress_params))
    }

    pub fn progress_rows(&self) -> Vec<UserProgress> {
        self.progress_view().data.map(|p| p.items).unwrap_or_default()
    }

    pub fn selected_progress(&self) -> Option<UserProgress> {
        self.progress_rows().into_iter().nth(self.progress_selection)
    }

    pub fn enrollment_view(&self) -> Option<View<EnrollmentProgress>> {
        self.selected_progress()
            .map(|row| self.view(&keys::progress_detail(&row.enrollment_id)))
    }

    pub fn selected_lesson(&self) -> Option<(TopicProgress, LessonProgress)> {
        let detail = self.enrollment_view()?.data?;
        let found = detail
            .lessons()
            .nth(self.lesson_selection)
            .map(|(topic, lesson)| (topic.clone(), lesson.clone()));
        found
    }

    pub fn summary_view(&self) -> Option<View<ProgressSummary>> {
        self.selected_progress()
            .map(|row| self.view(&keys::progress_summary(&row.enrollment_id)))
    }

    /// The selected lesson's topic, as its own view
    pub fn topic_view(&self) -> Option<View<TopicProgress>> {
        let row = self.selected_progress()?;
        let (topic, _) = self.selected_lesson()?;
        Some(self.view(&keys::progress_topic(&row.enrollment_id, &topic.topic_id)))
    }

    pub fn lesson_view(&self) -> Option<View<LessonProgress>> {
        let row = self.selected_progress()?;
        let (_, lesson) = self.selected_lesson()?;
        Some(self.view(&keys::progress_lesson(&row.enrollment_id, &lesson.lesson_id)))
    }

    pub fn content_view(&self) -> Option<View<Vec<ContentItem>>> {
        self.section_id
            .as_ref()
            .map(|section| self.view(&keys::content_items(section)))
    }

    pub fn content_rows(&self) -> Vec<ContentItem> {
        self.content_view().and_then(|v| v.data).unwrap_or_default()
    }

    pub fn selected_content_item(&self) -> Option<ContentItem> {
        self.content_rows().into_iter().nth(self.content_selection)
    }

    pub fn video_view(&self) -> View<Page<VideoAsset>> {
        self.view(&keys::videos(&self.video_params))
    }

    pub fn video_rows(&self) -> Vec<VideoAsset> {
        self.video_view().data.map(|p| p.items).unwrap_or_default()
    }

    pub fn selected_video(&self) -> Option<VideoAsset> {
        self.video_rows().into_iter().nth(self.video_selection)
    }

    /// Length of the list that currently has focus
    pub fn current_list_len(&self) -> usize {
        match (self.current_tab, self.focus) {
            (Tab::Progress, Focus::List) => self.progress_rows().len(),
            (Tab::Progress, Focus::Detail) => self
                .enrollment_view()
                .and_then(|v| v.data)
                .map(|d| d.lesson_count())
                .unwrap_or(0),
            (Tab::Content, _) => self.content_rows().len(),
            (Tab::Videos, _) => self.video_rows().len(),
        }
    }

    pub fn current_selection_mut(&mut self) -> &mut usize {
        match (self.current_tab, self.focus) {
            (Tab::Progress, Focus::List) => &mut self.progress_selection,
            (Tab::Progress, Focus::Detail) => &mut self.lesson_selection,
            (Tab::Content, _) => &mut self.content_selection,
            (Tab::Videos, _) => &mut self.video_selection,
        }
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Queries behind what the current tab shows.
    pub fn visible_queries(&self) -> Vec<Query> {
        match self.current_tab {
            Tab::Progress => {
                let mut queries = vec![Query::ProgressUsers(self.progress_params.clone())];
                if let Some(row) = self.selected_progress() {
                    queries.push(Query::ProgressDetail {
                        enrollment_id: row.enrollment_id.clone(),
                    });
                    queries.push(Query::ProgressSummary {
                        enrollment_id: row.enrollment_id.clone(),
                    });
                    if self.focus == Focus::Detail {
                        if let Some((topic, lesson)) = self.selected_lesson() {
                            queries.push(Query::ProgressTopic {
                                enrollment_id: row.enrollment_id.clone(),
                                topic_id: topic.topic_id,
                            });
                            queries.push(Query::ProgressLesson {
                                enrollment_id: row.enrollment_id,
                                lesson_id: lesson.lesson_id,
                            });
                        }
                    }
                }
                queries
            }
            Tab::Content => self
                .section_id
                .iter()
                .map(|section_id| Query::ContentItems {
                    section_id: section_id.clone(),
                })
                .collect(),
            Tab::Videos => vec![Query::Videos(self.video_params.clone())],
        }
    }

    /// Fetch visible views that are missing or stale. Views already being
    /// fetched are skipped, and failed ones wait for a manual refresh.
    pub fn ensure_visible_fresh(&mut self) {
        let queries: Vec<Query> = self
            .visible_queries()
            .into_iter()
            .filter(|query| match self.cache.read(&query.key()) {
                Some(entry) => !entry.is_fresh() && !entry.is_pending() && entry.error().is_none(),
                None => true,
            })
            .collect();
        if !queries.is_empty() {
            self.spawn_queries(queries);
        }
    }

    /// Invalidate the current tab and refetch what it shows.
    pub fn refresh_current_tab(&mut self) {
        let root = match self.current_tab {
            Tab::Progress => keys::progress_root(),
            Tab::Content => keys::content_root(),
            Tab::Videos => keys::video_root(),
        };
        self.cache.invalidate(&root);
        // Invisible entries stay stale until they are shown again
        let _ = self.cache.take_refetch_queue();
        let queries = self.visible_queries();
        self.spawn_queries(queries);
        self.notification = None;
    }

    fn spawn_queries(&mut self, queries: Vec<Query>) {
        let fetches: Vec<(FetchTicket, Query)> = queries
            .into_iter()
            .map(|query| (self.cache.begin_fetch(&query.key()), query))
            .collect();
        debug!(count = fetches.len(), "Fetching views");

        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            let mut results = stream::iter(fetches)
                .map(|(ticket, query)| {
                    let api = api.clone();
                    async move {
                        let result = api.run_query(&query).await.map_err(|e| format!("{:#}", e));
                        (ticket, result)
                    }
                })
                .buffer_unordered(MAX_CONCURRENT_REQUESTS);

            while let Some((ticket, result)) = results.next().await {
                Self::send_result(&tx, BackgroundResult::Query { ticket, result }).await;
            }
        });
    }

    async fn send_result(tx: &mpsc::Sender<BackgroundResult>, result: BackgroundResult) {
        if tx.send(result).await.is_err() {
            error!("Background result channel closed");
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Start a mutation. The remote call runs in the background; its outcome
    /// is settled by `check_background_tasks` even if the user has moved on.
    /// Destructive kinds are only sent once a dialog has been accepted.
    fn spawn_mutation<F, Fut>(&mut self, kind: MutationKind, input: Value, confirmed: bool, call: F)
    where
        F: FnOnce(ApiClient) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        if catalog::is_destructive(&kind) && !confirmed {
            warn!(kind = %kind, "Refusing unconfirmed destructive mutation");
            return;
        }
        let record = self.ledger.begin(kind.clone(), catalog::label(&kind), input);
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            let result = call(api).await.map_err(MutationFailure::from);
            Self::send_result(&tx, BackgroundResult::Mutation(MutationOutcome::new(record, result))).await;
        });
    }

    /// Toggle completion of the selected lesson
    pub fn toggle_selected_lesson(&mut self) {
        let (Some(row), Some((topic, lesson))) = (self.selected_progress(), self.selected_lesson()) else {
            return;
        };
        let kind = if lesson.completed {
            catalog::MARK_LESSON_INCOMPLETE
        } else {
            catalog::MARK_LESSON_COMPLETED
        };
        if self.ledger.is_pending(&kind) {
            return;
        }
        let input = serde_json::json!({
            "enrollmentId": row.enrollment_id,
            "topicId": topic.topic_id,
            "lessonId": lesson.lesson_id,
        });
        let completed = lesson.completed;
        self.spawn_mutation(kind, input, false, move |api| async move {
            if completed {
                api.mark_lesson_incomplete(&row.enrollment_id, &lesson.lesson_id).await
            } else {
                api.mark_lesson_completed(&row.enrollment_id, &lesson.lesson_id).await
            }
        });
    }

    /// Flip the published flag of the selected content item
    pub fn toggle_publish_selected_item(&mut self) {
        let Some(item) = self.selected_content_item() else {
            return;
        };
        let input = serde_json::json!({
            "id": item.id,
            "sectionId": item.section_id,
            "published": !item.published,
        });
        self.spawn_mutation(catalog::UPDATE_CONTENT_ITEM, input, false, move |api| async move {
            let updated = api
                .update_content_item(&item.id, &ContentItemInput::publish(!item.published))
                .await?;
            Ok(serde_json::to_value(updated)?)
        });
    }

    /// Move the selected content item one place up (`-1`) or down (`1`)
    /// and send the section's new order
    pub fn move_selected_item(&mut self, delta: isize) {
        let Some(section_id) = self.section_id.clone() else {
            return;
        };
        if self.ledger.is_pending(&catalog::REORDER_CONTENT_ITEMS) {
            return;
        }
        let mut ids: Vec<String> = self.content_rows().into_iter().map(|item| item.id).collect();
        let from = self.content_selection;
        let to = from as isize + delta;
        if from >= ids.len() || to < 0 || to as usize >= ids.len() {
            return;
        }
        let to = to as usize;
        ids.swap(from, to);
        self.content_selection = to;

        let input = serde_json::json!({
            "sectionId": section_id,
            "itemIds": ids,
        });
        self.spawn_mutation(catalog::REORDER_CONTENT_ITEMS, input, false, move |api| async move {
            api.reorder_content_items(&section_id, &ids).await
        });
    }

    // =========================================================================
    // Prompts and dialogs
    // =========================================================================

    pub fn open_section_prompt(&mut self) {
        let prompt = Prompt::new(PromptAction::Section).with_text(self.section_id.clone().unwrap_or_default());
        self.state = AppState::Prompting(prompt);
    }

    pub fn request_new_content_item(&mut self) {
        let Some(section_id) = self.section_id.clone() else {
            return;
        };
        self.state = AppState::Prompting(Prompt::new(PromptAction::NewContentItem { section_id }));
    }

    pub fn request_add_video(&mut self) {
        self.state = AppState::Prompting(Prompt::new(PromptAction::AddVideo));
    }

    pub fn request_rename_video(&mut self) {
        let Some(video) = self.selected_video() else {
            return;
        };
        let prompt = Prompt::new(PromptAction::RenameVideo { id: video.id }).with_text(video.title);
        self.state = AppState::Prompting(prompt);
    }

    /// Close the prompt and act on its text. Blank text does nothing.
    pub fn submit_prompt(&mut self) {
        let AppState::Prompting(prompt) = std::mem::replace(&mut self.state, AppState::Normal) else {
            return;
        };
        let Some(value) = prompt.value().map(str::to_string) else {
            return;
        };

        match prompt.action {
            PromptAction::Section => {
                debug!(section = %value, "Section selected");
                self.section_id = Some(value);
                self.content_selection = 0;
                self.focus = Focus::List;
            }
            PromptAction::NewContentItem { section_id } => {
                let input = serde_json::json!({ "sectionId": section_id, "title": value });
                self.spawn_mutation(catalog::CREATE_CONTENT_ITEM, input, false, move |api| async move {
                    let created = api
                        .create_content_item(&section_id, &ContentItemInput::draft(value))
                        .await?;
                    Ok(serde_json::to_value(created)?)
                });
            }
            PromptAction::AddVideo => {
                let body = VideoInput::register(&value);
                let input = serde_json::to_value(&body).unwrap_or(Value::Null);
                self.spawn_mutation(catalog::CREATE_VIDEO, input, false, move |api| async move {
                    let created = api.create_video(&body).await?;
                    Ok(serde_json::to_value(created)?)
                });
            }
            PromptAction::RenameVideo { id } => {
                let input = serde_json::json!({ "id": id, "title": value });
                self.spawn_mutation(catalog::UPDATE_VIDEO, input, false, move |api| async move {
                    let updated = api.update_video(&id, &VideoInput::rename(value)).await?;
                    Ok(serde_json::to_value(updated)?)
                });
            }
        }
    }

    pub fn cancel_prompt(&mut self) {
        if matches!(self.state, AppState::Prompting(_)) {
            self.state = AppState::Normal;
        }
    }

    /// Open the confirmation dialog for deleting the selected record.
    /// Nothing is sent until the dialog is accepted.
    pub fn request_delete(&mut self) {
        let pending = match self.current_tab {
            Tab::Progress => self.selected_progress().map(|row| PendingDelete::Progress {
                enrollment_id: row.enrollment_id,
                learner: row.name,
                course: row.course_title,
            }),
            Tab::Content => self
                .selected_content_item()
                .map(|item| PendingDelete::ContentItem {
                    id: item.id,
                    section_id: item.section_id,
                    title: item.title,
                }),
            Tab::Videos => self.selected_video().map(|video| PendingDelete::Video {
                id: video.id,
                title: video.title,
            }),
        };
        if let Some(pending) = pending {
            self.state = AppState::Confirming(ConfirmDialog::new(pending));
        }
    }

    /// Accept the open dialog and dispatch its delete
    pub fn confirm_dialog(&mut self) {
        let AppState::Confirming(dialog) = std::mem::replace(&mut self.state, AppState::Normal) else {
            return;
        };
        let kind = dialog.action.kind();
        let input = dialog.action.input();
        match dialog.action {
            PendingDelete::Progress { enrollment_id, .. } => {
                self.spawn_mutation(kind, input, true, move |api| async move {
                    api.delete_progress(&enrollment_id).await
                });
            }
            PendingDelete::ContentItem { id, .. } => {
                self.spawn_mutation(kind, input, true, move |api| async move {
                    api.delete_content_item(&id).await
                });
            }
            PendingDelete::Video { id, .. } => {
                self.spawn_mutation(kind, input, true, move |api| async move { api.delete_video(&id).await });
            }
        }
    }

    pub fn cancel_dialog(&mut self) {
        if matches!(self.state, AppState::Confirming(_)) {
            self.state = AppState::Normal;
        }
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Apply every result that has arrived since the last frame
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.refresh_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_background_result(result);
        }
    }

    pub fn process_background_result(&mut self, result: BackgroundResult) {
        match result {
            BackgroundResult::Query { ticket, result } => {
                match result {
                    Ok(value) => {
                        if !self.cache.complete_fetch(&ticket, value) {
                            debug!(key = %ticket.key(), "Fetch result arrived after invalidation");
                        }
                    }
                    Err(e) => {
                        warn!(key = %ticket.key(), error = %e, "Fetch failed");
                        self.cache.fail_fetch(&ticket, e);
                    }
                }
                // Results older than an invalidation are queued again
                self.refetch_invalidated();
            }
            BackgroundResult::Mutation(outcome) => {
                let succeeded = outcome.result.is_ok();
                let kind = outcome.record.kind.clone();
                let input = outcome.record.input.clone();

                let note = self.ledger.settle(&mut self.cache, outcome);
                self.notification = Some(note);

                if succeeded {
                    self.evict_deleted(&kind, &input);
                    self.clamp_selections();
                }
                self.refetch_invalidated();
            }
        }
    }

    /// A deleted record's own detail view cannot be refetched
    fn evict_deleted(&mut self, kind: &MutationKind, input: &Value) {
        let Some(id) = catalog::id_field(input, "id") else {
            return;
        };
        if *kind == catalog::DELETE_VIDEO {
            self.cache.evict(&keys::video(&id));
        } else if *kind == catalog::DELETE_CONTENT_ITEM {
            self.cache.evict(&keys::content_item(&id));
        }
    }

    fn refetch_invalidated(&mut self) {
        let queries: Vec<Query> = self
            .cache
            .take_refetch_queue()
            .iter()
            .filter_map(Query::from_key)
            .collect();
        if !queries.is_empty() {
            self.spawn_queries(queries);
        }
    }

    fn clamp_selections(&mut self) {
        self.progress_selection = self.progress_selection.min(self.progress_rows().len().saturating_sub(1));
        self.content_selection = self.content_selection.min(self.content_rows().len().saturating_sub(1));
        self.video_selection = self.video_selection.min(self.video_rows().len().saturating_sub(1));
    }

    /// Drop the notification once its time is up
    pub fn expire_notification(&mut self) {
        let ttl = self.config.notification_ttl();
        if self.notification.as_ref().is_some_and(|n| n.is_expired(ttl)) {
            if let Some(note) = self.notification.take() {
                debug!(message = %note.message, "Notification expired");
            }
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn switch_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.focus = Focus::List;
    }

    pub fn select_enrollment(&mut self) {
        if self.current_tab == Tab::Progress && self.selected_progress().is_some() {
            self.focus = Focus::Detail;
            self.lesson_selection = 0;
        }
    }

    pub fn next_page(&mut self) {
        let (params, selection, total_pages) = match self.current_tab {
            Tab::Progress => {
                let pages = self.progress_view().data.map(|p| p.total_pages(self.progress_params.limit));
                (&mut self.progress_params, &mut self.progress_selection, pages)
            }
            Tab::Videos => {
                let pages = self.video_view().data.map(|p| p.total_pages(self.video_params.limit));
                (&mut self.video_params, &mut self.video_selection, pages)
            }
            Tab::Content => return,
        };
        if total_pages.is_some_and(|total| u64::from(params.page) >= total) {
            return;
        }
        params.page += 1;
        *selection = 0;
    }

    pub fn prev_page(&mut self) {
        let (params, selection) = match self.current_tab {
            Tab::Progress => (&mut self.progress_params, &mut self.progress_selection),
            Tab::Videos => (&mut self.video_params, &mut self.video_selection),
            Tab::Content => return,
        };
        if params.page > 1 {
            params.page -= 1;
            *selection = 0;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
