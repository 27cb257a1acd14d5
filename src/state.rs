//! Application state and every operation that mutates it.
//!
//! The roster is only changed through the methods here; each roster change is
//! followed by a save. AI requests run on worker threads and their results are
//! applied on the UI thread by [`AppState::poll_ai`], in arrival order, keyed
//! by client id rather than by the screen that was showing.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::audio::{AudioClip, AudioSink};
use crate::clipboard::Clipboard;
use crate::error::Result;
use crate::gemini::{AiGateway, ANALYSIS_SYSTEM_INSTRUCTION, PLAN_SYSTEM_INSTRUCTION};
use crate::models::{today_label, Client, Workout};
use crate::storage::Persistence;
use crate::timer::RestTimer;

pub const ANALYSIS_FAILED: &str = "Analysis failed.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    Client { client_id: String },
    Workout { client_id: String, workout_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Modal {
    #[default]
    None,
    AddClient,
    AddWorkout,
    AiPlan,
    AiAnalysis,
    ConfirmDeleteWorkout { workout_id: String },
}

/// Everything the renderer may ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Navigate(View),
    OpenModal(Modal),
    CloseModal,
    SetInput(String),
    SetSearch(String),
    TogglePlan,
    SubmitClient,
    SubmitWorkout { client_id: String },
    SubmitAiPlan { client_id: String },
    UpdatePlan { client_id: String, text: String },
    UpdateGoal { client_id: String, goal: String, goal_date: String },
    UpdateWorkoutContent { client_id: String, workout_id: String, text: String },
    DeleteWorkout { client_id: String, workout_id: String },
    AnalyzeHistory { client_id: String },
    Speak(String),
    StartTimer(u32),
    StopTimer,
    Share(String),
}

enum AiOutcome {
    Plan { client_id: String, result: Result<String> },
    Analysis { result: Result<String> },
    Speech { clip: Option<AudioClip> },
}

pub struct AppState {
    roster: Vec<Client>,
    persistence: Persistence,
    gateway: Arc<dyn AiGateway>,
    audio: Box<dyn AudioSink>,
    clipboard: Box<dyn Clipboard>,

    view: View,
    modal: Modal,
    input: String,
    search_query: String,
    show_plan: bool,
    ai_response: String,
    timer: RestTimer,
    pending_copy: Option<String>,

    ai_tx: Sender<AiOutcome>,
    ai_rx: Receiver<AiOutcome>,
    ai_in_flight: usize,
}

impl AppState {
    /// Loads the roster and starts on the home screen.
    pub fn new(
        persistence: Persistence,
        gateway: Arc<dyn AiGateway>,
        audio: Box<dyn AudioSink>,
        clipboard: Box<dyn Clipboard>,
    ) -> Self {
        let roster = persistence.load();
        info!(clients = roster.len(), "Roster loaded");
        let (ai_tx, ai_rx) = mpsc::channel();
        AppState {
            roster,
            persistence,
            gateway,
            audio,
            clipboard,
            view: View::Home,
            modal: Modal::None,
            input: String::new(),
            search_query: String::new(),
            show_plan: false,
            ai_response: String::new(),
            timer: RestTimer::default(),
            pending_copy: None,
            ai_tx,
            ai_rx,
            ai_in_flight: 0,
        }
    }

    // ----- reads -----

    pub fn roster(&self) -> &[Client] {
        &self.roster
    }

    pub fn client(&self, client_id: &str) -> Option<&Client> {
        self.roster.iter().find(|c| c.id == client_id)
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn show_plan(&self) -> bool {
        self.show_plan
    }

    pub fn is_ai_busy(&self) -> bool {
        self.ai_in_flight > 0
    }

    pub fn ai_response(&self) -> &str {
        &self.ai_response
    }

    pub fn timer(&self) -> &RestTimer {
        &self.timer
    }

    pub fn current_client(&self) -> Option<&Client> {
        match &self.view {
            View::Home => None,
            View::Client { client_id } | View::Workout { client_id, .. } => self.client(client_id),
        }
    }

    pub fn current_workout(&self) -> Option<&Workout> {
        match &self.view {
            View::Workout { workout_id, .. } => self.current_client()?.workout(workout_id),
            _ => None,
        }
    }

    /// Case-insensitive name match against the search query.
    pub fn filtered_clients(&self) -> Vec<&Client> {
        let needle = self.search_query.to_lowercase();
        self.roster
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .collect()
    }

    // ----- navigation and transient input -----

    pub fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::Navigate(view) => self.navigate(view),
            Intent::OpenModal(modal) => self.open_modal(modal),
            Intent::CloseModal => self.close_modal(),
            Intent::SetInput(text) => self.set_input(text),
            Intent::SetSearch(text) => self.set_search_query(text),
            Intent::TogglePlan => self.toggle_plan(),
            Intent::SubmitClient => {
                let name = self.input.clone();
                self.add_client(&name);
            }
            Intent::SubmitWorkout { client_id } => {
                let title = self.input.clone();
                self.add_workout(&client_id, &title);
            }
            Intent::SubmitAiPlan { client_id } => {
                let prompt = self.input.clone();
                self.request_ai_plan(&client_id, &prompt);
            }
            Intent::UpdatePlan { client_id, text } => self.update_client_plan(&client_id, &text),
            Intent::UpdateGoal { client_id, goal, goal_date } => {
                self.update_client_goal(&client_id, &goal, &goal_date)
            }
            Intent::UpdateWorkoutContent { client_id, workout_id, text } => {
                self.update_workout_content(&client_id, &workout_id, &text)
            }
            Intent::DeleteWorkout { client_id, workout_id } => {
                self.delete_workout(&client_id, &workout_id)
            }
            Intent::AnalyzeHistory { client_id } => self.request_ai_analysis(&client_id),
            Intent::Speak(text) => self.request_speech(&text),
            Intent::StartTimer(seconds) => self.start_timer(seconds),
            Intent::StopTimer => self.stop_timer(),
            Intent::Share(text) => self.share_workout_content(&text),
        }
    }

    /// A modal belongs to the screen it was opened on; leaving that screen closes it.
    pub fn navigate(&mut self, view: View) {
        debug!(?view, "Navigate");
        if view != self.view && self.modal != Modal::None {
            self.close_modal();
        }
        self.view = view;
    }

    /// Resets the shared input; the add-workout form starts with today's date.
    pub fn open_modal(&mut self, modal: Modal) {
        self.input = match modal {
            Modal::AddWorkout => today_label(),
            _ => String::new(),
        };
        if modal == Modal::AiAnalysis {
            self.ai_response.clear();
        }
        self.modal = modal;
    }

    pub fn close_modal(&mut self) {
        if self.modal == Modal::AiAnalysis {
            self.ai_response.clear();
        }
        self.modal = Modal::None;
    }

    pub fn set_input(&mut self, text: String) {
        self.input = text;
    }

    pub fn set_search_query(&mut self, text: String) {
        self.search_query = text;
    }

    pub fn toggle_plan(&mut self) {
        self.show_plan = !self.show_plan;
    }

    // ----- roster -----

    fn commit(&mut self) {
        self.persistence.save(&self.roster);
    }

    fn client_mut(&mut self, client_id: &str) -> Option<&mut Client> {
        self.roster.iter_mut().find(|c| c.id == client_id)
    }

    pub fn add_client(&mut self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let client = Client::new(name);
        let id = client.id.clone();
        info!(client_id = %id, "Client added");
        self.roster.push(client);
        self.commit();
        self.input.clear();
        self.modal = Modal::None;
        Some(id)
    }

    pub fn update_client_plan(&mut self, client_id: &str, text: &str) {
        let Some(client) = self.client_mut(client_id) else {
            warn!(client_id, "Plan update for unknown client");
            return;
        };
        client.plan = text.to_string();
        self.commit();
    }

    pub fn update_client_goal(&mut self, client_id: &str, goal: &str, goal_date: &str) {
        let Some(client) = self.client_mut(client_id) else {
            warn!(client_id, "Goal update for unknown client");
            return;
        };
        client.goal = goal.to_string();
        client.goal_date = goal_date.to_string();
        self.commit();
    }

    /// New workout goes first, seeded with the client's current plan.
    pub fn add_workout(&mut self, client_id: &str, title: &str) -> Option<String> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let Some(client) = self.client_mut(client_id) else {
            warn!(client_id, "Workout added to unknown client");
            return None;
        };
        let workout = Workout::from_plan(title, &client.plan);
        let id = workout.id.clone();
        client.workouts.insert(0, workout);
        info!(client_id, workout_id = %id, "Workout added");
        self.commit();
        self.input.clear();
        self.modal = Modal::None;
        Some(id)
    }

    pub fn delete_workout(&mut self, client_id: &str, workout_id: &str) {
        if let Some(client) = self.client_mut(client_id) {
            let before = client.workouts.len();
            client.workouts.retain(|w| w.id != workout_id);
            if client.workouts.len() != before {
                info!(client_id, workout_id, "Workout deleted");
            }
            self.commit();
        }
        self.modal = Modal::None;
    }

    pub fn update_workout_content(&mut self, client_id: &str, workout_id: &str, text: &str) {
        let Some(workout) = self.client_mut(client_id).and_then(|c| c.workout_mut(workout_id)) else {
            warn!(client_id, workout_id, "Content update for unknown workout");
            return;
        };
        workout.content = text.to_string();
        self.commit();
    }

    // ----- AI -----

    fn spawn_ai<F>(&mut self, name: &str, job: F)
    where
        F: FnOnce(&dyn AiGateway) -> AiOutcome + Send + 'static,
    {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.ai_tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("ai-{name}"))
            .spawn(move || {
                let outcome = job(gateway.as_ref());
                let _ = tx.send(outcome);
            });
        match spawned {
            Ok(_) => self.ai_in_flight += 1,
            Err(e) => warn!("Failed to start {} request: {}", name, e),
        }
    }

    /// Generates a plan from the prompt. The modal closes when the request completes.
    pub fn request_ai_plan(&mut self, client_id: &str, prompt: &str) {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return;
        }
        let client_id = client_id.to_string();
        let prompt = format!(
            "Build a workout structure based on this request: \"{prompt}\". \
             Return only the workout text itself (exercises, sets)."
        );
        self.spawn_ai("plan", move |gateway| AiOutcome::Plan {
            result: gateway.generate_plan_text(&prompt, PLAN_SYSTEM_INSTRUCTION),
            client_id,
        });
    }

    /// Opens the analysis modal right away; the summary arrives later.
    pub fn request_ai_analysis(&mut self, client_id: &str) {
        let Some(client) = self.client(client_id) else {
            return;
        };
        let prompt = format!(
            "Analyze this client's training history:\n{}\n\n\
             Give a short progress summary (2-3 sentences) and a recommendation.",
            client.history_text()
        );
        self.open_modal(Modal::AiAnalysis);
        self.spawn_ai("analysis", move |gateway| AiOutcome::Analysis {
            result: gateway.generate_plan_text(&prompt, ANALYSIS_SYSTEM_INSTRUCTION),
        });
    }

    pub fn request_speech(&mut self, text: &str) {
        if self.is_ai_busy() || text.trim().is_empty() {
            return;
        }
        let text = text.to_string();
        self.spawn_ai("speech", move |gateway| AiOutcome::Speech {
            clip: gateway.synthesize_speech(&text),
        });
    }

    fn apply_ai(&mut self, outcome: AiOutcome) {
        self.ai_in_flight = self.ai_in_flight.saturating_sub(1);
        match outcome {
            AiOutcome::Plan { client_id, result } => {
                match result {
                    Ok(plan) => {
                        info!(client_id = %client_id, "AI plan generated");
                        self.update_client_plan(&client_id, &plan);
                    }
                    Err(e) => warn!(client_id = %client_id, "AI plan generation failed: {}", e),
                }
                if self.modal == Modal::AiPlan {
                    self.modal = Modal::None;
                }
            }
            AiOutcome::Analysis { result } => {
                self.ai_response = result.unwrap_or_else(|e| {
                    warn!("AI analysis failed: {}", e);
                    ANALYSIS_FAILED.to_string()
                });
            }
            AiOutcome::Speech { clip: Some(clip) } => {
                if let Err(e) = self.audio.play(&clip) {
                    warn!("Speech playback failed: {}", e);
                }
            }
            AiOutcome::Speech { clip: None } => debug!("No speech audio available"),
        }
    }

    /// Applies finished AI jobs without blocking. Returns how many were applied.
    pub fn poll_ai(&mut self) -> usize {
        self.audio.reap();
        let mut applied = 0;
        while let Ok(outcome) = self.ai_rx.try_recv() {
            self.apply_ai(outcome);
            applied += 1;
        }
        applied
    }

    /// Blocks until every in-flight AI job has been applied.
    pub fn wait_for_ai(&mut self) {
        while self.ai_in_flight > 0 {
            match self.ai_rx.recv() {
                Ok(outcome) => self.apply_ai(outcome),
                Err(_) => break,
            }
        }
    }

    // ----- timer -----

    pub fn start_timer(&mut self, seconds: u32) {
        self.timer.start(seconds, Instant::now());
    }

    pub fn stop_timer(&mut self) {
        self.timer.stop();
    }

    pub fn tick_timer(&mut self, now: Instant) -> u32 {
        self.timer.advance(now)
    }

    // ----- clipboard -----

    /// Falls back to the frame clipboard when the system clipboard is unavailable.
    pub fn share_workout_content(&mut self, text: &str) {
        if let Err(e) = self.clipboard.write_text(text) {
            debug!("System clipboard unavailable, using window clipboard: {}", e);
            self.pending_copy = Some(text.to_string());
        }
    }

    pub fn take_pending_copy(&mut self) -> Option<String> {
        self.pending_copy.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::{KeyValueStore, MemoryStore, STORAGE_KEY};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGateway {
        text: Option<String>,
        audio: bool,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl AiGateway for FakeGateway {
        fn generate_plan_text(&self, prompt: &str, system: &str) -> Result<String> {
            self.prompts.lock().unwrap().push((prompt.to_string(), system.to_string()));
            self.text.clone().ok_or(Error::Status(503))
        }

        fn synthesize_speech(&self, _text: &str) -> Option<AudioClip> {
            self.audio.then(|| AudioClip::from_base64_pcm("AAEAAQ==").unwrap())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        played: Arc<Mutex<Vec<AudioClip>>>,
    }

    impl AudioSink for RecordingSink {
        fn play(&mut self, clip: &AudioClip) -> Result<()> {
            self.played.lock().unwrap().push(clip.clone());
            Ok(())
        }
    }

    struct NoClipboard;

    impl Clipboard for NoClipboard {
        fn write_text(&mut self, _text: &str) -> Result<()> {
            Err(Error::Clipboard("unavailable".into()))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingClipboard {
        copied: Arc<Mutex<Vec<String>>>,
    }

    impl Clipboard for RecordingClipboard {
        fn write_text(&mut self, text: &str) -> Result<()> {
            self.copied.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn state_with(gateway: FakeGateway) -> (AppState, MemoryStore) {
        let store = MemoryStore::new();
        let state = AppState::new(
            Persistence::new(Box::new(store.clone())),
            Arc::new(gateway),
            Box::new(RecordingSink::default()),
            Box::new(RecordingClipboard::default()),
        );
        (state, store)
    }

    fn stored(store: &MemoryStore) -> Vec<Client> {
        serde_json::from_str(&store.get(STORAGE_KEY).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn add_client_assigns_unique_ids_and_persists() {
        let (mut state, store) = state_with(FakeGateway::default());
        let ids: Vec<String> = ["Ann", "Bob", "Cid"]
            .iter()
            .map(|n| state.add_client(n).unwrap())
            .collect();
        assert_eq!(state.roster().len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
        assert_eq!(stored(&store), state.roster());
    }

    #[test]
    fn blank_client_name_is_ignored() {
        let (mut state, store) = state_with(FakeGateway::default());
        state.open_modal(Modal::AddClient);
        assert_eq!(state.add_client("   "), None);
        assert!(state.roster().is_empty());
        assert_eq!(state.modal(), &Modal::AddClient);
        assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn submit_client_uses_input_and_closes_modal() {
        let (mut state, _) = state_with(FakeGateway::default());
        state.dispatch(Intent::OpenModal(Modal::AddClient));
        state.dispatch(Intent::SetInput("  Ann Lee ".into()));
        state.dispatch(Intent::SubmitClient);
        assert_eq!(state.roster()[0].name, "Ann Lee");
        assert_eq!(state.input(), "");
        assert_eq!(state.modal(), &Modal::None);
    }

    #[test]
    fn add_workout_prepends_with_plan_as_content() {
        let (mut state, _) = state_with(FakeGateway::default());
        let id = state.add_client("Ann").unwrap();
        state.update_client_plan(&id, "Squats 5x5");
        let first = state.add_workout(&id, "Day 1").unwrap();
        state.update_client_plan(&id, "Deadlift 3x3");
        let second = state.add_workout(&id, "Day 2").unwrap();

        let workouts = &state.client(&id).unwrap().workouts;
        assert_eq!(workouts[0].id, second);
        assert_eq!(workouts[0].content, "Deadlift 3x3");
        assert_eq!(workouts[1].id, first);
        assert_eq!(workouts[1].content, "Squats 5x5");
    }

    #[test]
    fn add_workout_modal_prefills_date() {
        let (mut state, _) = state_with(FakeGateway::default());
        state.open_modal(Modal::AddWorkout);
        assert_eq!(state.input(), today_label());
    }

    #[test]
    fn delete_workout_keeps_sibling_order() {
        let (mut state, _) = state_with(FakeGateway::default());
        let id = state.add_client("Ann").unwrap();
        let a = state.add_workout(&id, "A").unwrap();
        let b = state.add_workout(&id, "B").unwrap();
        let c = state.add_workout(&id, "C").unwrap();
        state.open_modal(Modal::ConfirmDeleteWorkout { workout_id: b.clone() });
        state.delete_workout(&id, &b);
        let ids: Vec<&str> = state.client(&id).unwrap().workouts.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec![c.as_str(), a.as_str()]);
        assert_eq!(state.modal(), &Modal::None);
    }

    #[test]
    fn content_edit_touches_only_target_workout() {
        let (mut state, store) = state_with(FakeGateway::default());
        let id = state.add_client("Ann").unwrap();
        let a = state.add_workout(&id, "A").unwrap();
        let b = state.add_workout(&id, "B").unwrap();
        state.update_workout_content(&id, &a, "Bench 3x8");
        let client = state.client(&id).unwrap();
        assert_eq!(client.workout(&a).unwrap().content, "Bench 3x8");
        assert_eq!(client.workout(&b).unwrap().content, "");
        assert_eq!(stored(&store), state.roster());
    }

    #[test]
    fn goal_update_persists() {
        let (mut state, store) = state_with(FakeGateway::default());
        let id = state.add_client("Ann").unwrap();
        state.update_client_goal(&id, "Run 10k", "01.06.2027");
        assert_eq!(stored(&store)[0].goal, "Run 10k");
        assert_eq!(stored(&store)[0].goal_date, "01.06.2027");
    }

    #[test]
    fn search_filters_case_insensitively() {
        let (mut state, _) = state_with(FakeGateway::default());
        state.add_client("Ann Lee");
        state.add_client("Bob Stone");
        state.set_search_query("LEE".into());
        let names: Vec<&str> = state.filtered_clients().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ann Lee"]);
    }

    #[test]
    fn stale_view_resolves_to_nothing() {
        let (mut state, _) = state_with(FakeGateway::default());
        let id = state.add_client("Ann").unwrap();
        let w = state.add_workout(&id, "A").unwrap();
        state.navigate(View::Workout { client_id: id.clone(), workout_id: w.clone() });
        assert!(state.current_workout().is_some());
        state.delete_workout(&id, &w);
        assert!(state.current_client().is_some());
        assert!(state.current_workout().is_none());
    }

    #[test]
    fn ai_plan_success_replaces_plan_and_closes_modal() {
        let gateway = FakeGateway { text: Some("Squats 5x5".into()), ..Default::default() };
        let (mut state, store) = state_with(gateway);
        let id = state.add_client("Ann").unwrap();
        state.open_modal(Modal::AiPlan);
        state.request_ai_plan(&id, "legs");
        assert!(state.is_ai_busy());
        state.wait_for_ai();
        assert!(!state.is_ai_busy());
        assert_eq!(state.client(&id).unwrap().plan, "Squats 5x5");
        assert_eq!(stored(&store)[0].plan, "Squats 5x5");
        assert_eq!(state.modal(), &Modal::None);
    }

    #[test]
    fn ai_plan_failure_leaves_plan_unchanged() {
        let (mut state, _) = state_with(FakeGateway::default());
        let id = state.add_client("Ann").unwrap();
        state.update_client_plan(&id, "Old plan");
        state.open_modal(Modal::AiPlan);
        state.request_ai_plan(&id, "legs");
        state.wait_for_ai();
        assert_eq!(state.client(&id).unwrap().plan, "Old plan");
        assert_eq!(state.modal(), &Modal::None);
        assert!(!state.is_ai_busy());
    }

    #[test]
    fn blank_ai_prompt_is_ignored() {
        let (mut state, _) = state_with(FakeGateway::default());
        let id = state.add_client("Ann").unwrap();
        state.request_ai_plan(&id, " ");
        assert!(!state.is_ai_busy());
    }

    #[test]
    fn analysis_opens_modal_and_sends_history() {
        let gateway = Arc::new(FakeGateway { text: Some("Good progress.".into()), ..Default::default() });
        let mut state = AppState::new(
            Persistence::new(Box::new(MemoryStore::new())),
            gateway.clone(),
            Box::new(RecordingSink::default()),
            Box::new(RecordingClipboard::default()),
        );
        let id = state.add_client("Ann").unwrap();
        let w = state.add_workout(&id, "Leg Day").unwrap();
        state.update_workout_content(&id, &w, "Squats");
        state.request_ai_analysis(&id);
        assert_eq!(state.modal(), &Modal::AiAnalysis);
        assert_eq!(state.ai_response(), "");
        state.wait_for_ai();
        assert_eq!(state.ai_response(), "Good progress.");

        let prompts = gateway.prompts.lock().unwrap();
        assert!(prompts[0].0.contains("Leg Day: Squats"));
        assert_eq!(prompts[0].1, ANALYSIS_SYSTEM_INSTRUCTION);

        drop(prompts);
        state.close_modal();
        assert_eq!(state.ai_response(), "");
    }

    #[test]
    fn analysis_failure_shows_placeholder() {
        let (mut state, _) = state_with(FakeGateway::default());
        let id = state.add_client("Ann").unwrap();
        state.request_ai_analysis(&id);
        state.wait_for_ai();
        assert_eq!(state.ai_response(), ANALYSIS_FAILED);
    }

    #[test]
    fn speech_plays_returned_clip() {
        let sink = RecordingSink::default();
        let mut state = AppState::new(
            Persistence::new(Box::new(MemoryStore::new())),
            Arc::new(FakeGateway { audio: true, ..Default::default() }),
            Box::new(sink.clone()),
            Box::new(RecordingClipboard::default()),
        );
        state.request_speech("Squats 5x5");
        state.wait_for_ai();
        assert_eq!(sink.played.lock().unwrap().len(), 1);
        assert!(!state.is_ai_busy());
    }

    #[test]
    fn speech_without_audio_is_silent() {
        let sink = RecordingSink::default();
        let mut state = AppState::new(
            Persistence::new(Box::new(MemoryStore::new())),
            Arc::new(FakeGateway::default()),
            Box::new(sink.clone()),
            Box::new(RecordingClipboard::default()),
        );
        state.request_speech("Squats 5x5");
        state.wait_for_ai();
        assert!(sink.played.lock().unwrap().is_empty());
        assert!(!state.is_ai_busy());
    }

    #[test]
    fn speech_is_skipped_while_busy_or_empty() {
        let (mut state, _) = state_with(FakeGateway { audio: true, ..Default::default() });
        state.request_speech("  ");
        assert!(!state.is_ai_busy());
        let id = state.add_client("Ann").unwrap();
        state.request_ai_analysis(&id);
        state.request_speech("Squats");
        assert_eq!(state.ai_in_flight, 1);
        state.wait_for_ai();
    }

    #[test]
    fn timer_counts_down_from_start() {
        let (mut state, _) = state_with(FakeGateway::default());
        state.dispatch(Intent::StartTimer(60));
        assert_eq!(state.timer().remaining(), 60);
        assert_eq!(state.tick_timer(Instant::now() + std::time::Duration::from_secs(120)), 60);
        assert_eq!(state.timer().remaining(), 0);
        state.start_timer(90);
        state.dispatch(Intent::StopTimer);
        assert_eq!(state.timer().remaining(), 0);
        assert!(!state.timer().is_running());
    }

    #[test]
    fn share_uses_system_clipboard_when_available() {
        let clipboard = RecordingClipboard::default();
        let mut state = AppState::new(
            Persistence::new(Box::new(MemoryStore::new())),
            Arc::new(FakeGateway::default()),
            Box::new(RecordingSink::default()),
            Box::new(clipboard.clone()),
        );
        state.share_workout_content("Squats 5x5");
        assert_eq!(clipboard.copied.lock().unwrap().as_slice(), ["Squats 5x5".to_string()]);
        assert_eq!(state.take_pending_copy(), None);
    }

    #[test]
    fn share_falls_back_to_window_clipboard() {
        let mut state = AppState::new(
            Persistence::new(Box::new(MemoryStore::new())),
            Arc::new(FakeGateway::default()),
            Box::new(RecordingSink::default()),
            Box::new(NoClipboard),
        );
        state.dispatch(Intent::Share("Squats 5x5".into()));
        assert_eq!(state.take_pending_copy().as_deref(), Some("Squats 5x5"));
        assert_eq!(state.take_pending_copy(), None);
    }

    #[test]
    fn reload_restores_roster_and_resets_view() {
        let store = MemoryStore::new();
        let mut state = AppState::new(
            Persistence::new(Box::new(store.clone())),
            Arc::new(FakeGateway::default()),
            Box::new(RecordingSink::default()),
            Box::new(RecordingClipboard::default()),
        );
        let id = state.add_client("Ann").unwrap();
        state.navigate(View::Client { client_id: id });
        let roster = state.roster().to_vec();

        let reloaded = AppState::new(
            Persistence::new(Box::new(store)),
            Arc::new(FakeGateway::default()),
            Box::new(RecordingSink::default()),
            Box::new(RecordingClipboard::default()),
        );
        assert_eq!(reloaded.roster(), roster.as_slice());
        assert_eq!(reloaded.view(), &View::Home);
    }

    #[test]
    fn leaving_a_screen_closes_its_modal() {
        let (mut state, _) = state_with(FakeGateway::default());
        let id = state.add_client("Ann").unwrap();
        let w = state.add_workout(&id, "A").unwrap();
        state.navigate(View::Client { client_id: id.clone() });
        state.open_modal(Modal::ConfirmDeleteWorkout { workout_id: w });
        state.dispatch(Intent::Navigate(View::Client { client_id: id.clone() }));
        assert!(matches!(state.modal(), Modal::ConfirmDeleteWorkout { .. }));

        state.dispatch(Intent::Navigate(View::Home));
        assert_eq!(state.modal(), &Modal::None);
        assert_eq!(state.client(&id).unwrap().workouts.len(), 1);
    }
}
