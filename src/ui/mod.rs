//! Screens and modal overlays, painted from [`AppState`] alone.
//!
//! Painters never touch state directly: they collect [`Intent`]s which are
//! dispatched once the frame has been laid out.

use std::time::{Duration, Instant};

use eframe::{egui, App, CreationContext, Frame};
use egui_aesthetix::Aesthetix;

use crate::models::{Client, Workout};
use crate::state::{AppState, Intent, View};

mod modals;
mod screens;

const AI_POLL_INTERVAL: Duration = Duration::from_millis(150);

/// What the current view resolves to.
#[derive(Debug)]
pub enum Screen<'a> {
    Home,
    Client(&'a Client),
    Workout(&'a Client, &'a Workout),
    /// The view names a client or workout that no longer exists.
    Stale,
}

pub fn resolve(state: &AppState) -> Screen<'_> {
    match state.view() {
        View::Home => Screen::Home,
        View::Client { .. } => match state.current_client() {
            Some(client) => Screen::Client(client),
            None => Screen::Stale,
        },
        View::Workout { .. } => match (state.current_client(), state.current_workout()) {
            (Some(client), Some(workout)) => Screen::Workout(client, workout),
            _ => Screen::Stale,
        },
    }
}

pub struct TrainerApp {
    state: AppState,
    timer_presets: Vec<u32>,
}

impl TrainerApp {
    pub fn new(cc: &CreationContext, state: AppState, timer_presets: Vec<u32>) -> Self {
        let mut style = egui_aesthetix::themes::NordDark.custom_style();
        style.text_styles.insert(
            egui::TextStyle::Body,
            egui::FontId::new(18.0, egui::FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Heading,
            egui::FontId::new(28.0, egui::FontFamily::Proportional),
        );
        cc.egui_ctx.set_style(style);
        TrainerApp { state, timer_presets }
    }
}

impl App for TrainerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.state.poll_ai();
        self.state.tick_timer(Instant::now());
        if let Some(text) = self.state.take_pending_copy() {
            ctx.copy_text(text);
        }

        let mut intents = Vec::new();
        let state = &self.state;
        let presets = &self.timer_presets;
        egui::CentralPanel::default().show(ctx, |ui| match resolve(state) {
            Screen::Home => screens::home(ui, state, &mut intents),
            Screen::Client(client) => screens::client(ui, state, client, &mut intents),
            Screen::Workout(client, workout) => {
                screens::workout(ui, state, client, workout, presets, &mut intents)
            }
            Screen::Stale => intents.push(Intent::Navigate(View::Home)),
        });
        modals::show(ctx, state, &mut intents);

        for intent in intents {
            self.state.dispatch(intent);
        }

        if self.state.is_ai_busy() {
            ctx.request_repaint_after(AI_POLL_INTERVAL);
        } else if let Some(wait) = self.state.timer().until_next_tick(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }
}
