use eframe::egui::{self, Color32, Context, RichText, Ui};

use crate::state::{AppState, Intent, Modal};

/// Paints the open modal, if any, on top of the current screen.
pub fn show(ctx: &Context, state: &AppState, intents: &mut Vec<Intent>) {
    let client_id = state.current_client().map(|c| c.id.clone());
    match (state.modal(), client_id) {
        (Modal::None, _) => {}
        (Modal::AddClient, _) => window(ctx, state, intents, "New client", |ui, intents| {
            single_line_form(ui, state, "First Last", "Create", Intent::SubmitClient, intents)
        }),
        (Modal::AddWorkout, Some(client_id)) => window(ctx, state, intents, "Workout title", |ui, intents| {
            single_line_form(ui, state, "", "Create", Intent::SubmitWorkout { client_id }, intents)
        }),
        (Modal::AiPlan, Some(client_id)) => {
            window(ctx, state, intents, "✨ What is the workout about?", |ui, intents| {
                ai_plan_form(ui, state, client_id, intents)
            })
        }
        (Modal::AiAnalysis, _) => {
            window(ctx, state, intents, "✨ AI analysis", |ui, intents| analysis(ui, state, intents))
        }
        (Modal::ConfirmDeleteWorkout { workout_id }, Some(client_id)) => {
            window(ctx, state, intents, "Delete this workout?", |ui, intents| {
                ui.label(RichText::new("The record will be erased permanently.").color(Color32::GRAY));
                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        intents.push(Intent::CloseModal);
                    }
                    let delete = egui::Button::new(RichText::new("Delete").color(Color32::WHITE))
                        .fill(Color32::from_rgb(200, 50, 50));
                    if ui.add(delete).clicked() {
                        intents.push(Intent::DeleteWorkout {
                            client_id,
                            workout_id: workout_id.clone(),
                        });
                    }
                });
            })
        }
        // client-scoped modal without a client on screen
        (_, None) => intents.push(Intent::CloseModal),
    }
}

/// Blocking dialog over a dimmed backdrop. Escape or a backdrop click closes
/// it unless an AI request is running.
fn window(
    ctx: &Context,
    state: &AppState,
    intents: &mut Vec<Intent>,
    title: &str,
    add_contents: impl FnOnce(&mut Ui, &mut Vec<Intent>),
) {
    let response = egui::Modal::new(egui::Id::new("trainer-modal")).show(ctx, |ui| {
        ui.set_width(320.0);
        ui.heading(title);
        ui.add_space(8.0);
        add_contents(ui, intents);
    });
    if response.should_close() && !state.is_ai_busy() {
        intents.push(Intent::CloseModal);
    }
}

fn single_line_form(
    ui: &mut Ui,
    state: &AppState,
    hint: &str,
    confirm: &str,
    submit: Intent,
    intents: &mut Vec<Intent>,
) {
    let mut input = state.input().to_string();
    let edit = ui.add(
        egui::TextEdit::singleline(&mut input)
            .hint_text(hint)
            .desired_width(f32::INFINITY),
    );
    if edit.changed() {
        intents.push(Intent::SetInput(input));
    }
    let entered = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
    ui.add_space(12.0);
    ui.horizontal(|ui| {
        if ui.button("Cancel").clicked() {
            intents.push(Intent::CloseModal);
        }
        if ui.button(RichText::new(confirm).strong()).clicked() || entered {
            intents.push(submit);
        }
    });
}

fn ai_plan_form(ui: &mut Ui, state: &AppState, client_id: String, intents: &mut Vec<Intent>) {
    let busy = state.is_ai_busy();
    let mut input = state.input().to_string();
    let edit = ui.add_enabled(
        !busy,
        egui::TextEdit::multiline(&mut input)
            .hint_text("e.g. Leg strength, squat focus")
            .desired_rows(4)
            .desired_width(f32::INFINITY),
    );
    if edit.changed() {
        intents.push(Intent::SetInput(input));
    }
    ui.add_space(12.0);
    ui.horizontal(|ui| {
        if busy {
            ui.spinner();
            ui.label("Generating...");
            return;
        }
        if ui.button("Cancel").clicked() {
            intents.push(Intent::CloseModal);
        }
        if ui.button(RichText::new("Create").strong()).clicked() {
            intents.push(Intent::SubmitAiPlan { client_id });
        }
    });
}

fn analysis(ui: &mut Ui, state: &AppState, intents: &mut Vec<Intent>) {
    let text = match state.ai_response() {
        "" => "Preparing report...",
        text => text,
    };
    ui.label(RichText::new(text).italics());
    ui.add_space(12.0);
    ui.horizontal(|ui| {
        if state.is_ai_busy() {
            ui.spinner();
        } else if ui.button("Ok").clicked() {
            intents.push(Intent::CloseModal);
        }
    });
}
