use eframe::egui::{self, Align, Color32, Layout, RichText, ScrollArea, Ui};

use crate::models::{Client, Workout};
use crate::state::{AppState, Intent, Modal, View};

pub fn home(ui: &mut Ui, state: &AppState, intents: &mut Vec<Intent>) {
    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.label(RichText::new("Clients").heading().strong());
            ui.label(
                RichText::new(format!("Total: {}", state.roster().len()))
                    .small()
                    .color(Color32::GRAY),
            );
        });
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.button(RichText::new("➕ New client").strong()).clicked() {
                intents.push(Intent::OpenModal(Modal::AddClient));
            }
        });
    });
    ui.add_space(12.0);

    let mut query = state.search_query().to_string();
    let search = ui.add(
        egui::TextEdit::singleline(&mut query)
            .hint_text("🔍 Search...")
            .desired_width(f32::INFINITY),
    );
    if search.changed() {
        intents.push(Intent::SetSearch(query));
    }
    ui.add_space(12.0);

    ScrollArea::vertical().show(ui, |ui| {
        ui.set_width(ui.available_width());
        for client in state.filtered_clients() {
            let label = format!("{}\n{} workouts", client.name, client.workouts.len());
            let button = egui::Button::new(RichText::new(label).size(20.0)).min_size([ui.available_width(), 56.0].into());
            if ui.add(button).clicked() {
                intents.push(Intent::Navigate(View::Client { client_id: client.id.clone() }));
            }
            ui.add_space(6.0);
        }
    });
}

pub fn client(ui: &mut Ui, state: &AppState, client: &Client, intents: &mut Vec<Intent>) {
    let busy = state.is_ai_busy();

    ui.horizontal(|ui| {
        if ui.button(RichText::new("⏴").size(24.0)).clicked() {
            intents.push(Intent::Navigate(View::Home));
        }
        ui.label(RichText::new(&client.name).heading().strong());
    });
    ui.add_space(10.0);

    let mut goal = client.goal.clone();
    let mut goal_date = client.goal_date.clone();
    ui.horizontal(|ui| {
        ui.label("Goal:");
        let goal_edit = ui.add(egui::TextEdit::singleline(&mut goal).hint_text("e.g. Run 10k").desired_width(200.0));
        ui.label("by");
        let date_edit = ui.add(egui::TextEdit::singleline(&mut goal_date).hint_text("DD.MM.YYYY").desired_width(110.0));
        if goal_edit.changed() || date_edit.changed() {
            intents.push(Intent::UpdateGoal {
                client_id: client.id.clone(),
                goal: goal.clone(),
                goal_date: goal_date.clone(),
            });
        }
    });
    ui.add_space(10.0);

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            let arrow = if state.show_plan() { "⏶" } else { "⏷" };
            if ui.selectable_label(state.show_plan(), format!("📋 Base plan {arrow}")).clicked() {
                intents.push(Intent::TogglePlan);
            }
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.add_enabled(!busy, egui::Button::new("✨ AI plan")).clicked() {
                    intents.push(Intent::OpenModal(Modal::AiPlan));
                }
            });
        });
        if state.show_plan() {
            let mut plan = client.plan.clone();
            let edit = ui.add(
                egui::TextEdit::multiline(&mut plan)
                    .hint_text("Describe the plan or use AI...")
                    .desired_rows(6)
                    .desired_width(f32::INFINITY),
            );
            if edit.changed() {
                intents.push(Intent::UpdatePlan { client_id: client.id.clone(), text: plan });
            }
        }
    });
    ui.add_space(16.0);

    ui.horizontal(|ui| {
        ui.label(RichText::new("📅 History").size(22.0).strong().color(Color32::GRAY));
        if !client.workouts.is_empty()
            && ui.add_enabled(!busy, egui::Button::new("✨ Analyze").small()).clicked()
        {
            intents.push(Intent::AnalyzeHistory { client_id: client.id.clone() });
        }
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.button("➕ Add").clicked() {
                intents.push(Intent::OpenModal(Modal::AddWorkout));
            }
        });
    });
    ui.add_space(8.0);

    ScrollArea::vertical().show(ui, |ui| {
        ui.set_width(ui.available_width());
        for workout in &client.workouts {
            ui.horizontal(|ui| {
                let label = format!("{}   {}", workout.title, workout.date);
                let button = egui::Button::new(RichText::new(label).size(18.0))
                    .min_size([ui.available_width() - 48.0, 44.0].into());
                if ui.add(button).clicked() {
                    intents.push(Intent::Navigate(View::Workout {
                        client_id: client.id.clone(),
                        workout_id: workout.id.clone(),
                    }));
                }
                if ui.button(RichText::new("🗑").color(Color32::LIGHT_RED)).clicked() {
                    intents.push(Intent::OpenModal(Modal::ConfirmDeleteWorkout {
                        workout_id: workout.id.clone(),
                    }));
                }
            });
        }
    });
}

pub fn workout(
    ui: &mut Ui,
    state: &AppState,
    client: &Client,
    workout: &Workout,
    timer_presets: &[u32],
    intents: &mut Vec<Intent>,
) {
    let back = Intent::Navigate(View::Client { client_id: client.id.clone() });

    ui.horizontal(|ui| {
        if ui.button(RichText::new("⏴").size(24.0)).clicked() {
            intents.push(back.clone());
        }
        ui.vertical(|ui| {
            ui.label(RichText::new(&workout.title).size(22.0).strong());
            ui.label(RichText::new(&client.name).small().color(Color32::GRAY));
        });
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.button("📤 Share").clicked() {
                intents.push(Intent::Share(workout.content.clone()));
            }
            if state.is_ai_busy() {
                ui.spinner();
            } else if ui.button("🔊 Read").clicked() {
                intents.push(Intent::Speak(workout.content.clone()));
            }
        });
    });
    ui.add_space(12.0);

    let timer = state.timer();
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            let color = if timer.is_running() { Color32::from_rgb(255, 140, 0) } else { Color32::GRAY };
            ui.label(RichText::new("⏱").size(22.0).color(color));
            ui.label(RichText::new(timer.display()).monospace().size(30.0).strong());
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if timer.remaining() > 0
                    && ui.button(RichText::new("STOP").color(Color32::LIGHT_RED)).clicked()
                {
                    intents.push(Intent::StopTimer);
                }
                for &seconds in timer_presets.iter().rev() {
                    if ui.button(format!("{seconds}s")).clicked() {
                        intents.push(Intent::StartTimer(seconds));
                    }
                }
            });
        });
    });
    ui.add_space(12.0);

    let mut content = workout.content.clone();
    let footer_height = 56.0;
    ScrollArea::vertical().max_height(ui.available_height() - footer_height).show(ui, |ui| {
        let edit = ui.add(
            egui::TextEdit::multiline(&mut content)
                .hint_text("Describe the exercises...")
                .desired_rows(16)
                .desired_width(f32::INFINITY),
        );
        if edit.changed() {
            intents.push(Intent::UpdateWorkoutContent {
                client_id: client.id.clone(),
                workout_id: workout.id.clone(),
                text: content.clone(),
            });
        }
    });

    ui.add_space(8.0);
    ui.vertical_centered(|ui| {
        if ui.button(RichText::new("✔ Save").size(20.0).strong()).clicked() {
            intents.push(back);
        }
    });
}
