//models.rs
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::id::generate_id;

/// Format used for workout dates, e.g. `16.10.2026`.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

pub fn today_label() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub goal_date: String,
    #[serde(default)]
    pub plan: String,
    /// Newest first.
    #[serde(default)]
    pub workouts: Vec<Workout>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub content: String,
}

impl Client {
    pub fn new(name: &str) -> Self {
        Client {
            id: generate_id(),
            name: name.to_string(),
            goal: String::new(),
            goal_date: String::new(),
            plan: String::new(),
            workouts: Vec::new(),
        }
    }

    pub fn workout(&self, workout_id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == workout_id)
    }

    pub fn workout_mut(&mut self, workout_id: &str) -> Option<&mut Workout> {
        self.workouts.iter_mut().find(|w| w.id == workout_id)
    }

    /// Workout history as one block of text, newest first.
    pub fn history_text(&self) -> String {
        self.workouts
            .iter()
            .map(|w| format!("{} - {}: {}", w.date, w.title, w.content))
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

impl Workout {
    /// Dated today, content seeded from the client's plan.
    pub fn from_plan(title: &str, plan: &str) -> Self {
        Workout {
            id: generate_id(),
            title: title.to_string(),
            date: today_label(),
            content: plan.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_serializes_with_camel_case_fields() {
        let mut client = Client::new("Ann Lee");
        client.goal_date = "01.06.2027".into();
        let value = serde_json::to_value(&client).unwrap();
        assert_eq!(value["name"], "Ann Lee");
        assert_eq!(value["goalDate"], "01.06.2027");
        assert_eq!(value["workouts"], json!([]));
    }

    #[test]
    fn client_without_goal_fields_still_loads() {
        let raw = r#"{"id":"a1","name":"Bob","plan":"run","workouts":[{"id":"w1","title":"Day 1","date":"01.01.2026"}]}"#;
        let client: Client = serde_json::from_str(raw).unwrap();
        assert_eq!(client.goal, "");
        assert_eq!(client.goal_date, "");
        assert_eq!(client.workouts[0].content, "");
    }

    #[test]
    fn history_text_joins_workouts_newest_first() {
        let mut client = Client::new("Bob");
        client.workouts = vec![
            Workout { id: "2".into(), title: "Legs".into(), date: "02.01.2026".into(), content: "Squats".into() },
            Workout { id: "1".into(), title: "Arms".into(), date: "01.01.2026".into(), content: "Curls".into() },
        ];
        assert_eq!(
            client.history_text(),
            "02.01.2026 - Legs: Squats\n---\n01.01.2026 - Arms: Curls"
        );
    }

    #[test]
    fn workout_from_plan_copies_plan_and_dates_today() {
        let workout = Workout::from_plan("Leg Day", "Squats 5x5");
        assert_eq!(workout.content, "Squats 5x5");
        assert_eq!(workout.date, today_label());
        assert!(!workout.id.is_empty());
    }
}
