use chrono::NaiveTime;
use todo_core::{parse_time_of_day, Task};

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

#[test]
fn unscheduled_sets_defaults() {
    let task = Task::unscheduled("Wash car");

    assert_eq!(task.text(), "Wash car");
    assert_eq!(task.scheduled_time(), None);
    assert!(!task.is_completed());
}

#[test]
fn toggled_returns_new_value_and_keeps_original() {
    let original = Task::new("Standup", Some(hm(9, 0)), false);
    let toggled = original.toggled();

    assert!(!original.is_completed());
    assert!(toggled.is_completed());
    assert_eq!(toggled.text(), original.text());
    assert_eq!(toggled.scheduled_time(), original.scheduled_time());
    assert_eq!(toggled.toggled(), original);
}

#[test]
fn due_only_for_exact_minute_and_incomplete() {
    let task = Task::new("Standup", Some(hm(9, 0)), false);

    assert!(task.is_due_at(hm(9, 0)));
    assert!(!task.is_due_at(hm(9, 1)));
    assert!(!task.is_due_at(hm(8, 59)));
    assert!(!task.toggled().is_due_at(hm(9, 0)));
    assert!(!Task::unscheduled("free").is_due_at(hm(9, 0)));
}

#[test]
fn schedule_time_parsing_matches_clock_rules() {
    assert_eq!(parse_time_of_day("9:30"), Some(hm(9, 30)));
    assert_eq!(parse_time_of_day("18:00"), Some(hm(18, 0)));
    assert_eq!(parse_time_of_day("25:00"), None);
    assert_eq!(parse_time_of_day("18:0"), None);
}

#[test]
fn task_serialization_uses_expected_wire_fields() {
    let task = Task::new("Standup", Some(hm(9, 0)), true);

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["text"], "Standup");
    assert_eq!(json["scheduled_time"], "09:00:00");
    assert_eq!(json["completed"], true);

    let decoded: Task = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, task);
}

#[test]
fn unscheduled_task_serializes_null_time() {
    let json = serde_json::to_value(Task::unscheduled("x")).unwrap();
    assert!(json["scheduled_time"].is_null());
}
