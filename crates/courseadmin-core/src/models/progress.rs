//! Learner progress records.
//!
//! Progress is keyed by enrollment: a learner's registration in a course.
//! An enrollment is broken down into topics, each holding lessons.

use serde::{Deserialize, Serialize};

/// One row of the progress overview: a learner and one of their enrollments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UserProgress {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "enrollmentId")]
    pub enrollment_id: String,
    pub name: String,
    pub email: Option<String>,
    #[serde(rename = "courseTitle")]
    pub course_title: String,
    #[serde(rename = "percentComplete", default)]
    pub percent_complete: f32,
    #[serde(rename = "lastActivityAt")]
    pub last_activity_at: Option<String>,
}

impl UserProgress {
    pub fn is_complete(&self) -> bool {
        self.percent_complete >= 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentProgress {
    pub enrollment_id: String,
    pub course_title: String,
    #[serde(default)]
    pub topics: Vec<TopicProgress>,
}

impl EnrollmentProgress {
    pub fn lessons(&self) -> impl Iterator<Item = (&TopicProgress, &LessonProgress)> {
        self.topics
            .iter()
            .flat_map(|topic| topic.lessons.iter().map(move |lesson| (topic, lesson)))
    }

    pub fn lesson_count(&self) -> usize {
        self.topics.iter().map(|t| t.lessons.len()).sum()
    }

    pub fn completed_count(&self) -> usize {
        self.lessons().filter(|(_, lesson)| lesson.completed).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct TopicProgress {
    pub topic_id: String,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<LessonProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub lesson_id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub enrollment_id: String,
    pub completed_lessons: u32,
    pub total_lessons: u32,
}

impl ProgressSummary {
    pub fn percent(&self) -> f32 {
        if self.total_lessons == 0 {
            return 0.0;
        }
        self.completed_lessons as f32 * 100.0 / self.total_lessons as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enrollment_progress() {
        let json = r#"{
            "enrollmentId": "E1",
            "courseTitle": "Rust Basics",
            "topics": [
                {"topicId": "T1", "title": "Ownership", "lessons": [
                    {"lessonId": "L1", "title": "Moves", "completed": true, "completedAt": "2026-01-02T10:00:00Z"},
                    {"lessonId": "L2", "title": "Borrows"}
                ]},
                {"topicId": "T2", "title": "Traits"}
            ]
        }"#;
        let progress: EnrollmentProgress = serde_json::from_str(json).unwrap();
        assert_eq!(progress.lesson_count(), 2);
        assert_eq!(progress.completed_count(), 1);
        assert!(progress.topics[1].lessons.is_empty());
        let (topic, lesson) = progress.lessons().nth(1).unwrap();
        assert_eq!(topic.topic_id, "T1");
        assert_eq!(lesson.lesson_id, "L2");
    }

    #[test]
    fn test_parse_user_progress() {
        let json = r#"{"userId": "U1", "enrollmentId": "E1", "name": "Ada", "email": null,
            "courseTitle": "Rust Basics", "percentComplete": 100}"#;
        let row: UserProgress = serde_json::from_str(json).unwrap();
        assert!(row.is_complete());
        assert!(row.last_activity_at.is_none());
    }

    #[test]
    fn test_summary_percent() {
        let summary = ProgressSummary {
            enrollment_id: "E1".to_string(),
            completed_lessons: 3,
            total_lessons: 4,
        };
        assert_eq!(summary.percent(), 75.0);
        assert_eq!(ProgressSummary::default().percent(), 0.0);
    }
}
