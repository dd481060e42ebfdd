//! Testing utilities for the FormProbe workspace
//!
//! Shared fixtures: a course template and an in-memory page rendering it.

#![allow(missing_docs)]

use chrono::NaiveDate;
use formprobe_driver::{ElementHandle, MemoryPage};
use formprobe_schema::Template;
use std::sync::Arc;

/// Course template covering every control shape the engine handles
pub const COURSE_TEMPLATE_JSON: &str = r#"{
  "courseTemplate": {
    "version": "3",
    "questions": {
      "title": {
        "label": "Title",
        "questionType": "text",
        "required": true,
        "config": { "validations": { "maxLength": 20 } }
      },
      "creditHours": {
        "label": "Credit Hours",
        "questionType": "composite",
        "config": {
          "fields": {
            "min": { "label": "Minimum", "questionType": "number" },
            "max": { "label": "Maximum", "questionType": "number" }
          }
        }
      },
      "isActive": { "label": "Active", "questionType": "yesNo" },
      "department": { "label": "Department", "questionType": "dropdown" },
      "tags": { "label": "Tags", "questionType": "multiSelect" },
      "description": { "label": "Description", "questionType": "richText" },
      "startDate": { "label": "Start Date", "questionType": "date" },
      "sisId": { "label": "SIS ID", "questionType": "text" },
      "status": { "label": "Status", "questionType": "text" },
      "syllabus": { "label": "Syllabus", "questionType": "fileUpload" },
      "internalNotes": { "label": "Internal Notes", "questionType": "textarea", "hidden": true }
    }
  }
}"#;

pub const COURSE_TITLE: &str = "Intro to Biology";
pub const COURSE_DESCRIPTION: &str = "Cells and organisms";
pub const COURSE_SIS_ID: &str = "SIS-1001";

pub fn course_template() -> Template {
    Template::from_json_str(COURSE_TEMPLATE_JSON).unwrap()
}

/// Fixed "today" so generated dates are predictable
pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
}

/// Handles into a rendered course form
#[derive(Debug, Clone)]
pub struct CoursePage {
    pub page: Arc<MemoryPage>,
    pub title: ElementHandle,
    pub credit_min: ElementHandle,
    pub credit_max: ElementHandle,
    pub is_active: ElementHandle,
    pub department: ElementHandle,
    pub tags: ElementHandle,
    pub description: ElementHandle,
    pub start_date: ElementHandle,
    pub sis_id: ElementHandle,
    pub status: ElementHandle,
}

/// Render [`COURSE_TEMPLATE_JSON`] onto a fresh memory page
///
/// - `title` holds [`COURSE_TITLE`] with a 20 character limit
/// - `creditHours.min` / `max` are empty numeric inputs addressed by name
/// - `isActive` has `No` active
/// - `department` has `Biology` selected
/// - `tags` needs a filter keystroke and every search comes back empty
/// - `status` is disabled
/// - `syllabus` renders only its wrapper
pub fn course_page() -> CoursePage {
    let page = Arc::new(MemoryPage::new());

    let title = page.text_field("title", COURSE_TITLE);
    page.set_max_length(title, 20);

    let credit = page.add_wrapper("creditHours", None);
    let credit_min = page.named_number(credit, "min", "");
    let credit_max = page.named_number(credit, "max", "");

    let is_active = page.yes_no_field("isActive", Some("No"));

    let department = page.choice_field("department", &["Biology", "Chemistry", "Physics"], false);
    page.preselect(department, &["Biology"]);

    let tags = page.choice_field("tags", &["Lab", "Seminar", "Online"], true);
    page.set_requires_filter(tags, true);
    page.set_remote_empty(tags, true);

    let description = page.rich_text_field("description", COURSE_DESCRIPTION);
    let start_date = page.text_field("startDate", "");
    let sis_id = page.text_field("sisId", COURSE_SIS_ID);

    let status = page.text_field("status", "Active");
    page.set_enabled(status, false);

    page.add_wrapper("syllabus", None);

    CoursePage {
        page,
        title,
        credit_min,
        credit_max,
        is_active,
        department,
        tags,
        description,
        start_date,
        sis_id,
        status,
    }
}
